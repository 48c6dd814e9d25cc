//! Board engine: cross-tabulates project records against two selectable
//! dimensions and keeps the selector, loading and cell view state consistent
//! while category data is fetched.

use std::sync::Arc;

use shared::{domain::DimensionKey, error::BoardFault};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

pub mod builder;
pub mod config;
pub mod error;
pub mod loading;
pub mod presenter;
pub mod repository;
pub mod selector;

pub use builder::{build_board, Board, BoardRow, Cell, CategoryOrder, ResolvedDimension};
pub use config::{load_settings, BoardSettings, DimensionCatalog};
pub use error::{BoardError, FetchError};
pub use loading::{Generation, LoadingController, LoadingState};
pub use presenter::{BoardView, CellDisplay, CellPosition, MultiMatchDisplay};
pub use repository::{
    DimensionRepository, HttpDimensionRepository, MissingDimensionRepository,
    StaticDimensionRepository,
};
pub use selector::{Axis, Selection, SelectionOutcome, SelectorCoordinator, SelectorOption};

use loading::busy_floor;

#[derive(Debug, Clone)]
pub enum BoardEvent {
    SelectionChanged {
        axis: Axis,
        key: DimensionKey,
        outcome: SelectionOutcome,
    },
    LoadingStarted {
        generation: Generation,
    },
    BoardReady {
        generation: Generation,
        board: Arc<Board>,
    },
    LoadFailed {
        generation: Generation,
        fault: BoardFault,
    },
    StaleDiscarded {
        generation: Generation,
    },
}

#[derive(Debug, Clone)]
pub enum RebuildOutcome {
    Applied {
        generation: Generation,
        board: Arc<Board>,
    },
    /// A newer request was issued while this one was in flight; its result
    /// was dropped.
    Stale { generation: Generation },
}

#[derive(Debug, Clone)]
pub struct SelectOutcome {
    pub selection: SelectionOutcome,
    pub rebuild: Option<RebuildOutcome>,
}

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub board: Option<Arc<Board>>,
    pub cells: Vec<Vec<CellDisplay>>,
    pub loading: bool,
    pub controls_enabled: bool,
    pub last_fault: Option<BoardFault>,
    pub row_options: Vec<SelectorOption>,
    pub column_options: Vec<SelectorOption>,
}

struct SessionState {
    selector: SelectorCoordinator,
    loading: LoadingController,
    view: Option<BoardView>,
}

/// Owns every piece of mutable board state and serializes access to it.
///
/// The state lock is never held across a fetch. Completions are applied only
/// when their generation is still the latest one issued.
pub struct BoardSession {
    repository: Arc<dyn DimensionRepository>,
    catalog: Arc<DimensionCatalog>,
    multi_match: MultiMatchDisplay,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<BoardEvent>,
}

impl BoardSession {
    pub fn new(
        repository: Arc<dyn DimensionRepository>,
        settings: &BoardSettings,
    ) -> Result<Arc<Self>, BoardError> {
        let catalog = Arc::new(settings.validate()?);
        Self::new_with_catalog(repository, catalog, settings)
    }

    /// Session backed by HTTP fetches against the configured catalog.
    pub fn connect(settings: &BoardSettings) -> Result<Arc<Self>, BoardError> {
        let catalog = Arc::new(settings.validate()?);
        let repository =
            HttpDimensionRepository::new(catalog.clone(), settings.request_timeout())?;
        Self::new_with_catalog(Arc::new(repository), catalog, settings)
    }

    pub fn new_with_catalog(
        repository: Arc<dyn DimensionRepository>,
        catalog: Arc<DimensionCatalog>,
        settings: &BoardSettings,
    ) -> Result<Arc<Self>, BoardError> {
        let selector = SelectorCoordinator::new(
            catalog.keys(),
            &settings.default_rows,
            &settings.default_columns,
            settings.exclusion,
            settings.trigger,
        )?
        .with_labels(|key| catalog.label(key).to_string());
        let (events, _) = broadcast::channel(256);

        Ok(Arc::new(Self {
            repository,
            catalog,
            multi_match: settings.multi_match,
            inner: Mutex::new(SessionState {
                selector,
                loading: LoadingController::new(settings.min_loading()),
                view: None,
            }),
            events,
        }))
    }

    pub fn catalog(&self) -> &Arc<DimensionCatalog> {
        &self.catalog
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Applies a selector change and, in immediate mode, rebuilds the board.
    pub async fn select(
        self: &Arc<Self>,
        axis: Axis,
        key: &DimensionKey,
    ) -> Result<SelectOutcome, BoardError> {
        let outcome = {
            let mut guard = self.inner.lock().await;
            if guard.loading.is_busy() {
                warn!(?axis, %key, "selector change rejected while loading");
                return Err(BoardError::Busy);
            }
            guard.selector.select(axis, key).map_err(|err| {
                warn!(?axis, %key, error = %err, "selector change rejected");
                err
            })?
        };

        debug!(?axis, %key, ?outcome, "selector changed");
        let _ = self.events.send(BoardEvent::SelectionChanged {
            axis,
            key: key.clone(),
            outcome: outcome.clone(),
        });

        let rebuild = match &outcome {
            SelectionOutcome::Rebuild(selection) => Some(self.rebuild(selection.clone()).await?),
            SelectionOutcome::Deferred
            | SelectionOutcome::Collision
            | SelectionOutcome::Unchanged => None,
        };

        Ok(SelectOutcome {
            selection: outcome,
            rebuild,
        })
    }

    /// Rebuilds with the current selection. This is the confirm action of
    /// the deferred trigger mode.
    pub async fn confirm(self: &Arc<Self>) -> Result<RebuildOutcome, BoardError> {
        let selection = {
            let guard = self.inner.lock().await;
            if guard.loading.is_busy() {
                return Err(BoardError::Busy);
            }
            guard.selector.confirm()?
        };
        self.rebuild(selection).await
    }

    /// Rebuilds with the current selection regardless of the loading state,
    /// e.g. for the first render.
    pub async fn refresh(self: &Arc<Self>) -> Result<RebuildOutcome, BoardError> {
        let selection = self.inner.lock().await.selector.current()?;
        self.rebuild(selection).await
    }

    /// Fetches and applies the board for `selection`.
    ///
    /// The work runs on its own task, so a caller that stops waiting (a
    /// timeout, a dropped `select`) never leaves the generation unsettled.
    pub async fn rebuild(
        self: &Arc<Self>,
        selection: Selection,
    ) -> Result<RebuildOutcome, BoardError> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.run_rebuild(selection).await }).await?
    }

    async fn run_rebuild(&self, selection: Selection) -> Result<RebuildOutcome, BoardError> {
        let (generation, min_duration) = {
            let mut guard = self.inner.lock().await;
            (guard.loading.begin(), guard.loading.min_duration())
        };
        debug!(generation, rows = %selection.rows(), columns = %selection.columns(), "board loading");
        let _ = self.events.send(BoardEvent::LoadingStarted { generation });

        let fetch = async {
            futures::try_join!(
                self.repository.fetch_projects(),
                self.repository.fetch_dimension(selection.rows()),
                self.repository.fetch_dimension(selection.columns()),
            )
        };
        let (fetched, ()) = futures::join!(fetch, busy_floor(min_duration));

        let mut guard = self.inner.lock().await;
        if !guard.loading.is_current(generation) {
            debug!(generation, latest = guard.loading.latest(), "discarding stale board data");
            let _ = self.events.send(BoardEvent::StaleDiscarded { generation });
            return Ok(RebuildOutcome::Stale { generation });
        }

        let (projects, rows, columns) = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                let err = BoardError::from(err);
                let fault = err.fault();
                warn!(generation, error = %err, "board data fetch failed");
                guard.loading.fail(generation, fault.clone());
                let _ = self.events.send(BoardEvent::LoadFailed { generation, fault });
                return Err(err);
            }
        };

        let rows = ResolvedDimension::resolve(
            selection.rows().clone(),
            rows,
            self.catalog.order(selection.rows()),
        );
        let columns = ResolvedDimension::resolve(
            selection.columns().clone(),
            columns,
            self.catalog.order(selection.columns()),
        );
        let board = Arc::new(build_board(&rows, &columns, &projects));

        guard.view = Some(BoardView::new(board.clone(), self.multi_match));
        guard.loading.finish(generation);
        info!(
            generation,
            rows = board.row_count(),
            columns = board.column_count(),
            projects = projects.len(),
            "board rebuilt"
        );
        let _ = self.events.send(BoardEvent::BoardReady {
            generation,
            board: board.clone(),
        });

        Ok(RebuildOutcome::Applied { generation, board })
    }

    /// Moves a multi-match cell to its next project.
    pub async fn next_in_cell(&self, row: usize, column: usize) -> Option<CellPosition> {
        self.inner.lock().await.view.as_mut()?.next(row, column)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let guard = self.inner.lock().await;
        SessionSnapshot {
            board: guard.view.as_ref().map(|view| view.board().clone()),
            cells: guard
                .view
                .as_ref()
                .map(BoardView::displays)
                .unwrap_or_default(),
            loading: guard.loading.is_busy(),
            controls_enabled: guard.loading.controls_enabled(),
            last_fault: guard.loading.last_fault().cloned(),
            row_options: guard.selector.options(Axis::Rows),
            column_options: guard.selector.options(Axis::Columns),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
