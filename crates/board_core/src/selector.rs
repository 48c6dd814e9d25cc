use serde::{Deserialize, Serialize};
use shared::domain::DimensionKey;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Rows,
    Columns,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Self::Rows => Self::Columns,
            Self::Columns => Self::Rows,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Rows => 0,
            Self::Columns => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionPolicy {
    /// Equal choices are accepted but never build a board.
    Passive,
    /// The other selector's current choice is disabled, so equal choices
    /// cannot be made at all.
    #[default]
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateTrigger {
    #[default]
    Immediate,
    /// Changes are held until an explicit confirmation.
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("at least two dimensions are required, got {0}")]
    TooFewOptions(usize),
    #[error("unknown dimension `{0}`")]
    UnknownDimension(DimensionKey),
    #[error("dimension `{key}` is disabled for the {axis:?} selector")]
    OptionDisabled { axis: Axis, key: DimensionKey },
    #[error("rows and columns both use dimension `{0}`")]
    InvalidSelection(DimensionKey),
}

/// A pair of dimension keys that is guaranteed to differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    rows: DimensionKey,
    columns: DimensionKey,
}

impl Selection {
    pub fn new(rows: DimensionKey, columns: DimensionKey) -> Result<Self, SelectionError> {
        if rows == columns {
            return Err(SelectionError::InvalidSelection(rows));
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> &DimensionKey {
        &self.rows
    }

    pub fn columns(&self) -> &DimensionKey {
        &self.columns
    }

    pub fn key(&self, axis: Axis) -> &DimensionKey {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Columns => &self.columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Build a board for this selection now.
    Rebuild(Selection),
    /// Valid, waiting for `confirm`.
    Deferred,
    /// Both selectors hold the same dimension; nothing is built.
    Collision,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorOption {
    pub key: DimensionKey,
    pub label: String,
    pub enabled: bool,
    pub selected: bool,
}

/// Owns the row and column dimension choices.
#[derive(Debug, Clone)]
pub struct SelectorCoordinator {
    options: Vec<DimensionKey>,
    labels: Vec<String>,
    selected: [usize; 2],
    disabled: [Option<usize>; 2],
    policy: ExclusionPolicy,
    trigger: UpdateTrigger,
}

impl SelectorCoordinator {
    pub fn new(
        options: Vec<DimensionKey>,
        rows: &DimensionKey,
        columns: &DimensionKey,
        policy: ExclusionPolicy,
        trigger: UpdateTrigger,
    ) -> Result<Self, SelectionError> {
        if options.len() < 2 {
            return Err(SelectionError::TooFewOptions(options.len()));
        }
        let position = |key: &DimensionKey| {
            options
                .iter()
                .position(|option| option == key)
                .ok_or_else(|| SelectionError::UnknownDimension(key.clone()))
        };
        let rows_index = position(rows)?;
        let columns_index = position(columns)?;
        if rows_index == columns_index {
            return Err(SelectionError::InvalidSelection(rows.clone()));
        }

        let disabled = match policy {
            ExclusionPolicy::Active => [Some(columns_index), Some(rows_index)],
            ExclusionPolicy::Passive => [None, None],
        };

        Ok(Self {
            labels: options.iter().map(DimensionKey::to_string).collect(),
            options,
            selected: [rows_index, columns_index],
            disabled,
            policy,
            trigger,
        })
    }

    /// Replaces the display labels, which default to the keys themselves.
    pub fn with_labels(mut self, label: impl Fn(&DimensionKey) -> String) -> Self {
        self.labels = self.options.iter().map(label).collect();
        self
    }

    pub fn policy(&self) -> ExclusionPolicy {
        self.policy
    }

    pub fn trigger(&self) -> UpdateTrigger {
        self.trigger
    }

    pub fn selected(&self, axis: Axis) -> &DimensionKey {
        &self.options[self.selected[axis.slot()]]
    }

    pub fn is_enabled(&self, axis: Axis, key: &DimensionKey) -> bool {
        match self.options.iter().position(|option| option == key) {
            Some(index) => self.disabled[axis.slot()] != Some(index),
            None => false,
        }
    }

    pub fn options(&self, axis: Axis) -> Vec<SelectorOption> {
        let slot = axis.slot();
        self.options
            .iter()
            .zip(&self.labels)
            .enumerate()
            .map(|(index, (key, label))| SelectorOption {
                key: key.clone(),
                label: label.clone(),
                enabled: self.disabled[slot] != Some(index),
                selected: self.selected[slot] == index,
            })
            .collect()
    }

    /// Applies a selector change.
    ///
    /// Under active exclusion the chosen position becomes the only disabled
    /// option of the other selector, which re-enables whatever it disabled
    /// before.
    pub fn select(
        &mut self,
        axis: Axis,
        key: &DimensionKey,
    ) -> Result<SelectionOutcome, SelectionError> {
        let index = self
            .options
            .iter()
            .position(|option| option == key)
            .ok_or_else(|| SelectionError::UnknownDimension(key.clone()))?;
        let slot = axis.slot();

        if self.selected[slot] == index {
            return Ok(SelectionOutcome::Unchanged);
        }
        if self.disabled[slot] == Some(index) {
            return Err(SelectionError::OptionDisabled {
                axis,
                key: key.clone(),
            });
        }

        self.selected[slot] = index;
        if self.policy == ExclusionPolicy::Active {
            self.disabled[axis.other().slot()] = Some(index);
        }

        Ok(match self.current() {
            Err(_) => SelectionOutcome::Collision,
            Ok(selection) => match self.trigger {
                UpdateTrigger::Immediate => SelectionOutcome::Rebuild(selection),
                UpdateTrigger::Confirm => SelectionOutcome::Deferred,
            },
        })
    }

    /// The selection a confirmation would build.
    pub fn confirm(&self) -> Result<Selection, SelectionError> {
        self.current()
    }

    pub fn current(&self) -> Result<Selection, SelectionError> {
        Selection::new(
            self.selected(Axis::Rows).clone(),
            self.selected(Axis::Columns).clone(),
        )
    }
}
