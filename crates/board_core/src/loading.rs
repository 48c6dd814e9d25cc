use std::time::Duration;

use shared::error::BoardFault;

/// Sequence number of a rebuild request. Only the latest one may touch state.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    Idle,
    Loading { generation: Generation },
}

/// Busy state around a fetch + rebuild, keyed by request generation.
#[derive(Debug, Clone)]
pub struct LoadingController {
    state: LoadingState,
    latest: Generation,
    min_duration: Duration,
    last_fault: Option<BoardFault>,
}

impl LoadingController {
    pub fn new(min_duration: Duration) -> Self {
        Self {
            state: LoadingState::Idle,
            latest: 0,
            min_duration,
            last_fault: None,
        }
    }

    pub fn state(&self) -> LoadingState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, LoadingState::Loading { .. })
    }

    pub fn controls_enabled(&self) -> bool {
        !self.is_busy()
    }

    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    pub fn latest(&self) -> Generation {
        self.latest
    }

    pub fn last_fault(&self) -> Option<&BoardFault> {
        self.last_fault.as_ref()
    }

    /// Issues a new generation and enters `Loading`. Any generation issued
    /// earlier becomes stale.
    pub fn begin(&mut self) -> Generation {
        self.latest += 1;
        self.state = LoadingState::Loading {
            generation: self.latest,
        };
        self.latest
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.latest
    }

    /// Returns to `Idle` after a successful rebuild; `false` for a stale
    /// generation, which leaves everything untouched.
    pub fn finish(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state = LoadingState::Idle;
        self.last_fault = None;
        true
    }

    /// Returns to `Idle` and records the fault; `false` for a stale generation.
    pub fn fail(&mut self, generation: Generation, fault: BoardFault) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state = LoadingState::Idle;
        self.last_fault = Some(fault);
        true
    }
}

/// Keeps the busy phase visible for at least `duration`.
pub(crate) async fn busy_floor(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
