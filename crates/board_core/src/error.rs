use reqwest::StatusCode;
use shared::{
    domain::DimensionKey,
    error::{BoardFault, ErrorCode},
    protocol::DecodeError,
};
use thiserror::Error;

use crate::{config::ConfigError, selector::SelectionError};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for `{resource}` failed: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{resource}` answered with status {status}")]
    Status { resource: String, status: StatusCode },
    #[error("`{resource}` returned a {source}")]
    Decode {
        resource: String,
        #[source]
        source: DecodeError,
    },
    #[error("no resource configured for dimension `{0}`")]
    UnknownDimension(DimensionKey),
    #[error("dimension repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("board is loading; filter controls are disabled")]
    Busy,
    #[error("board rebuild stopped before completing: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

impl BoardError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Fetch(_) | Self::Interrupted(_) => ErrorCode::FetchFailure,
            Self::Selection(_) => ErrorCode::InvalidSelection,
            Self::Config(_) => ErrorCode::Configuration,
            Self::Busy => ErrorCode::Busy,
        }
    }

    /// The user-facing form of this error.
    pub fn fault(&self) -> BoardFault {
        BoardFault::new(self.code(), self.to_string())
    }
}
