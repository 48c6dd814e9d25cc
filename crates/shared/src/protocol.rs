use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::{CategoryRef, Project};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Projects,
    Categories,
}

impl DocumentKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "project list",
            Self::Categories => "category list",
        }
    }
}

#[derive(Debug, Error)]
#[error("malformed {}: {source}", .kind.as_str())]
pub struct DecodeError {
    pub kind: DocumentKind,
    #[source]
    pub source: serde_json::Error,
}

/// Decodes the project collection document: a JSON array of project records.
pub fn decode_projects(body: &[u8]) -> Result<Vec<Project>, DecodeError> {
    decode(body, DocumentKind::Projects)
}

/// Decodes one dimension's document: a JSON array of `{id, title}` records.
pub fn decode_categories(body: &[u8]) -> Result<Vec<CategoryRef>, DecodeError> {
    decode(body, DocumentKind::Categories)
}

fn decode<T: DeserializeOwned>(body: &[u8], kind: DocumentKind) -> Result<Vec<T>, DecodeError> {
    serde_json::from_slice(body).map_err(|source| DecodeError { kind, source })
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
