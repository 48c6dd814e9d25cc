//! Per-cell view state over an immutable [`Board`].

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use shared::domain::{AttributeValue, Project, RecordId};

use crate::builder::{Board, Cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMatchDisplay {
    /// Step through the matches one at a time.
    #[default]
    Cycle,
    /// Show the first match with a count of the rest.
    FirstMatch,
}

/// 1-based position of the active project within its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellPosition {
    pub index: usize,
    pub total: usize,
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellCursor {
    cursor: usize,
    total: usize,
    mode: MultiMatchDisplay,
}

impl CellCursor {
    pub fn new(total: usize, mode: MultiMatchDisplay) -> Self {
        Self {
            cursor: 0,
            total,
            mode,
        }
    }

    pub fn cycles(&self) -> bool {
        self.mode == MultiMatchDisplay::Cycle && self.total > 1
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn position(&self) -> Option<CellPosition> {
        self.cycles().then(|| CellPosition {
            index: self.cursor + 1,
            total: self.total,
        })
    }

    /// Advances to the next match, wrapping after the last one.
    pub fn next(&mut self) -> Option<CellPosition> {
        if !self.cycles() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.total;
        self.position()
    }

    pub fn active_index(&self) -> Option<usize> {
        (self.total > 0).then_some(self.cursor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCard {
    pub id: RecordId,
    pub title: String,
}

impl From<&Project> for ProjectCard {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            title: project.title.clone(),
        }
    }
}

/// What the presentation layer draws for one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellDisplay {
    Empty,
    Single { project: ProjectCard },
    Cycling {
        active: ProjectCard,
        position: CellPosition,
    },
    Stacked { top: ProjectCard, count: usize },
}

impl CellDisplay {
    fn of(cell: &Cell, cursor: &CellCursor) -> Self {
        let Some(active) = cursor.active_index().and_then(|index| cell.projects.get(index)) else {
            return Self::Empty;
        };
        match (cell.len(), cursor.position()) {
            (1, _) => Self::Single {
                project: active.into(),
            },
            (_, Some(position)) => Self::Cycling {
                active: active.into(),
                position,
            },
            (count, None) => Self::Stacked {
                top: active.into(),
                count,
            },
        }
    }
}

/// The current board plus one cursor per cell. Built fresh for every board,
/// so cursors never carry over between rebuilds.
#[derive(Debug, Clone)]
pub struct BoardView {
    board: Arc<Board>,
    cursors: Vec<Vec<CellCursor>>,
}

impl BoardView {
    pub fn new(board: Arc<Board>, mode: MultiMatchDisplay) -> Self {
        let cursors = board
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|cell| CellCursor::new(cell.len(), mode))
                    .collect()
            })
            .collect();
        Self { board, cursors }
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn cursor(&self, row: usize, column: usize) -> Option<&CellCursor> {
        self.cursors.get(row)?.get(column)
    }

    pub fn next(&mut self, row: usize, column: usize) -> Option<CellPosition> {
        self.cursors.get_mut(row)?.get_mut(column)?.next()
    }

    pub fn display(&self, row: usize, column: usize) -> Option<CellDisplay> {
        let cell = self.board.cell(row, column)?;
        let cursor = self.cursor(row, column)?;
        Some(CellDisplay::of(cell, cursor))
    }

    pub fn displays(&self) -> Vec<Vec<CellDisplay>> {
        self.board
            .rows
            .iter()
            .zip(&self.cursors)
            .map(|(row, cursors)| {
                row.cells
                    .iter()
                    .zip(cursors)
                    .map(|(cell, cursor)| CellDisplay::of(cell, cursor))
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeLine {
    pub label: String,
    pub text: String,
}

/// Labelled attribute lines for the project list: id and title first, then
/// every other attribute in the order the record lists them.
pub fn describe_project(project: &Project, label: impl Fn(&str) -> String) -> Vec<AttributeLine> {
    let mut lines = vec![
        AttributeLine {
            label: label("id"),
            text: project.id.to_string(),
        },
        AttributeLine {
            label: label("title"),
            text: project.title.clone(),
        },
    ];
    lines.extend(project.attributes.iter().map(|(name, value)| AttributeLine {
        label: label(name),
        text: attribute_text(value),
    }));
    lines
}

fn attribute_text(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Many(list) => list
            .iter()
            .map(|category| category.title.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        AttributeValue::One(category) => category.title.clone(),
        AttributeValue::Other(serde_json::Value::String(text)) => text.clone(),
        AttributeValue::Other(serde_json::Value::Null) => String::new(),
        AttributeValue::Other(other) => other.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
