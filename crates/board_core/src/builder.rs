//! Board construction: cross-tabulates projects against two resolved dimensions.
//!
//! Everything here is pure. The same inputs always produce the same [`Board`].

use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use shared::domain::{CategoryRef, DimensionKey, Project, RecordId};

/// How a dimension's categories are laid along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOrder {
    /// Keep the order the repository returned.
    #[default]
    Source,
    /// Time series: newest first by the numeric value of the title.
    DescendingNumericTitle,
}

/// A dimension's categories after ordering, ready to become an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDimension {
    pub key: DimensionKey,
    pub categories: Vec<CategoryRef>,
}

impl ResolvedDimension {
    pub fn resolve(key: DimensionKey, mut categories: Vec<CategoryRef>, order: CategoryOrder) -> Self {
        if order == CategoryOrder::DescendingNumericTitle {
            sort_descending_numeric(&mut categories);
        }
        Self { key, categories }
    }
}

/// Stable sort, newest first. Titles without a leading integer go last.
pub fn sort_descending_numeric(categories: &mut [CategoryRef]) {
    categories.sort_by(|a, b| {
        match (leading_integer(&a.title), leading_integer(&b.title)) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

fn leading_integer(title: &str) -> Option<i64> {
    let title = title.trim_start();
    let sign_len = usize::from(title.starts_with(['-', '+']));
    let digits_len = title[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    title[..sign_len + digits_len].parse().ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cell {
    pub projects: Vec<Project>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub category: CategoryRef,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub rows_dimension: DimensionKey,
    pub columns_dimension: DimensionKey,
    pub header: Vec<CategoryRef>,
    pub rows: Vec<BoardRow>,
}

impl Board {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row)?.cells.get(column)
    }
}

/// Builds the grid: cell `(r, c)` holds, in source order, every project whose
/// row-dimension categories include `r.id` and whose column-dimension
/// categories include `c.id`.
pub fn build_board(
    rows: &ResolvedDimension,
    columns: &ResolvedDimension,
    projects: &[Project],
) -> Board {
    let row_buckets = bucket_by_category(projects, &rows.key);
    let column_buckets = bucket_by_category(projects, &columns.key);

    let board_rows = rows
        .categories
        .iter()
        .map(|row| {
            let in_row = bucket(&row_buckets, &row.id);
            let cells = columns
                .categories
                .iter()
                .map(|column| {
                    let in_column = bucket(&column_buckets, &column.id);
                    Cell {
                        projects: intersect_sorted(in_row, in_column)
                            .map(|index| projects[index].clone())
                            .collect(),
                    }
                })
                .collect();
            BoardRow {
                category: row.clone(),
                cells,
            }
        })
        .collect();

    Board {
        rows_dimension: rows.key.clone(),
        columns_dimension: columns.key.clone(),
        header: columns.categories.clone(),
        rows: board_rows,
    }
}

/// Project indices per category id, ascending and without repeats.
fn bucket_by_category<'a>(
    projects: &'a [Project],
    key: &DimensionKey,
) -> HashMap<&'a RecordId, Vec<usize>> {
    let mut buckets: HashMap<&RecordId, Vec<usize>> = HashMap::new();
    for (index, project) in projects.iter().enumerate() {
        for category in project.categories(key) {
            let bucket = buckets.entry(&category.id).or_default();
            if bucket.last() != Some(&index) {
                bucket.push(index);
            }
        }
    }
    buckets
}

fn bucket<'a>(buckets: &'a HashMap<&RecordId, Vec<usize>>, id: &RecordId) -> &'a [usize] {
    buckets.get(id).map(Vec::as_slice).unwrap_or(&[])
}

fn intersect_sorted<'a>(left: &'a [usize], right: &'a [usize]) -> impl Iterator<Item = usize> + 'a {
    let (mut i, mut j) = (0, 0);
    std::iter::from_fn(move || {
        while i < left.len() && j < right.len() {
            match left[i].cmp(&right[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    let found = left[i];
                    i += 1;
                    j += 1;
                    return Some(found);
                }
            }
        }
        None
    })
}

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod tests;
