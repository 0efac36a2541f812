//! Column filter applied to rows on their way out of the cache.

use crate::error::{CacheError, CacheResult};
use crate::row::{Cell, Row, TableSpec};

/// Mask over a table's columns. Excluded cells read as [`Cell::Missing`];
/// rows keep the table's width so column indices stay valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    included: Vec<bool>,
}

impl ColumnFilter {
    /// Resolve column names against `spec`.
    ///
    /// Returns `None` when `names` is empty, which means "all columns".
    pub fn resolve<S: AsRef<str>>(spec: &TableSpec, names: &[S]) -> CacheResult<Option<Self>> {
        if names.is_empty() {
            return Ok(None);
        }
        let mut included = vec![false; spec.num_columns()];
        for name in names {
            let name = name.as_ref();
            let index = spec
                .column_index(name)
                .ok_or_else(|| CacheError::UnknownColumn {
                    name: name.to_string(),
                })?;
            included[index] = true;
        }
        Ok(Some(Self { included }))
    }

    pub fn includes(&self, column: usize) -> bool {
        self.included.get(column).copied().unwrap_or(false)
    }

    pub fn included_count(&self) -> usize {
        self.included.iter().filter(|i| **i).count()
    }

    pub fn apply(&self, row: &Row) -> Row {
        let cells: Vec<Cell> = row
            .cells()
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if self.includes(i) {
                    cell.clone()
                } else {
                    Cell::Missing
                }
            })
            .collect();
        Row::new(row.key().clone(), cells)
    }
}
