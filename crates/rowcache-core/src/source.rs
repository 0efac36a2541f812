//! Forward-only row sources consumed by the cache.

use std::sync::Arc;

use crate::error::SourceResult;
use crate::row::{Row, TableSpec};

/// A forward-only, single-pass cursor over rows.
///
/// Once `next_row` returns `Ok(None)` the cursor is exhausted for good.
pub trait RowCursor: Send {
    fn next_row(&mut self) -> SourceResult<Option<Row>>;
}

/// A table that can only be read front to back.
pub trait RowSource: Send + Sync {
    /// Schema of the rows produced by [`open`](Self::open).
    fn spec(&self) -> &TableSpec;

    /// Exact number of rows, if the source knows it up front.
    fn row_count(&self) -> Option<usize> {
        None
    }

    /// Open a fresh cursor positioned before the first row.
    fn open(&self) -> SourceResult<Box<dyn RowCursor>>;
}

impl<S: RowSource + ?Sized> RowSource for Arc<S> {
    fn spec(&self) -> &TableSpec {
        (**self).spec()
    }

    fn row_count(&self) -> Option<usize> {
        (**self).row_count()
    }

    fn open(&self) -> SourceResult<Box<dyn RowCursor>> {
        (**self).open()
    }
}

/// Adapts any fallible row iterator into a [`RowCursor`].
pub struct IterCursor<I> {
    inner: I,
}

impl<I> IterCursor<I>
where
    I: Iterator<Item = SourceResult<Row>> + Send,
{
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> RowCursor for IterCursor<I>
where
    I: Iterator<Item = SourceResult<Row>> + Send,
{
    fn next_row(&mut self) -> SourceResult<Option<Row>> {
        self.inner.next().transpose()
    }
}

/// Fully materialized table with a known size.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    spec: TableSpec,
    rows: Arc<Vec<Row>>,
}

impl MemoryTable {
    pub fn new(spec: TableSpec, rows: Vec<Row>) -> Self {
        Self {
            spec,
            rows: Arc::new(rows),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct MemoryCursor {
    rows: Arc<Vec<Row>>,
    next: usize,
}

impl RowCursor for MemoryCursor {
    fn next_row(&mut self) -> SourceResult<Option<Row>> {
        let row = self.rows.get(self.next).cloned();
        if row.is_some() {
            self.next += 1;
        }
        Ok(row)
    }
}

impl RowSource for MemoryTable {
    fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn row_count(&self) -> Option<usize> {
        Some(self.rows.len())
    }

    fn open(&self) -> SourceResult<Box<dyn RowCursor>> {
        Ok(Box::new(MemoryCursor {
            rows: Arc::clone(&self.rows),
            next: 0,
        }))
    }
}
