#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rowcache_core::{
    Cell, CellKind, ColumnSpec, MemoryTable, Row, RowCursor, RowSource, SourceResult, TableSpec,
};

pub const NUM_ROWS: usize = 600;

pub fn table_spec() -> TableSpec {
    TableSpec::new(
        "default",
        vec![
            ColumnSpec::new("col1", CellKind::Text),
            ColumnSpec::new("col2", CellKind::Int),
            ColumnSpec::new("col3", CellKind::Float),
        ],
    )
}

pub fn make_row(i: usize) -> Row {
    Row::new(
        format!("r{}", i),
        vec![
            Cell::Text(format!("Some content {}", i)),
            Cell::Int(i as i64),
            Cell::Float(i as f64 + 0.4),
        ],
    )
}

pub fn memory_table(rows: usize) -> MemoryTable {
    MemoryTable::new(table_spec(), (0..rows).map(make_row).collect())
}

/// Shared switches of a [`RestrictedTable`].
///
/// `allowed` is flipped by the test; `used` is set by the cursor whenever it
/// hands out a row.
#[derive(Clone, Default)]
pub struct AccessFlags {
    allowed: Arc<AtomicBool>,
    used: Arc<AtomicBool>,
    pulls: Arc<AtomicUsize>,
    opens: Arc<AtomicUsize>,
}

impl AccessFlags {
    pub fn allowing() -> Self {
        let flags = Self::default();
        flags.allow(true);
        flags
    }

    pub fn allow(&self, allowed: bool) {
        self.allowed.store(allowed, Ordering::SeqCst);
    }

    pub fn reset_used(&self) {
        self.used.store(false, Ordering::SeqCst);
    }

    pub fn used(&self) -> bool {
        self.used.load(Ordering::SeqCst)
    }

    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

/// Table of unknown size whose cursor errors when pulled while access is
/// disallowed.
pub struct RestrictedTable {
    inner: MemoryTable,
    flags: AccessFlags,
}

impl RestrictedTable {
    pub fn new(inner: MemoryTable, flags: AccessFlags) -> Self {
        Self { inner, flags }
    }
}

impl RowSource for RestrictedTable {
    fn spec(&self) -> &TableSpec {
        self.inner.spec()
    }

    fn open(&self) -> SourceResult<Box<dyn RowCursor>> {
        self.flags.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RestrictedCursor {
            inner: self.inner.open()?,
            flags: self.flags.clone(),
        }))
    }
}

struct RestrictedCursor {
    inner: Box<dyn RowCursor>,
    flags: AccessFlags,
}

impl RowCursor for RestrictedCursor {
    fn next_row(&mut self) -> SourceResult<Option<Row>> {
        if !self.flags.allowed.load(Ordering::SeqCst) {
            return Err("cursor should not have been called at the current state, all rows are supposedly cached".into());
        }
        self.flags.used.store(true, Ordering::SeqCst);
        self.flags.pulls.fetch_add(1, Ordering::SeqCst);
        self.inner.next_row()
    }
}

pub fn assert_row_eq(expected: &Row, actual: &Row) {
    assert_eq!(expected.key(), actual.key(), "row keys not identical");
    assert_eq!(expected.cells(), actual.cells(), "cells not identical");
}
