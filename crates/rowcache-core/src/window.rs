//! Sliding window cache with look-ahead over a forward-only row source.
//!
//! The cache owns the single cursor of its source and keeps the most recent
//! `cache_size` rows it pulled. A request inside the retained window is
//! answered from memory; any other request advances the cursor until the
//! requested rows plus `look_ahead` further rows are buffered, evicting the
//! oldest rows on the way.
//!
//! ```text
//!   first_cached                               consumed
//!        |<------------- cache_size ------------->|
//!   .....[ history ... | offset .. offset+len | look-ahead ]..... source
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::monitor::ExecutionMonitor;
use crate::projection::ColumnFilter;
use crate::row::{Cell, Row, RowKey, TableSpec};
use crate::source::{RowCursor, RowSource};

/// Default number of rows retained (500).
pub const DEFAULT_CACHE_SIZE: usize = 500;

/// Default number of rows fetched ahead on a miss (50).
pub const DEFAULT_LOOK_AHEAD: usize = 50;

/// Random-access window over a forward-only [`RowSource`].
pub struct WindowCache {
    /// Bound table; `None` means "no data".
    source: Option<Arc<dyn RowSource>>,
    /// Opened on the first miss.
    cursor: Option<Box<dyn RowCursor>>,
    exhausted: bool,
    rows: VecDeque<Row>,
    /// Absolute index of `rows[0]`.
    first_cached: usize,
    cache_size: usize,
    look_ahead: usize,
    /// High-water mark; exact once `row_count_final` is set.
    row_count: usize,
    row_count_final: bool,
    filter: Option<ColumnFilter>,
    rewind_on_evicted: bool,
}

impl fmt::Debug for WindowCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowCache")
            .field("table", &self.table_name())
            .field("cached", &self.cached_range())
            .field("exhausted", &self.exhausted)
            .field("cache_size", &self.cache_size)
            .field("look_ahead", &self.look_ahead)
            .field("row_count", &self.row_count)
            .field("row_count_final", &self.row_count_final)
            .finish()
    }
}

impl Default for WindowCache {
    fn default() -> Self {
        Self::empty()
    }
}

impl WindowCache {
    /// Cache without data: zero rows (final), zero columns, no spec.
    pub fn empty() -> Self {
        Self {
            source: None,
            cursor: None,
            exhausted: true,
            rows: VecDeque::new(),
            first_cached: 0,
            cache_size: DEFAULT_CACHE_SIZE,
            look_ahead: DEFAULT_LOOK_AHEAD,
            row_count: 0,
            row_count_final: true,
            filter: None,
            rewind_on_evicted: false,
        }
    }

    pub fn new<S: RowSource + 'static>(source: S) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<dyn RowSource>) -> Self {
        let known = source.row_count();
        Self {
            source: Some(source),
            exhausted: false,
            row_count: known.unwrap_or(0),
            row_count_final: known.is_some(),
            ..Self::empty()
        }
    }

    /// Cache restricted to the named columns. An empty list keeps all columns.
    pub fn with_columns<S, N>(source: S, columns: &[N]) -> CacheResult<Self>
    where
        S: RowSource + 'static,
        N: AsRef<str>,
    {
        let mut cache = Self::new(source);
        cache.set_columns(columns)?;
        Ok(cache)
    }

    pub fn with_config<S: RowSource + 'static>(source: S, config: &CacheConfig) -> CacheResult<Self> {
        let mut cache = Self::new(source);
        cache.apply_config(config)?;
        Ok(cache)
    }

    pub fn apply_config(&mut self, config: &CacheConfig) -> CacheResult<()> {
        config.validate()?;
        // look-ahead twice: the first call may be capped by the old cache size
        self.set_look_ahead(config.look_ahead)?;
        self.set_cache_size(config.cache_size)?;
        self.set_look_ahead(config.look_ahead)?;
        self.rewind_on_evicted = config.rewind_on_evicted;
        Ok(())
    }

    /// Restrict returned rows to `columns`; excluded cells read as missing.
    pub fn set_columns<N: AsRef<str>>(&mut self, columns: &[N]) -> CacheResult<()> {
        self.filter = match self.table_spec() {
            Some(spec) => ColumnFilter::resolve(spec, columns)?,
            None => None,
        };
        Ok(())
    }

    pub fn has_data(&self) -> bool {
        self.source.is_some()
    }

    pub fn data_table(&self) -> Option<&Arc<dyn RowSource>> {
        self.source.as_ref()
    }

    pub fn table_spec(&self) -> Option<&TableSpec> {
        self.source.as_deref().map(|s| s.spec())
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_spec().map(TableSpec::name)
    }

    pub fn column_count(&self) -> usize {
        self.table_spec().map_or(0, TableSpec::num_columns)
    }

    pub fn column_name(&self, column: usize) -> CacheResult<&str> {
        self.bound_column(column)?;
        self.table_spec()
            .and_then(|spec| spec.column(column))
            .map(|c| c.name.as_str())
            .ok_or_else(|| CacheError::out_of_bounds(format!("no column {}", column)))
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn look_ahead(&self) -> usize {
        self.look_ahead
    }

    /// Largest window a single request may ask for.
    pub fn max_window(&self) -> usize {
        self.cache_size - self.look_ahead
    }

    /// Set the number of retained rows; raised to `2 * look_ahead` if smaller.
    ///
    /// Growing keeps the cached window. Shrinking evicts the oldest rows.
    /// Returns the effective size.
    pub fn set_cache_size(&mut self, size: usize) -> CacheResult<usize> {
        if size == 0 {
            return Err(CacheError::out_of_bounds("cache size must not be <= 0: 0"));
        }
        self.cache_size = size.max(2 * self.look_ahead);
        let mut evicted = 0;
        while self.rows.len() > self.cache_size {
            self.rows.pop_front();
            self.first_cached += 1;
            evicted += 1;
        }
        debug!(cache_size = self.cache_size, evicted, "cache size changed");
        Ok(self.cache_size)
    }

    /// Set the look-ahead; capped to `cache_size / 2`. Returns the effective size.
    pub fn set_look_ahead(&mut self, size: usize) -> CacheResult<usize> {
        if size == 0 {
            return Err(CacheError::out_of_bounds("look ahead size must not be <= 0: 0"));
        }
        self.look_ahead = size.min(self.cache_size / 2);
        debug!(look_ahead = self.look_ahead, "look ahead changed");
        Ok(self.look_ahead)
    }

    pub fn set_rewind_on_evicted(&mut self, rewind: bool) {
        self.rewind_on_evicted = rewind;
    }

    pub fn rewinds_on_evicted(&self) -> bool {
        self.rewind_on_evicted
    }

    /// Whether the total row count is known and final.
    pub fn has_row_count(&self) -> bool {
        self.row_count_final
    }

    pub fn row_count(&self) -> CacheResult<usize> {
        if !self.row_count_final {
            return Err(CacheError::RowCountUnknown);
        }
        Ok(self.row_count)
    }

    /// Record a row count learned elsewhere (e.g. a background counter).
    ///
    /// The larger of the known and the new value is kept. A provisional
    /// count only avoids needless bound failures; a final one enables them.
    /// Once the count is final, provisional values are ignored.
    pub fn set_row_count(&mut self, count: usize, is_final: bool) {
        if self.row_count_final && !is_final {
            return;
        }
        if count > self.row_count {
            self.row_count = count;
        }
        if is_final && !self.row_count_final {
            self.row_count_final = true;
            info!(row_count = self.row_count, "row count finalized");
        }
    }

    /// Rows pulled from the cursor so far.
    pub fn rows_seen(&self) -> usize {
        self.first_cached + self.rows.len()
    }

    /// Absolute indices of the rows currently held.
    pub fn cached_range(&self) -> Range<usize> {
        self.first_cached..self.rows_seen()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Get up to `length` rows starting at `offset`.
    ///
    /// Served from the window when possible; otherwise the cursor advances
    /// until `offset + length + look_ahead - 1` rows were consumed or the
    /// source ends. Fewer rows than requested are returned at the end of the
    /// table. The monitor, if any, is polled for cancellation before every
    /// row pulled; rows consumed before a cancellation or source failure
    /// stay cached.
    pub fn get_rows(
        &mut self,
        offset: usize,
        length: usize,
        monitor: Option<&ExecutionMonitor>,
    ) -> CacheResult<Vec<Row>> {
        if length > self.max_window() {
            return Err(CacheError::out_of_bounds(format!(
                "window of {} rows exceeds maximum of {} (cache size {} - look ahead {})",
                length,
                self.max_window(),
                self.cache_size,
                self.look_ahead
            )));
        }
        if length == 0 {
            return Ok(Vec::new());
        }
        if !self.has_data() {
            return Err(CacheError::out_of_bounds("cache has no data"));
        }
        self.bound_row(offset)?;

        let end = offset.checked_add(length).ok_or_else(|| {
            CacheError::out_of_bounds(format!(
                "window of {} rows at row {} overflows the row index",
                length, offset
            ))
        })?;
        if self.is_cached(offset, end) {
            trace!(offset, length, "window cache hit");
            return Ok(self.cached_slice(offset, end));
        }

        if offset < self.first_cached {
            if !self.rewind_on_evicted {
                return Err(CacheError::RowEvicted {
                    row: offset,
                    first_cached: self.first_cached,
                });
            }
            self.rewind();
        }

        self.advance_to(end.saturating_add(self.look_ahead - 1), monitor)?;

        // the count may have become final while advancing
        self.bound_row(offset)?;
        if offset >= self.rows_seen() {
            return Err(CacheError::out_of_bounds(format!(
                "row index {} beyond end of table ({} rows)",
                offset,
                self.rows_seen()
            )));
        }
        Ok(self.cached_slice(offset, end))
    }

    pub fn row(&mut self, index: usize, monitor: Option<&ExecutionMonitor>) -> CacheResult<Row> {
        self.get_rows(index, 1, monitor)?
            .pop()
            .ok_or_else(|| CacheError::out_of_bounds(format!("no row at index {}", index)))
    }

    pub fn row_key(&mut self, index: usize, monitor: Option<&ExecutionMonitor>) -> CacheResult<RowKey> {
        Ok(self.row(index, monitor)?.key().clone())
    }

    pub fn value_at(
        &mut self,
        row: usize,
        column: usize,
        monitor: Option<&ExecutionMonitor>,
    ) -> CacheResult<Cell> {
        self.bound_column(column)?;
        let row = self.row(row, monitor)?;
        row.cell(column).cloned().ok_or_else(|| {
            CacheError::out_of_bounds(format!(
                "row {} has {} cells, no column {}",
                row.key(),
                row.num_cells(),
                column
            ))
        })
    }

    fn is_cached(&self, offset: usize, end: usize) -> bool {
        let seen = self.rows_seen();
        offset >= self.first_cached && (end <= seen || (self.exhausted && offset < seen))
    }

    fn cached_slice(&self, offset: usize, end: usize) -> Vec<Row> {
        let from = offset - self.first_cached;
        let to = end.min(self.rows_seen()) - self.first_cached;
        self.rows
            .range(from..to)
            .map(|row| match &self.filter {
                Some(filter) => filter.apply(row),
                None => row.clone(),
            })
            .collect()
    }

    fn advance_to(&mut self, target: usize, monitor: Option<&ExecutionMonitor>) -> CacheResult<()> {
        let start = self.rows_seen();
        if self.exhausted || target <= start {
            return Ok(());
        }
        let mut cursor = match self.cursor.take() {
            Some(cursor) => cursor,
            None => self.open_cursor()?,
        };
        let first_before = self.first_cached;
        let result = self.pull_rows(cursor.as_mut(), target, monitor);
        self.cursor = Some(cursor);

        debug!(
            from = start,
            to = self.rows_seen(),
            evicted = self.first_cached - first_before,
            exhausted = self.exhausted,
            "advanced cursor"
        );
        result?;
        if let Some(monitor) = monitor {
            monitor.set_progress(1.0);
        }
        Ok(())
    }

    fn pull_rows(
        &mut self,
        cursor: &mut dyn RowCursor,
        target: usize,
        monitor: Option<&ExecutionMonitor>,
    ) -> CacheResult<()> {
        let needed = target - self.rows_seen();
        let mut scanned = 0;
        while self.rows_seen() < target {
            if let Some(monitor) = monitor {
                monitor.check_canceled()?;
            }
            match cursor.next_row()? {
                Some(row) => {
                    self.push_row(row);
                    scanned += 1;
                    if let Some(monitor) = monitor {
                        monitor.report(scanned, needed);
                    }
                }
                None => {
                    self.mark_exhausted();
                    break;
                }
            }
        }
        Ok(())
    }

    fn open_cursor(&self) -> CacheResult<Box<dyn RowCursor>> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| CacheError::out_of_bounds("cache has no data"))?;
        Ok(source.open()?)
    }

    fn push_row(&mut self, row: Row) {
        if self.rows.len() >= self.cache_size {
            self.rows.pop_front();
            self.first_cached += 1;
        }
        self.rows.push_back(row);
        let seen = self.rows_seen();
        if seen > self.row_count {
            self.row_count = seen;
        }
    }

    fn mark_exhausted(&mut self) {
        self.exhausted = true;
        self.set_row_count(self.rows_seen(), true);
    }

    /// Drop the cursor and window so the next miss re-reads from row 0.
    fn rewind(&mut self) {
        warn!(
            first_cached = self.first_cached,
            "requested row was evicted, re-opening source"
        );
        self.cursor = None;
        self.rows.clear();
        self.first_cached = 0;
        self.exhausted = false;
    }

    fn bound_row(&self, row: usize) -> CacheResult<()> {
        if self.row_count_final && row >= self.row_count {
            return Err(CacheError::out_of_bounds(format!(
                "row index {} must be < {}",
                row, self.row_count
            )));
        }
        Ok(())
    }

    fn bound_column(&self, column: usize) -> CacheResult<()> {
        if column >= self.column_count() {
            return Err(CacheError::out_of_bounds(format!(
                "column index must not be >= {}: {}",
                self.column_count(),
                column
            )));
        }
        Ok(())
    }
}
