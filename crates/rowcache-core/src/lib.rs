//! Random access over tables that can only be read front to back.
//!
//! This crate provides a [`WindowCache`] that wraps a forward-only,
//! single-pass [`RowSource`] and serves "give me `n` rows starting at
//! `offset`" requests, e.g. for a scrolling table view:
//!
//! - A trailing window of already-read rows answers small backward jumps
//!   without touching the source
//! - A look-ahead buffer amortizes cursor advancement over many small
//!   forward steps
//! - Row counts are learned lazily and merged as a high-water mark
//! - Progress and cooperative cancellation via [`ExecutionMonitor`]
//!
//! # Quick Start
//!
//! ```
//! use rowcache_core::{Cell, CellKind, ColumnSpec, MemoryTable, Row, TableSpec, WindowCache};
//!
//! # fn example() -> rowcache_core::CacheResult<()> {
//! let spec = TableSpec::new("numbers", vec![ColumnSpec::new("n", CellKind::Int)]);
//! let rows = (0..1000)
//!     .map(|i| Row::new(format!("Row{}", i), vec![Cell::Int(i)]))
//!     .collect();
//!
//! let mut cache = WindowCache::new(MemoryTable::new(spec, rows));
//! let page = cache.get_rows(100, 20, None)?;
//! assert_eq!(page.len(), 20);
//! assert_eq!(page[0].cell(0), Some(&Cell::Int(100)));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Sizing
//!
//! `cache_size` bounds memory; `look_ahead` is how far past a miss the
//! cursor is pushed. `cache_size >= 2 * look_ahead` always holds: setting
//! either value silently adjusts it against the other.

pub mod config;
pub mod error;
pub mod monitor;
pub mod projection;
pub mod row;
pub mod source;
pub mod window;

// Re-export main types
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult, SourceError, SourceResult};
pub use monitor::{CancelHandle, ExecutionMonitor, ProgressEvent, ProgressSink};
pub use projection::ColumnFilter;
pub use row::{Cell, CellKind, ColumnSpec, Row, RowKey, TableSpec};
pub use source::{IterCursor, MemoryTable, RowCursor, RowSource};
pub use window::{WindowCache, DEFAULT_CACHE_SIZE, DEFAULT_LOOK_AHEAD};
