//! Process exit codes for `rowcache`. Part of the CLI contract.

use rowcache_core::CacheError;

pub const SUCCESS: i32 = 0;
pub const INPUT_ERROR: i32 = 1; // Bad file, config or column name
pub const OUT_OF_BOUNDS: i32 = 2; // Row window outside the table or evicted
pub const CANCELED: i32 = 3;
pub const SOURCE_ERROR: i32 = 4; // Reading the table failed mid-way

/// Map a command failure to its exit code. Anything that is not a cache error
/// happened before the cache was built and counts as bad input.
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CacheError>() {
        Some(CacheError::OutOfBounds { .. })
        | Some(CacheError::RowEvicted { .. })
        | Some(CacheError::RowCountUnknown) => OUT_OF_BOUNDS,
        Some(CacheError::Canceled) => CANCELED,
        Some(CacheError::Source(_)) => SOURCE_ERROR,
        Some(CacheError::UnknownColumn { .. }) | Some(CacheError::Config { .. }) | None => {
            INPUT_ERROR
        }
    }
}
