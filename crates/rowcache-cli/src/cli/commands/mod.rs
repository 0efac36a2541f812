use std::sync::Arc;

use rowcache_core::{CacheConfig, CacheError, ExecutionMonitor, ProgressEvent, Row, WindowCache};

use super::args::*;
use crate::exit_codes::SUCCESS;
use crate::jsonl::JsonLinesSource;

pub mod info;
pub mod page;
pub mod scan;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Info(args) => info::run(args),
        Command::Page(args) => page::run(args),
        Command::Scan(args) => scan::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

/// Config precedence: defaults, then the config file, then `ROWCACHE_*`
/// environment variables, then command line flags.
pub(crate) fn resolve_config(args: &SourceArgs) -> anyhow::Result<CacheConfig> {
    let mut config = match &args.config {
        Some(path) => CacheConfig::load(path)?,
        None => CacheConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(size) = args.cache_size {
        config = config.with_cache_size(size);
    }
    if let Some(size) = args.look_ahead {
        config = config.with_look_ahead(size);
    }
    config.validate()?;
    Ok(config)
}

pub(crate) fn open_cache(args: &SourceArgs) -> anyhow::Result<WindowCache> {
    let config = resolve_config(args)?;
    let source = JsonLinesSource::from_path(&args.file, args.key_field.as_deref())?;
    let cache = WindowCache::with_config(source, &config)?;
    tracing::debug!(
        cache_size = cache.cache_size(),
        look_ahead = cache.look_ahead(),
        rewind = cache.rewinds_on_evicted(),
        "cache ready"
    );
    Ok(cache)
}

pub(crate) fn progress_monitor() -> ExecutionMonitor {
    ExecutionMonitor::new().with_sink(Arc::new(|event: ProgressEvent| {
        tracing::trace!(
            scanned = event.scanned,
            needed = event.needed,
            "advancing cursor"
        );
    }))
}

/// Read the table front to back in pages of at most `page_size` rows.
/// Returns the number of non-empty pages; afterwards the row count is final.
pub(crate) fn walk_pages(
    cache: &mut WindowCache,
    page_size: usize,
    monitor: &ExecutionMonitor,
    mut on_page: impl FnMut(usize, &[Row]),
) -> anyhow::Result<usize> {
    let page_size = page_size.clamp(1, cache.max_window());
    let mut offset = 0;
    let mut pages = 0;
    loop {
        if cache.has_row_count() && offset >= cache.row_count()? {
            break;
        }
        let rows = match cache.get_rows(offset, page_size, Some(monitor)) {
            Ok(rows) => rows,
            // table ended exactly at the previous page
            Err(CacheError::OutOfBounds { .. }) if cache.is_exhausted() => break,
            Err(e) => return Err(e.into()),
        };
        if rows.is_empty() {
            break;
        }
        on_page(offset, &rows);
        pages += 1;
        offset += rows.len();
        if rows.len() < page_size {
            break;
        }
    }
    Ok(pages)
}
