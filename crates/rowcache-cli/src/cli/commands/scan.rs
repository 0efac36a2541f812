use serde_json::json;

use super::super::args::{OutputFormat, ScanArgs};
use crate::exit_codes::SUCCESS;

pub fn run(args: ScanArgs) -> anyhow::Result<i32> {
    let mut cache = super::open_cache(&args.source)?;
    let monitor = super::progress_monitor();
    let page_size = args.page_size.clamp(1, cache.max_window());
    if page_size != args.page_size {
        tracing::warn!(
            requested = args.page_size,
            page_size,
            "page size adjusted to what the cache can serve"
        );
    }

    let pages = super::walk_pages(&mut cache, page_size, &monitor, |offset, rows| {
        tracing::debug!(offset, rows = rows.len(), "page");
    })?;
    let rows = cache.row_count()?;

    match args.format {
        OutputFormat::Json => {
            let out = json!({
                "table": cache.table_name(),
                "rows": rows,
                "pages": pages,
                "page_size": page_size,
            });
            println!("{}", serde_json::to_string(&out)?);
        }
        OutputFormat::Text => {
            println!(
                "{}: {} rows in {} pages of up to {}",
                cache.table_name().unwrap_or("-"),
                rows,
                pages,
                page_size
            );
        }
    }
    Ok(SUCCESS)
}
