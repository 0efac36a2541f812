use rowcache_core::TableSpec;
use serde_json::json;

use super::super::args::{InfoArgs, OutputFormat};
use crate::exit_codes::SUCCESS;

pub fn run(args: InfoArgs) -> anyhow::Result<i32> {
    let mut cache = super::open_cache(&args.source)?;
    if !cache.has_row_count() {
        let monitor = super::progress_monitor();
        let page_size = cache.max_window();
        let pages = super::walk_pages(&mut cache, page_size, &monitor, |_, _| {})?;
        tracing::debug!(pages, "row count taken from a full scan");
    }
    let rows = cache.row_count()?;
    let spec = cache.table_spec().cloned().unwrap_or_else(|| TableSpec::new("", Vec::new()));

    match args.format {
        OutputFormat::Json => {
            let out = json!({
                "table": spec.name(),
                "file": args.source.file.display().to_string(),
                "columns": spec.columns(),
                "rows": rows,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("table:   {}", spec.name());
            println!("file:    {}", args.source.file.display());
            println!("rows:    {}", rows);
            println!("columns: {}", spec.num_columns());
            for column in spec.columns() {
                println!("  {:<24} {:?}", column.name, column.kind);
            }
        }
    }
    Ok(SUCCESS)
}
