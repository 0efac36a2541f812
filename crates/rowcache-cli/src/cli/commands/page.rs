use rowcache_core::{Row, TableSpec};
use serde_json::{json, Map, Value};

use super::super::args::{OutputFormat, PageArgs};
use crate::exit_codes::SUCCESS;

pub fn run(args: PageArgs) -> anyhow::Result<i32> {
    let mut cache = super::open_cache(&args.source)?;
    cache.set_columns(&args.columns)?;
    let monitor = super::progress_monitor();

    let rows = cache.get_rows(args.offset, args.length, Some(&monitor))?;
    let spec = cache.table_spec().cloned().unwrap_or_else(|| TableSpec::new("", Vec::new()));
    let shown = shown_columns(&spec, &args.columns);

    match args.format {
        OutputFormat::Json => {
            let out: Vec<Value> = rows
                .iter()
                .enumerate()
                .map(|(i, row)| row_json(args.offset + i, row, &spec, &shown))
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            let mut header = vec!["#".to_string(), "key".to_string()];
            header.extend(shown.iter().filter_map(|&c| spec.column(c)).map(|c| c.name.clone()));
            println!("{}", header.join("\t"));
            for (i, row) in rows.iter().enumerate() {
                let mut line = vec![(args.offset + i).to_string(), row.key().to_string()];
                line.extend(shown.iter().map(|&c| {
                    row.cell(c).map_or_else(|| "?".to_string(), ToString::to_string)
                }));
                println!("{}", line.join("\t"));
            }
        }
    }
    Ok(SUCCESS)
}

/// Column indices to print, in table order.
fn shown_columns(spec: &TableSpec, selected: &[String]) -> Vec<usize> {
    (0..spec.num_columns())
        .filter(|&idx| {
            selected.is_empty()
                || spec
                    .column(idx)
                    .is_some_and(|c| selected.iter().any(|s| *s == c.name))
        })
        .collect()
}

fn row_json(index: usize, row: &Row, spec: &TableSpec, shown: &[usize]) -> Value {
    let cells: Map<String, Value> = shown
        .iter()
        .filter_map(|&c| {
            let name = spec.column(c)?.name.clone();
            let value = row.cell(c).map_or(Ok(Value::Null), serde_json::to_value);
            Some((name, value.unwrap_or(Value::Null)))
        })
        .collect();
    json!({ "index": index, "key": row.key(), "cells": cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowcache_core::{Cell, CellKind, ColumnSpec};

    fn spec() -> TableSpec {
        TableSpec::new(
            "t",
            vec![
                ColumnSpec::new("a", CellKind::Int),
                ColumnSpec::new("b", CellKind::Text),
                ColumnSpec::new("c", CellKind::Float),
            ],
        )
    }

    #[test]
    fn test_shown_columns_keep_table_order() {
        let spec = spec();
        assert_eq!(shown_columns(&spec, &[]), vec![0, 1, 2]);
        assert_eq!(shown_columns(&spec, &["c".into(), "a".into()]), vec![0, 2]);
    }

    #[test]
    fn test_row_json_uses_null_for_missing() {
        let row = Row::new("Row0", vec![Cell::Int(1), Cell::Missing, Cell::Float(2.5)]);
        let value = row_json(7, &row, &spec(), &[0, 1]);
        assert_eq!(value, json!({"index": 7, "key": "Row0", "cells": {"a": 1, "b": null}}));
    }
}
