//! JSON Lines files as forward-only row sources.
//!
//! One JSON object per line, blank lines skipped. The columns are the sorted
//! keys of the first object (minus the key field); a later line missing a
//! column reads as a missing cell and extra keys are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use rowcache_core::{
    Cell, ColumnSpec, Row, RowCursor, RowKey, RowSource, SourceResult, TableSpec,
};
use serde_json::{Map, Value};

#[derive(Debug)]
pub struct JsonLinesSource {
    path: PathBuf,
    key_field: Option<String>,
    spec: TableSpec,
}

impl JsonLinesSource {
    /// Read the first object of `path` to derive the table spec.
    pub fn from_path(path: impl AsRef<Path>, key_field: Option<&str>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

        let mut columns = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("failed to read {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let object = parse_object(&line)
                .map_err(|e| anyhow::anyhow!("{}:{}: {}", path.display(), idx + 1, e))?;
            let mut names: Vec<&String> = object
                .keys()
                .filter(|k| Some(k.as_str()) != key_field)
                .collect();
            names.sort();
            columns = names
                .into_iter()
                .map(|name| ColumnSpec::new(name.as_str(), to_cell(&object[name]).kind()))
                .collect();
            if let Some(field) = key_field {
                if !object.contains_key(field) {
                    bail!("key field '{}' not found in first row of {}", field, path.display());
                }
            }
            break;
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table".to_string());
        tracing::debug!(table = %name, columns = columns.len(), "opened JSON Lines source");

        Ok(Self {
            path: path.to_path_buf(),
            key_field: key_field.map(str::to_string),
            spec: TableSpec::new(name, columns),
        })
    }
}

impl RowSource for JsonLinesSource {
    fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn open(&self) -> SourceResult<Box<dyn RowCursor>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(JsonLinesCursor {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            row_index: 0,
            key_field: self.key_field.clone(),
            columns: self.spec.columns().iter().map(|c| c.name.clone()).collect(),
        }))
    }
}

struct JsonLinesCursor {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    row_index: usize,
    key_field: Option<String>,
    columns: Vec<String>,
}

impl RowCursor for JsonLinesCursor {
    fn next_row(&mut self) -> SourceResult<Option<Row>> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let object =
                parse_object(&line).map_err(|e| format!("line {}: {}", self.line_no, e))?;

            let key = match self.key_field.as_deref().and_then(|f| object.get(f)) {
                Some(Value::String(s)) => RowKey::new(s.as_str()),
                Some(Value::Null) | None => RowKey::for_index(self.row_index),
                Some(other) => RowKey::new(other.to_string()),
            };
            let cells: Vec<Cell> = self
                .columns
                .iter()
                .map(|name| object.get(name).map_or(Cell::Missing, to_cell))
                .collect();

            self.row_index += 1;
            return Ok(Some(Row::new(key, cells)));
        }
        Ok(None)
    }
}

fn parse_object(line: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

pub fn to_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Missing,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map_or(Cell::Missing, Cell::Float),
        },
        Value::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}
