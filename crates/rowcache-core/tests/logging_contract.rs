//! Log capture contract: the cache reports advancement, row count
//! finalization and rewinds as structured tracing events.

mod common;

use common::{memory_table, AccessFlags, RestrictedTable};
use rowcache_core::WindowCache;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct MockWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl std::io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for MockWriter {
    type Writer = MockWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl MockWriter {
    /// Captured events as parsed JSON lines.
    fn events(&self) -> Vec<Value> {
        let raw = String::from_utf8(self.buf.lock().unwrap().clone()).unwrap();
        raw.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("log line is JSON"))
            .collect()
    }

    fn find(&self, message: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|e| e["fields"]["message"] == message)
            .collect()
    }
}

fn setup_capture() -> (MockWriter, tracing::subscriber::DefaultGuard) {
    let writer = MockWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .json()
        .finish();
    (writer, tracing::subscriber::set_default(subscriber))
}

fn unknown_size_cache(rows: usize) -> WindowCache {
    WindowCache::new(RestrictedTable::new(
        memory_table(rows),
        AccessFlags::allowing(),
    ))
}

#[test]
fn exhaustion_logs_final_row_count() -> anyhow::Result<()> {
    let (writer, _guard) = setup_capture();
    let mut cache = unknown_size_cache(30);

    let rows = cache.get_rows(10, 5, None)?;
    assert_eq!(rows.len(), 5);

    let finalized = writer.find("row count finalized");
    assert_eq!(finalized.len(), 1);
    assert_eq!(finalized[0]["level"], "INFO");
    assert_eq!(finalized[0]["fields"]["row_count"], 30);

    let advanced = writer.find("advanced cursor");
    assert_eq!(advanced.len(), 1);
    assert_eq!(advanced[0]["fields"]["to"], 30);
    assert_eq!(advanced[0]["fields"]["exhausted"], true);
    Ok(())
}

#[test]
fn hits_log_at_trace_only() -> anyhow::Result<()> {
    let (writer, _guard) = setup_capture();
    let mut cache = unknown_size_cache(200);

    cache.get_rows(0, 10, None)?;
    cache.get_rows(5, 10, None)?;

    let hits = writer.find("window cache hit");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["level"], "TRACE");
    assert_eq!(writer.find("advanced cursor").len(), 1);
    Ok(())
}

#[test]
fn rewind_logs_warning() -> anyhow::Result<()> {
    let (writer, _guard) = setup_capture();
    let mut cache = unknown_size_cache(200);
    cache.set_look_ahead(10)?;
    cache.set_cache_size(20)?;
    cache.set_rewind_on_evicted(true);

    cache.get_rows(100, 5, None)?;
    let rows = cache.get_rows(0, 5, None)?;
    assert_eq!(rows[0].key().as_str(), "r0");

    let warnings = writer.find("requested row was evicted, re-opening source");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["level"], "WARN");
    assert_eq!(warnings[0]["fields"]["first_cached"], 94);
    Ok(())
}
