use std::io::{BufRead, BufReader, Read};

use super::MemoryStore;
use crate::errors::StoreError;
use crate::types::Document;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: u64,
}

/// Loads one JSON object per line into `store`. Blank lines are skipped.
///
/// # Errors
/// Returns an error naming the line when a record is not a JSON object or has an
/// unusable `_id`.
pub fn load_ndjson<R: Read>(store: &MemoryStore, reader: R) -> Result<LoadReport, StoreError> {
    let mut reader = BufReader::new(reader);
    let mut report = LoadReport::default();
    let mut line_no: usize = 0;
    let mut buf = String::with_capacity(8 * 1024);
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        let doc = parse_json_document(line)
            .map_err(|e| StoreError::InvalidDocument(format!("line {line_no}: {e}")))?;
        store.insert(doc)?;
        report.inserted += 1;
        if report.inserted % 10_000 == 0 {
            log::info!("loaded {} records (ndjson)", report.inserted);
        }
    }
    Ok(report)
}

fn parse_json_document(json: &str) -> Result<Document, StoreError> {
    let val: serde_json::Value = serde_json::from_str(json)?;
    let obj = match val {
        serde_json::Value::Object(obj) => obj,
        _ => return Err(StoreError::InvalidDocument("expected JSON object".into())),
    };
    Document::try_from(obj).map_err(|e| StoreError::Bson(e.to_string()))
}
