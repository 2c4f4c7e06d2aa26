// TerraLens - core/export.rs
//
// CSV and JSON export of a filtered entry view.
// Core layer: writes to any Write trait object; the caller owns file
// handling and format selection.
//
// JSON export round-trips the full entity shape losslessly (the model types
// derive both Serialize and Deserialize); CSV is a flat human-oriented
// projection.

use crate::core::model::LogEntry;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Export the filtered view as CSV.
///
/// Writes: timestamp, level, operation, request_id, rpc, resource_type,
/// message. Returns the number of rows written. Fails up front when the
/// view exceeds `max_entries` rather than truncating silently.
pub fn export_csv<W: Write>(
    entries: &[LogEntry],
    indices: &[usize],
    writer: W,
    export_path: &Path,
    max_entries: usize,
) -> Result<usize, ExportError> {
    check_cap(indices.len(), max_entries)?;

    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record([
            "timestamp",
            "level",
            "operation",
            "request_id",
            "rpc",
            "resource_type",
            "message",
        ])
        .map_err(|e| ExportError::Csv {
            path: export_path.to_path_buf(),
            source: e,
        })?;

    let mut count = 0;
    for &idx in indices {
        let Some(entry) = entries.get(idx) else {
            continue;
        };
        csv_writer
            .write_record([
                &entry.timestamp.to_rfc3339(),
                entry.level.label(),
                entry.operation.label(),
                entry.request_id.as_deref().unwrap_or(""),
                entry.rpc_name.as_deref().unwrap_or(""),
                entry.resource_type.as_deref().unwrap_or(""),
                &entry.message,
            ])
            .map_err(|e| ExportError::Csv {
                path: export_path.to_path_buf(),
                source: e,
            })?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Export the filtered view as a JSON array of full entries.
pub fn export_json<W: Write>(
    entries: &[LogEntry],
    indices: &[usize],
    writer: W,
    export_path: &Path,
    max_entries: usize,
) -> Result<usize, ExportError> {
    check_cap(indices.len(), max_entries)?;

    let view: Vec<&LogEntry> = indices.iter().filter_map(|&i| entries.get(i)).collect();
    serde_json::to_writer_pretty(writer, &view).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(view.len())
}

fn check_cap(count: usize, max_entries: usize) -> Result<(), ExportError> {
    if count > max_entries {
        return Err(ExportError::TooManyEntries {
            count,
            max: max_entries,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{LogLevel, Operation};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn make_entry(id: u64, message: &str) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            level: LogLevel::Error,
            operation: Operation::Apply,
            message: message.to_string(),
            request_id: Some("req-1".to_string()),
            transaction_id: None,
            rpc_name: Some("ApplyResourceChange".to_string()),
            resource_type: Some("aws_instance".to_string()),
            attributes: Default::default(),
            blocks: Vec::new(),
            read: false,
        }
    }

    #[test]
    fn test_csv_export() {
        let entries = vec![make_entry(1, "Error one"), make_entry(2, "Error two")];
        let mut buf = Vec::new();
        let count =
            export_csv(&entries, &[0, 1], &mut buf, &PathBuf::from("out.csv"), 100).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains("timestamp,level,operation"));
        assert!(output.contains("Error one"));
        assert!(output.contains("Error two"));
    }

    #[test]
    fn test_csv_export_respects_view() {
        let entries = vec![make_entry(1, "kept"), make_entry(2, "dropped")];
        let mut buf = Vec::new();
        let count =
            export_csv(&entries, &[0], &mut buf, &PathBuf::from("out.csv"), 100).unwrap();
        assert_eq!(count, 1);
        assert!(!String::from_utf8(buf).unwrap().contains("dropped"));
    }

    #[test]
    fn test_json_export_round_trips() {
        let entries = vec![make_entry(1, "Test message")];
        let mut buf = Vec::new();
        let count =
            export_json(&entries, &[0], &mut buf, &PathBuf::from("out.json"), 100).unwrap();
        assert_eq!(count, 1);

        let decoded: Vec<LogEntry> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(decoded[0].message, "Test message");
        assert_eq!(decoded[0].request_id.as_deref(), Some("req-1"));
        assert_eq!(decoded[0].level, LogLevel::Error);
    }

    #[test]
    fn test_export_cap() {
        let entries = vec![make_entry(1, "a"), make_entry(2, "b")];
        let mut buf = Vec::new();
        let result = export_csv(&entries, &[0, 1], &mut buf, &PathBuf::from("out.csv"), 1);
        assert!(matches!(
            result,
            Err(ExportError::TooManyEntries { count: 2, max: 1 })
        ));
    }
}
