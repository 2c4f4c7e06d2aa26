// TerraLens - core/stats.rs
//
// One-pass aggregate statistics over a (filtered) entry view. Input to the
// quality scoring engine and the CLI score report.

use crate::core::model::{LogEntry, LogStats};

/// Collect aggregate counts over a filtered view (indices into `entries`).
pub fn collect(entries: &[LogEntry], indices: &[usize]) -> LogStats {
    let mut stats = LogStats::default();

    for &idx in indices {
        let Some(entry) = entries.get(idx) else {
            continue;
        };
        stats.total_entries += 1;
        *stats.levels.entry(entry.level).or_insert(0) += 1;
        *stats.operations.entry(entry.operation).or_insert(0) += 1;
        if let Some(resource) = entry.resource_type.as_deref() {
            *stats.resource_types.entry(resource.to_string()).or_insert(0) += 1;
        }
        if let Some(rpc) = entry.rpc_name.as_deref() {
            *stats.rpc_methods.entry(rpc.to_string()).or_insert(0) += 1;
        }
        stats.block_count += entry.blocks.len();
    }

    stats
}

/// Collect over an entire entry collection.
pub fn collect_all(entries: &[LogEntry]) -> LogStats {
    let indices: Vec<usize> = (0..entries.len()).collect();
    collect(entries, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{LogLevel, Operation, StructuredBlock};
    use chrono::{TimeZone, Utc};

    fn make_entry(id: u64, level: LogLevel, operation: Operation) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            level,
            operation,
            message: String::new(),
            request_id: None,
            transaction_id: None,
            rpc_name: None,
            resource_type: None,
            attributes: Default::default(),
            blocks: Vec::new(),
            read: false,
        }
    }

    #[test]
    fn test_collect_counts() {
        let mut with_extras = make_entry(1, LogLevel::Error, Operation::Apply);
        with_extras.resource_type = Some("aws_instance".to_string());
        with_extras.rpc_name = Some("ApplyResourceChange".to_string());
        with_extras.blocks.push(StructuredBlock {
            kind: "tf_http_req_body".to_string(),
            is_raw: false,
            payload: serde_json::json!({}),
        });

        let entries = vec![
            with_extras,
            make_entry(2, LogLevel::Warn, Operation::Plan),
            make_entry(3, LogLevel::Warn, Operation::Plan),
        ];
        let stats = collect_all(&entries);

        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.error_count(), 1);
        assert_eq!(stats.warning_count(), 2);
        assert_eq!(stats.operations[&Operation::Plan], 2);
        assert_eq!(stats.resource_types["aws_instance"], 1);
        assert_eq!(stats.rpc_methods["ApplyResourceChange"], 1);
        assert_eq!(stats.block_count, 1);
    }

    #[test]
    fn test_collect_respects_view() {
        let entries = vec![
            make_entry(1, LogLevel::Error, Operation::Plan),
            make_entry(2, LogLevel::Info, Operation::Plan),
        ];
        let stats = collect(&entries, &[1]);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.error_count(), 0);
    }
}
