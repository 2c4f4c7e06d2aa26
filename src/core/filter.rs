// TerraLens - core/filter.rs
//
// Composable filter engine for log entries.
// All active filters are AND-combined.
// Core layer: pure logic, no I/O or CLI dependencies.

use crate::core::model::{FilterSpec, LogEntry};

/// Apply a filter spec to a slice of entries, returning indices of matching
/// entries.
///
/// Returns a Vec of indices into the original entries slice, in input order.
/// This avoids copying entries and lets the correlation grouper and export
/// operate on the same borrowed view. The input is never mutated, and a spec
/// with no active clauses is the identity.
pub fn apply_filters(entries: &[LogEntry], spec: &FilterSpec) -> Vec<usize> {
    if spec.is_empty() {
        return (0..entries.len()).collect();
    }

    let search_lower = spec.search_text.to_lowercase();
    let dynamic_lower: Vec<(&str, String)> = spec
        .dynamic
        .iter()
        .filter(|f| !f.is_inert())
        .map(|f| (f.field.trim(), f.value.to_lowercase()))
        .collect();

    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| matches_all(entry, spec, &search_lower, &dynamic_lower))
        .map(|(idx, _)| idx)
        .collect()
}

/// Check if a single entry matches all active clauses.
fn matches_all(
    entry: &LogEntry,
    spec: &FilterSpec,
    search_lower: &str,
    dynamic_lower: &[(&str, String)],
) -> bool {
    // Operation filter (None = unset or the "all" sentinel)
    if let Some(operation) = spec.operation {
        if entry.operation != operation {
            return false;
        }
    }

    // Level filter
    if let Some(level) = spec.level {
        if entry.level != level {
            return false;
        }
    }

    // Text search: case-insensitive substring against message OR rpc name
    if !search_lower.is_empty() {
        let in_message = entry.message.to_lowercase().contains(search_lower);
        let in_rpc = entry
            .rpc_name
            .as_deref()
            .is_some_and(|rpc| rpc.to_lowercase().contains(search_lower));
        if !in_message && !in_rpc {
            return false;
        }
    }

    // Read flag: include_read = true excludes nothing
    if !spec.include_read && entry.read {
        return false;
    }

    // Dynamic field filters: the entry must satisfy ALL of them
    for (field, value_lower) in dynamic_lower {
        let resolved = resolve_field(entry, field);
        if !resolved.to_lowercase().contains(value_lower.as_str()) {
            return false;
        }
    }

    true
}

/// Resolve a dynamic filter's field name against the entry.
///
/// Well-known fields are checked first (both engine names and the raw
/// Terraform names users see in their log files), then the open-schema
/// attribute map. An absent field resolves to the empty string, so any
/// non-empty filter value excludes the entry.
fn resolve_field(entry: &LogEntry, field: &str) -> String {
    match field {
        "id" => entry.id.clone(),
        "message" => entry.message.clone(),
        "level" => entry.level.label().to_string(),
        "operation" => entry.operation.label().to_string(),
        "rpc_name" | "tf_rpc" => entry.rpc_name.clone().unwrap_or_default(),
        "resource_type" | "tf_resource_type" => entry.resource_type.clone().unwrap_or_default(),
        "request_id" | "tf_req_id" => entry.request_id.clone().unwrap_or_default(),
        "transaction_id" | "tf_http_trans_id" => {
            entry.transaction_id.clone().unwrap_or_default()
        }
        _ => entry
            .attributes
            .get(field)
            .map(|v| v.as_text())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{AttrValue, FieldFilter, LogLevel, Operation};
    use chrono::{TimeZone, Utc};

    fn make_entry(id: u64, level: LogLevel, operation: Operation, message: &str) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            level,
            operation,
            message: message.to_string(),
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
    fn test_empty_spec_is_identity() {
        let entries = vec![
            make_entry(1, LogLevel::Error, Operation::Plan, "Error 1"),
            make_entry(2, LogLevel::Info, Operation::Apply, "Info 1"),
        ];
        let result = apply_filters(&entries, &FilterSpec::default());
        assert_eq!(result, vec![0, 1]);
    }

    #[test]
    fn test_operation_and_level_filters() {
        let entries = vec![
            make_entry(1, LogLevel::Error, Operation::Plan, "plan error"),
            make_entry(2, LogLevel::Error, Operation::Apply, "apply error"),
            make_entry(3, LogLevel::Info, Operation::Apply, "apply info"),
        ];

        let spec = FilterSpec {
            operation: Some(Operation::Apply),
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &spec), vec![1, 2]);

        let spec = FilterSpec {
            operation: Some(Operation::Apply),
            level: Some(LogLevel::Error),
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &spec), vec![1]);
    }

    #[test]
    fn test_search_matches_message_or_rpc_name() {
        let mut with_rpc = make_entry(1, LogLevel::Info, Operation::Plan, "quiet message");
        with_rpc.rpc_name = Some("PlanResourceChange".to_string());
        let entries = vec![
            with_rpc,
            make_entry(2, LogLevel::Info, Operation::Plan, "planresource mention"),
            make_entry(3, LogLevel::Info, Operation::Plan, "unrelated"),
        ];

        let spec = FilterSpec {
            search_text: "PLANRESOURCE".to_string(),
            ..Default::default()
        };
        // Case-insensitive; entry 0 matches on rpc name, entry 1 on message.
        assert_eq!(apply_filters(&entries, &spec), vec![0, 1]);
    }

    #[test]
    fn test_include_read() {
        let mut read_entry = make_entry(1, LogLevel::Info, Operation::Plan, "seen");
        read_entry.read = true;
        let entries = vec![
            read_entry,
            make_entry(2, LogLevel::Info, Operation::Plan, "unseen"),
        ];

        let spec = FilterSpec {
            include_read: false,
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &spec), vec![1]);

        // include_read = true excludes nothing
        assert_eq!(apply_filters(&entries, &FilterSpec::default()), vec![0, 1]);
    }

    #[test]
    fn test_dynamic_filter_on_attribute() {
        let mut tagged = make_entry(1, LogLevel::Info, Operation::Plan, "one");
        tagged.attributes.insert(
            "tf_provider_addr".to_string(),
            AttrValue::Text("registry.terraform.io/hashicorp/aws".to_string()),
        );
        let entries = vec![
            tagged,
            make_entry(2, LogLevel::Info, Operation::Plan, "two"),
        ];

        let spec = FilterSpec {
            dynamic: vec![FieldFilter {
                field: "tf_provider_addr".to_string(),
                value: "hashicorp/AWS".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &spec), vec![0]);
    }

    #[test]
    fn test_dynamic_filter_absent_field_excludes() {
        // A non-empty filter on a field the entry does not carry resolves to
        // "" and therefore excludes it.
        let entries = vec![make_entry(1, LogLevel::Info, Operation::Plan, "x")];
        let spec = FilterSpec {
            dynamic: vec![FieldFilter {
                field: "no_such_field".to_string(),
                value: "anything".to_string(),
            }],
            ..Default::default()
        };
        assert!(apply_filters(&entries, &spec).is_empty());
    }

    #[test]
    fn test_inert_dynamic_filter_excludes_nothing() {
        let entries = vec![make_entry(1, LogLevel::Info, Operation::Plan, "x")];
        let spec = FilterSpec {
            dynamic: vec![
                FieldFilter {
                    field: String::new(),
                    value: "anything".to_string(),
                },
                FieldFilter {
                    field: "message".to_string(),
                    value: String::new(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &spec), vec![0]);
    }

    #[test]
    fn test_dynamic_filters_are_and_combined() {
        let mut a = make_entry(1, LogLevel::Info, Operation::Plan, "alpha");
        a.resource_type = Some("aws_instance".to_string());
        let mut b = make_entry(2, LogLevel::Info, Operation::Plan, "alpha");
        b.resource_type = Some("aws_s3_bucket".to_string());
        let entries = vec![a, b];

        let spec = FilterSpec {
            dynamic: vec![
                FieldFilter {
                    field: "message".to_string(),
                    value: "alpha".to_string(),
                },
                FieldFilter {
                    field: "resource_type".to_string(),
                    value: "instance".to_string(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &spec), vec![0]);
    }

    #[test]
    fn test_dynamic_filter_stringifies_numbers() {
        let mut entry = make_entry(1, LogLevel::Info, Operation::Plan, "x");
        entry
            .attributes
            .insert("attempt".to_string(), AttrValue::Number(3.0));
        let entries = vec![entry];

        let spec = FilterSpec {
            dynamic: vec![FieldFilter {
                field: "attempt".to_string(),
                value: "3".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &spec), vec![0]);
    }
}
