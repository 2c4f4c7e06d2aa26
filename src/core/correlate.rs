// TerraLens - core/correlate.rs
//
// Correlation grouper: partitions a (filtered) entry view into ordered
// groups keyed by request id, so one group covers one logical operation's
// request/response lifecycle.
//
// Deterministic and stable: groups appear in the order their key was first
// encountered scanning the input left to right (insertion order, never
// sorted), and within a group entries keep their relative input order.

use crate::core::model::{CorrelationGroup, LogEntry};
use crate::util::constants::UNGROUPED_KEY;
use std::collections::HashMap;

/// Resolve the grouping key for an entry.
///
/// Priority: request id, then transport-level transaction id, then the
/// "ungrouped" sentinel. The sentinel group aggregates everything that could
/// not be correlated; it is a valid group like any other, not an error state.
/// The adapter normalises empty id strings to `None`, so presence alone
/// decides.
pub fn group_key(entry: &LogEntry) -> &str {
    entry
        .request_id
        .as_deref()
        .or(entry.transaction_id.as_deref())
        .unwrap_or(UNGROUPED_KEY)
}

/// Partition a filtered view (indices into `entries`) into correlation
/// groups.
///
/// Every index lands in exactly one group and the total count is preserved.
/// Always recomputed in full from the current filtered view; groups are
/// never patched incrementally, so they can never drift from a stale filter
/// result.
pub fn group_entries(entries: &[LogEntry], indices: &[usize]) -> Vec<CorrelationGroup> {
    let mut groups: Vec<CorrelationGroup> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for &idx in indices {
        let Some(entry) = entries.get(idx) else {
            continue;
        };
        let key = group_key(entry);
        match by_key.get(key) {
            Some(&group_idx) => groups[group_idx].entry_indices.push(idx),
            None => {
                by_key.insert(key.to_string(), groups.len());
                groups.push(CorrelationGroup {
                    key: key.to_string(),
                    entry_indices: vec![idx],
                });
            }
        }
    }

    groups
}

/// Group an entire entry collection (unfiltered convenience).
pub fn group_all(entries: &[LogEntry]) -> Vec<CorrelationGroup> {
    let indices: Vec<usize> = (0..entries.len()).collect();
    group_entries(entries, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{LogLevel, Operation};
    use chrono::{TimeZone, Utc};

    fn make_entry(id: u64, req: Option<&str>, trans: Option<&str>) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, id as u32).unwrap(),
            level: LogLevel::Info,
            operation: Operation::Plan,
            message: format!("entry {id}"),
            request_id: req.map(str::to_string),
            transaction_id: trans.map(str::to_string),
            rpc_name: None,
            resource_type: None,
            attributes: Default::default(),
            blocks: Vec::new(),
            read: false,
        }
    }

    #[test]
    fn test_key_priority_req_then_trans_then_sentinel() {
        assert_eq!(group_key(&make_entry(1, Some("X"), Some("Y"))), "X");
        assert_eq!(group_key(&make_entry(2, None, Some("Y"))), "Y");
        assert_eq!(group_key(&make_entry(3, None, None)), UNGROUPED_KEY);
    }

    #[test]
    fn test_mixed_keys_partition() {
        // Three entries sharing req id "X", two with only trans id "Y",
        // one with neither.
        let entries = vec![
            make_entry(1, Some("X"), None),
            make_entry(2, None, Some("Y")),
            make_entry(3, Some("X"), Some("Y")),
            make_entry(4, None, None),
            make_entry(5, None, Some("Y")),
            make_entry(6, Some("X"), None),
        ];
        let groups = group_all(&entries);

        assert_eq!(groups.len(), 3);
        // First-encounter order, not sorted.
        assert_eq!(groups[0].key, "X");
        assert_eq!(groups[0].entry_indices, vec![0, 2, 5]);
        assert_eq!(groups[1].key, "Y");
        assert_eq!(groups[1].entry_indices, vec![1, 4]);
        assert_eq!(groups[2].key, UNGROUPED_KEY);
        assert_eq!(groups[2].entry_indices, vec![3]);

        // Exact partition: every entry in exactly one group.
        let total: usize = groups.iter().map(|g| g.entry_indices.len()).sum();
        assert_eq!(total, entries.len());
    }

    #[test]
    fn test_respects_filtered_view() {
        let entries = vec![
            make_entry(1, Some("X"), None),
            make_entry(2, Some("X"), None),
            make_entry(3, None, None),
        ];
        // Filtered view dropped index 1.
        let groups = group_entries(&entries, &[0, 2]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].entry_indices, vec![0]);
        assert_eq!(groups[1].key, UNGROUPED_KEY);
    }

    #[test]
    fn test_group_order_is_subsequence_of_input() {
        let entries = vec![
            make_entry(1, Some("B"), None),
            make_entry(2, Some("A"), None),
            make_entry(3, Some("B"), None),
        ];
        let groups = group_all(&entries);
        assert_eq!(groups[0].key, "B");
        assert_eq!(groups[1].key, "A");
        for group in &groups {
            let mut sorted = group.entry_indices.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, group.entry_indices, "within-group order preserved");
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(group_all(&[]).is_empty());
    }
}
