// TerraLens - core/timeline.rs
//
// Timeline layout engine: places operation segments on a shared time axis
// as normalised geometry (position and width as percentages of the scale).
// Also derives segments from correlated entries when no independently
// sourced segment collection exists, and formats durations for display.
//
// The layout itself never filters and never sorts; both are the caller's
// concern. Raw segments with unparseable time values are excluded and
// counted rather than aborting the whole computation.

use crate::core::adapter::parse_timestamp;
use crate::core::model::{
    LogEntry, Operation, PositionedSegment, TimelineLayout, TimelineScale, TimelineSegment,
};
use crate::util::constants::{
    MIN_SCALE_RANGE_SECS, MIN_SEGMENT_DURATION_SECS, MIN_WIDTH_PERCENT, TIME_BUCKET_GAP_SECS,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A raw segment record as supplied by an upstream collaborator, with time
/// values still in string form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSegmentRecord {
    pub id: String,

    #[serde(default)]
    pub task: String,

    #[serde(rename = "type", alias = "kind", default)]
    pub kind: String,

    pub start: String,

    pub end: String,

    #[serde(alias = "duration_secs", default)]
    pub duration: f64,

    #[serde(default)]
    pub entry_count: usize,

    #[serde(default)]
    pub resources: Vec<String>,
}

/// Compute the shared scale and per-segment geometry for a collection of
/// raw segments.
///
/// Records whose start or end does not parse to an absolute instant are
/// excluded and reported in `TimelineLayout::skipped`; a single bad segment
/// must not blank the entire timeline. Surviving segments keep their input
/// order.
pub fn layout(records: &[RawSegmentRecord]) -> TimelineLayout {
    let mut segments = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        match (
            parse_timestamp(&record.start),
            parse_timestamp(&record.end),
        ) {
            (Some(start), Some(end)) => segments.push(TimelineSegment {
                id: record.id.clone(),
                task: record.task.clone(),
                kind: record.kind.clone(),
                start,
                end,
                duration_secs: record.duration,
                entry_count: record.entry_count,
                resources: record.resources.clone(),
            }),
            _ => {
                tracing::debug!(id = %record.id, "Segment skipped: unparseable time values");
                skipped += 1;
            }
        }
    }

    let mut result = layout_segments(segments);
    result.skipped = skipped;
    result
}

/// Layout over already-parsed segments (e.g. derived via `build_segments`).
pub fn layout_segments(segments: Vec<TimelineSegment>) -> TimelineLayout {
    let scale = compute_scale(&segments);

    let positioned = segments
        .into_iter()
        .map(|segment| {
            let left_percent =
                span_secs(scale.min, segment.start) / scale.range_secs * 100.0;
            let width_percent = (span_secs(segment.start, segment.end) / scale.range_secs
                * 100.0)
                .max(MIN_WIDTH_PERCENT);
            PositionedSegment {
                segment,
                left_percent,
                width_percent,
            }
        })
        .collect();

    TimelineLayout {
        scale,
        positioned,
        skipped: 0,
    }
}

/// Compute the shared time scale across a segment collection.
///
/// min/max range over both start and end instants, so a segment whose end
/// precedes another's start still lands inside the scale. The range is
/// floored to one second for single-instant or empty collections: a
/// degenerate layout (every bar at left 0), not an error.
fn compute_scale(segments: &[TimelineSegment]) -> TimelineScale {
    let instants = segments.iter().flat_map(|s| [s.start, s.end]);
    let min = instants.clone().min().unwrap_or(DateTime::UNIX_EPOCH);
    let max = instants.max().unwrap_or(DateTime::UNIX_EPOCH);

    TimelineScale {
        min,
        max,
        range_secs: span_secs(min, max).max(MIN_SCALE_RANGE_SECS),
    }
}

/// Signed span between two instants in fractional seconds.
fn span_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1_000.0
}

/// Format a duration in seconds for display.
///
/// Sub-second durations render as whole milliseconds, sub-minute as whole
/// seconds, and longer ones as minutes plus remainder seconds, each rounded
/// independently (not carried): 125.6 s renders as "2m 6s".
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{}ms", (secs * 1_000.0).round() as i64)
    } else if secs < 60.0 {
        format!("{}s", secs.round() as i64)
    } else {
        let minutes = (secs / 60.0).floor() as i64;
        let remainder = (secs - minutes as f64 * 60.0).round() as i64;
        format!("{minutes}m {remainder}s")
    }
}

// =============================================================================
// Segment derivation from correlated entries
// =============================================================================

/// Derive timeline segments from a (filtered) entry view.
///
/// Entries carrying a request id are grouped by (request id, operation);
/// each group becomes one segment spanning its min..max timestamps. When no
/// entry carries a request id at all, entries are bucketed by time gaps
/// instead so the timeline still shows activity phases. Derived segments
/// are sorted by start time; this is the derivation step, not the layout,
/// which lays out whatever order it is given.
pub fn build_segments(entries: &[LogEntry], indices: &[usize]) -> Vec<TimelineSegment> {
    // Insertion-ordered grouping by (request id, operation).
    let mut keys: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<&LogEntry>> = Vec::new();

    for &idx in indices {
        let Some(entry) = entries.get(idx) else {
            continue;
        };
        let Some(req_id) = entry.request_id.as_deref() else {
            continue;
        };
        let key = format!("{req_id}-{}", entry.operation);
        match keys.iter().position(|k| k == &key) {
            Some(pos) => groups[pos].push(entry),
            None => {
                keys.push(key);
                groups.push(vec![entry]);
            }
        }
    }

    let mut segments: Vec<TimelineSegment> = keys
        .into_iter()
        .zip(groups)
        .map(|(key, members)| segment_from_group(key, &members))
        .collect();

    if segments.is_empty() {
        segments = time_bucket_segments(entries, indices);
    }

    segments.sort_by_key(|s| s.start);
    segments
}

/// Build one segment from a correlated entry group.
fn segment_from_group(id: String, members: &[&LogEntry]) -> TimelineSegment {
    let start = members.iter().map(|e| e.timestamp).min().unwrap_or_default();
    let end = members.iter().map(|e| e.timestamp).max().unwrap_or_default();
    let kind = dominant_operation(members).label().to_string();

    let mut resources: Vec<String> = Vec::new();
    for entry in members {
        if let Some(resource) = entry.resource_type.as_deref() {
            if !resources.iter().any(|r| r == resource) {
                resources.push(resource.to_string());
            }
        }
    }

    let task = if resources.is_empty() {
        format!("{kind} - General")
    } else {
        format!("{kind} - {}", resources.join(", "))
    };

    TimelineSegment {
        id,
        task,
        kind,
        start,
        end,
        duration_secs: span_secs(start, end).max(MIN_SEGMENT_DURATION_SECS),
        entry_count: members.len(),
        resources,
    }
}

/// The most frequent non-Unknown operation in a group, `Unknown` when every
/// member is unclassified. Counting over the closed variant list keeps ties
/// deterministic (the later phase wins) instead of map-iteration-ordered.
fn dominant_operation(members: &[&LogEntry]) -> Operation {
    Operation::all()
        .iter()
        .filter(|op| **op != Operation::Unknown)
        .map(|op| (*op, members.iter().filter(|e| e.operation == *op).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(op, _)| op)
        .unwrap_or(Operation::Unknown)
}

/// Fallback grouping when no entry carries a request id: order by time and
/// start a new bucket whenever an entry falls more than the configured gap
/// after the bucket's start.
fn time_bucket_segments(entries: &[LogEntry], indices: &[usize]) -> Vec<TimelineSegment> {
    let mut ordered: Vec<&LogEntry> = indices
        .iter()
        .filter_map(|&idx| entries.get(idx))
        .collect();
    if ordered.is_empty() {
        return Vec::new();
    }
    ordered.sort_by_key(|e| e.timestamp);

    let mut buckets: Vec<Vec<&LogEntry>> = Vec::new();
    let mut current: Vec<&LogEntry> = Vec::new();
    let mut bucket_start = ordered[0].timestamp;

    for entry in ordered {
        if span_secs(bucket_start, entry.timestamp) > TIME_BUCKET_GAP_SECS && !current.is_empty()
        {
            buckets.push(std::mem::take(&mut current));
            bucket_start = entry.timestamp;
        }
        current.push(entry);
    }
    if !current.is_empty() {
        buckets.push(current);
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(i, members)| {
            let mut segment =
                segment_from_group(format!("time-group-{i}"), &members);
            segment.task = format!("{} - Time Group {}", segment.kind, i + 1);
            segment.resources.clear();
            segment
        })
        .collect()
}
