// TerraLens - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no CLI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Log level
// =============================================================================

/// Normalised log levels, ordered from most to least severe.
///
/// Terraform emits lower-case level strings (`error`, `warn`, ...); anything
/// unrecognised maps to `Unknown` rather than failing, so exhaustiveness
/// checks stay available while tolerating upstream surprises.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    #[default]
    Unknown,
}

impl LogLevel {
    /// Returns all variants in display order (most severe first).
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
            LogLevel::Unknown,
        ]
    }

    /// Parse a raw level string. Never fails; unrecognised values become
    /// `Unknown` (closed-but-extensible set).
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "error" | "err" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Unknown,
        }
    }

    /// Parse a filter query value. Empty strings and the "all" sentinel mean
    /// "no filter" and return `None`, so the skip rule lives in the type.
    pub fn parse_filter(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(crate::util::constants::FILTER_ALL) {
            return None;
        }
        Some(Self::from_raw(trimmed))
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
            LogLevel::Unknown => "unknown",
        }
    }

    /// Short label for compact display (e.g. report columns).
    pub fn short_label(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DBG",
            LogLevel::Trace => "TRC",
            LogLevel::Unknown => "???",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Operation
// =============================================================================

/// The Terraform operation an entry belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Plan,
    Apply,
    Validate,
    #[default]
    Unknown,
}

impl Operation {
    /// Returns all variants in display order.
    pub fn all() -> &'static [Operation] {
        &[
            Operation::Plan,
            Operation::Apply,
            Operation::Validate,
            Operation::Unknown,
        ]
    }

    /// Parse a raw operation string. Unrecognised values become `Unknown`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "plan" => Operation::Plan,
            "apply" => Operation::Apply,
            "validate" => Operation::Validate,
            _ => Operation::Unknown,
        }
    }

    /// Parse a filter query value ("all"/empty = no filter).
    pub fn parse_filter(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(crate::util::constants::FILTER_ALL) {
            return None;
        }
        Some(Self::from_raw(trimmed))
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Plan => "plan",
            Operation::Apply => "apply",
            Operation::Validate => "validate",
            Operation::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Open-schema attribute values
// =============================================================================

/// A value in an entry's open-schema attribute map.
///
/// The key set is discovered per entry, not fixed; Terraform attaches
/// arbitrary `tf_*` and provider fields. Modelled explicitly (rather than as
/// dynamic property access) so "field may be absent" stays visible in the
/// type system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Nested arrays/objects the open schema may carry.
    Nested(serde_json::Value),
}

impl AttrValue {
    /// Side-effect-free textual conversion used by the filter engine.
    /// `Null` stringifies to the empty string so an explicit null behaves
    /// like an absent field.
    pub fn as_text(&self) -> String {
        match self {
            AttrValue::Null => String::new(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Number(n) => {
                // Integral numbers render without a trailing ".0" so filters
                // written against JSON integers match.
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            AttrValue::Text(s) => s.clone(),
            AttrValue::Nested(v) => v.to_string(),
        }
    }

    /// Convert an arbitrary JSON value into an attribute value.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttrValue::Null,
            serde_json::Value::Bool(b) => AttrValue::Bool(b),
            serde_json::Value::Number(n) => AttrValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => AttrValue::Text(s),
            other => AttrValue::Nested(other),
        }
    }
}

// =============================================================================
// Structured blocks
// =============================================================================

/// Arbitrary nested data attached to an entry (HTTP request/response bodies
/// and similar payloads Terraform embeds in trace logs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredBlock {
    /// Which field the payload came from (e.g. "tf_http_req_body").
    pub kind: String,

    /// True when the payload could not be decoded as JSON and is carried
    /// as the raw value instead.
    #[serde(default)]
    pub is_raw: bool,

    /// The payload itself.
    pub payload: serde_json::Value,
}

// =============================================================================
// Log entry (normalised output of the entry store adapter)
// =============================================================================

/// A single normalised execution-log entry.
///
/// This is the core data unit that flows through filtering, correlation,
/// statistics, and export. Immutable once created, except for the `read`
/// flag which the consumer may toggle; the engine preserves it and only ever
/// consults it for the include-read filter clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Opaque unique ID, stable for the entry's lifetime.
    pub id: String,

    /// Absolute instant the entry was emitted.
    pub timestamp: DateTime<Utc>,

    /// Normalised log level.
    pub level: LogLevel,

    /// Terraform operation this entry belongs to.
    pub operation: Operation,

    /// Full message text.
    pub message: String,

    /// Correlation identifier (Terraform `tf_req_id`). The primary grouping
    /// key; one request id spans a request/response lifecycle.
    pub request_id: Option<String>,

    /// Transport-level identifier (Terraform `tf_http_trans_id`), used as
    /// the fallback grouping key when no request id is present.
    pub transaction_id: Option<String>,

    /// RPC method name (`tf_rpc`).
    pub rpc_name: Option<String>,

    /// Resource type the entry concerns (`tf_resource_type`).
    pub resource_type: Option<String>,

    /// Open-schema attributes: every raw field not mapped to one of the
    /// well-known fields above lands here, keys discovered per entry.
    #[serde(default)]
    pub attributes: HashMap<String, AttrValue>,

    /// Ordered structured payloads attached to the entry.
    #[serde(default)]
    pub blocks: Vec<StructuredBlock>,

    /// Consumer-toggled read flag. Out-of-core concern; tolerated and
    /// preserved through every derived view.
    #[serde(default)]
    pub read: bool,
}

// =============================================================================
// Filter spec
// =============================================================================

/// A single user-defined dynamic field filter: attribute key (or well-known
/// field name) and a substring to match against its stringified value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    /// An inert filter (empty field or empty value) matches everything and
    /// must never exclude an entry.
    pub fn is_inert(&self) -> bool {
        self.field.trim().is_empty() || self.value.is_empty()
    }
}

/// Complete filter state, rebuilt per query. All active clauses are
/// AND-combined when applied.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// Operation to match exactly. `None` = no filter (unset or "all").
    pub operation: Option<Operation>,

    /// Level to match exactly. `None` = no filter.
    pub level: Option<LogLevel>,

    /// Case-insensitive substring matched against message OR rpc name.
    /// Empty = no filter.
    pub search_text: String,

    /// When false, entries marked read are excluded. When true (the
    /// default), nothing is excluded on the read flag.
    pub include_read: bool,

    /// User-defined dynamic field filters; an entry must satisfy all of
    /// them. Inert filters are skipped.
    pub dynamic: Vec<FieldFilter>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            operation: None,
            level: None,
            search_text: String::new(),
            include_read: true,
            dynamic: Vec::new(),
        }
    }
}

impl FilterSpec {
    /// Returns true if no clause can exclude anything.
    pub fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.level.is_none()
            && self.search_text.is_empty()
            && self.include_read
            && self.dynamic.iter().all(FieldFilter::is_inert)
    }
}

// =============================================================================
// Correlation group
// =============================================================================

/// One correlation group: entries sharing a request (or transport) id,
/// representing a logical operation's request/response lifecycle.
///
/// Holds indices into the source entry slice rather than clones, the same
/// borrowed-view shape the filter engine produces. Groups are a derived
/// view, recomputed in full whenever the source or filter result changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationGroup {
    /// The resolved group key: request id, transaction id, or "ungrouped".
    pub key: String,

    /// Indices of member entries, in input order.
    pub entry_indices: Vec<usize>,
}

// =============================================================================
// Timeline types
// =============================================================================

/// A single operation's time span, rendered as a bar on a shared axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSegment {
    /// Stable segment identifier.
    pub id: String,

    /// Display name, e.g. "apply - aws_instance".
    pub task: String,

    /// Operation kind label ("plan", "apply", ...).
    pub kind: String,

    /// Span start.
    pub start: DateTime<Utc>,

    /// Span end.
    pub end: DateTime<Utc>,

    /// Supplied duration in seconds. Trusted for labels; bar geometry is
    /// always derived from start/end instead.
    pub duration_secs: f64,

    /// Number of log entries the segment aggregates.
    pub entry_count: usize,

    /// Distinct resource types touched, first-seen order.
    pub resources: Vec<String>,
}

/// Shared time scale computed once per segment collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineScale {
    /// Smallest start/end instant across all segments.
    pub min: DateTime<Utc>,

    /// Largest start/end instant across all segments.
    pub max: DateTime<Utc>,

    /// `max - min` in seconds, floored to 1.0 when zero so position maths
    /// never divides by zero.
    pub range_secs: f64,
}

/// A segment with its normalised geometry on the shared scale.
#[derive(Debug, Clone, Serialize)]
pub struct PositionedSegment {
    pub segment: TimelineSegment,

    /// Left edge as a percentage of the scale, 0..=100 for in-scale spans.
    pub left_percent: f64,

    /// Bar width as a percentage of the scale, floored to keep every
    /// segment visible.
    pub width_percent: f64,
}

/// Complete timeline layout: the scale, positioned segments in input order,
/// and the number of raw segments excluded for unparseable time values.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineLayout {
    pub scale: TimelineScale,
    pub positioned: Vec<PositionedSegment>,
    pub skipped: usize,
}

// =============================================================================
// Quality score
// =============================================================================

/// Letter grade derived from the quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Grade::A => 'A',
            Grade::B => 'B',
            Grade::C => 'C',
            Grade::D => 'D',
            Grade::F => 'F',
        };
        write!(f, "{c}")
    }
}

/// How the score was computed, for display alongside the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub base: u32,
    pub error_penalty: u32,
    pub warning_penalty: u32,
    pub error_count: u32,
    pub warning_count: u32,
    pub total_entries: u32,
}

/// Derived 0-100 health metric with grade and recommendations.
/// Stateless; recomputed on every statistics update.
#[derive(Debug, Clone, Serialize)]
pub struct QualityScore {
    pub score: u8,
    pub grade: Grade,
    pub breakdown: ScoreBreakdown,
    pub recommendations: Vec<String>,
}

// =============================================================================
// Aggregate statistics
// =============================================================================

/// One-pass aggregate counts over a collection of entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogStats {
    /// Total entries counted.
    pub total_entries: usize,

    /// Entries by level.
    pub levels: HashMap<LogLevel, usize>,

    /// Entries by operation.
    pub operations: HashMap<Operation, usize>,

    /// Entries by resource type (entries without one are not counted here).
    pub resource_types: HashMap<String, usize>,

    /// Entries by RPC method.
    pub rpc_methods: HashMap<String, usize>,

    /// Total structured blocks attached across all entries.
    pub block_count: usize,
}

impl LogStats {
    /// Entries at error level.
    pub fn error_count(&self) -> usize {
        self.levels.get(&LogLevel::Error).copied().unwrap_or(0)
    }

    /// Entries at warn level.
    pub fn warning_count(&self) -> usize {
        self.levels.get(&LogLevel::Warn).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_raw_tolerates_unknown() {
        assert_eq!(LogLevel::from_raw("ERROR"), LogLevel::Error);
        assert_eq!(LogLevel::from_raw("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from_raw("verbose"), LogLevel::Unknown);
        assert_eq!(LogLevel::from_raw(""), LogLevel::Unknown);
    }

    #[test]
    fn test_parse_filter_all_sentinel() {
        assert_eq!(LogLevel::parse_filter("all"), None);
        assert_eq!(LogLevel::parse_filter(""), None);
        assert_eq!(LogLevel::parse_filter("error"), Some(LogLevel::Error));
        assert_eq!(Operation::parse_filter("ALL"), None);
        assert_eq!(Operation::parse_filter("apply"), Some(Operation::Apply));
        // Unrecognised filter values still filter (to Unknown), they are not
        // silently dropped.
        assert_eq!(Operation::parse_filter("destroy"), Some(Operation::Unknown));
    }

    #[test]
    fn test_attr_value_as_text() {
        assert_eq!(AttrValue::Null.as_text(), "");
        assert_eq!(AttrValue::Bool(true).as_text(), "true");
        assert_eq!(AttrValue::Number(3.0).as_text(), "3");
        assert_eq!(AttrValue::Number(3.5).as_text(), "3.5");
        assert_eq!(AttrValue::Text("x".into()).as_text(), "x");
    }

    #[test]
    fn test_filter_spec_default_is_empty() {
        let spec = FilterSpec::default();
        assert!(spec.is_empty());

        let spec = FilterSpec {
            dynamic: vec![FieldFilter {
                field: String::new(),
                value: "something".into(),
            }],
            ..Default::default()
        };
        assert!(spec.is_empty(), "inert dynamic filter keeps spec empty");

        let spec = FilterSpec {
            include_read: false,
            ..Default::default()
        };
        assert!(!spec.is_empty());
    }
}
