// TerraLens - core/adapter.rs
//
// Entry store adapter: normalises raw upstream record collections into the
// engine's entity shape. Pure mapping plus validation, no logic beyond that.
//
// The raw shape is Terraform's structured trace-log record (`@timestamp`,
// `@level`, `tf_req_id`, ...). Records that fail validation are excluded and
// counted, never fatal: a single bad record must not sink the batch.

use crate::core::model::{AttrValue, LogEntry, LogLevel, Operation, StructuredBlock};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Raw field names whose payloads are lifted out of the attribute map into
/// ordered structured blocks. Terraform embeds HTTP bodies under the first
/// two; the rest appear in provider-side logs.
const BLOCK_FIELDS: &[&str] = &[
    "tf_http_req_body",
    "tf_http_res_body",
    "body",
    "request",
    "response",
];

/// Fallback timestamp formats tried after RFC 3339, interpreted as UTC.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A raw upstream log record as deserialised from JSON.
///
/// Well-known fields are named; everything else is swept into `extra` so the
/// open schema survives normalisation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntryRecord {
    /// Upstream-assigned id, synthesised when absent.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "@timestamp", alias = "timestamp", default)]
    pub timestamp: Option<String>,

    #[serde(rename = "@level", alias = "level", default)]
    pub level: Option<String>,

    #[serde(rename = "@message", alias = "message", default)]
    pub message: Option<String>,

    /// Explicit operation tag, when the upstream store already classified
    /// the record. Otherwise derived from the RPC name.
    #[serde(default)]
    pub operation: Option<String>,

    #[serde(default)]
    pub tf_req_id: Option<String>,

    #[serde(default)]
    pub tf_http_trans_id: Option<String>,

    #[serde(default)]
    pub tf_rpc: Option<String>,

    #[serde(default)]
    pub tf_resource_type: Option<String>,

    /// Pre-extracted structured blocks, when the upstream store supplies
    /// them directly.
    #[serde(default)]
    pub json_blocks: Vec<RawBlock>,

    #[serde(default)]
    pub read: bool,

    /// Every unrecognised key lands here (open schema).
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A pre-extracted structured block in the upstream shape.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,

    #[serde(default, alias = "is_raw")]
    pub raw: bool,

    #[serde(alias = "payload", default)]
    pub data: serde_json::Value,
}

/// Normalise a batch of raw records into engine entries.
///
/// Returns the normalised entries and the number of records excluded by
/// validation (missing/unparseable timestamp, duplicate id). Order is
/// preserved for the records that survive.
pub fn normalize(records: Vec<RawEntryRecord>) -> (Vec<LogEntry>, usize) {
    let mut entries = Vec::with_capacity(records.len());
    let mut seen_ids: HashSet<String> = HashSet::with_capacity(records.len());
    let mut skipped = 0usize;

    for (ordinal, record) in records.into_iter().enumerate() {
        let Some(timestamp) = record.timestamp.as_deref().and_then(parse_timestamp) else {
            tracing::debug!(ordinal, "Record skipped: missing or unparseable timestamp");
            skipped += 1;
            continue;
        };

        let id = match record.id {
            Some(ref id) if !id.is_empty() => id.clone(),
            _ => format!("{}-{ordinal}", timestamp.timestamp_millis()),
        };
        if !seen_ids.insert(id.clone()) {
            tracing::debug!(ordinal, id = %id, "Record skipped: duplicate id");
            skipped += 1;
            continue;
        }

        entries.push(build_entry(id, timestamp, record));
    }

    (entries, skipped)
}

/// Map a validated raw record onto the engine entry shape.
fn build_entry(id: String, timestamp: DateTime<Utc>, record: RawEntryRecord) -> LogEntry {
    let level = record
        .level
        .as_deref()
        .map(LogLevel::from_raw)
        .unwrap_or_default();

    let operation = match record.operation.as_deref() {
        Some(raw) => Operation::from_raw(raw),
        None => operation_from_rpc(record.tf_rpc.as_deref()),
    };

    let mut blocks: Vec<StructuredBlock> = record
        .json_blocks
        .into_iter()
        .map(|b| StructuredBlock {
            kind: b.kind,
            is_raw: b.raw,
            payload: b.data,
        })
        .collect();

    let mut attributes = HashMap::with_capacity(record.extra.len());
    let mut extra = record.extra;
    for &field in BLOCK_FIELDS {
        if let Some(value) = extra.remove(field) {
            blocks.push(lift_block(field, value));
        }
    }
    for (key, value) in extra {
        attributes.insert(key, AttrValue::from_json(value));
    }

    LogEntry {
        id,
        timestamp,
        level,
        operation,
        message: record.message.unwrap_or_default(),
        request_id: non_empty(record.tf_req_id),
        transaction_id: non_empty(record.tf_http_trans_id),
        rpc_name: non_empty(record.tf_rpc),
        resource_type: non_empty(record.tf_resource_type),
        attributes,
        blocks,
        read: record.read,
    }
}

/// Classify an entry by its RPC method when no explicit operation tag is
/// present. Schema and validation RPCs both fall under the validate phase.
fn operation_from_rpc(rpc: Option<&str>) -> Operation {
    match rpc {
        Some("PlanResourceChange") => Operation::Plan,
        Some("ApplyResourceChange") => Operation::Apply,
        Some(
            "GetProviderSchema"
            | "ValidateProviderConfig"
            | "ValidateResourceConfig"
            | "ValidateDataResourceConfig",
        ) => Operation::Validate,
        _ => Operation::Unknown,
    }
}

/// Lift an embedded body field into a structured block. String payloads are
/// decoded as JSON where possible; undecodable ones are kept raw.
fn lift_block(field: &str, value: serde_json::Value) -> StructuredBlock {
    match value {
        serde_json::Value::String(s) => match serde_json::from_str(&s) {
            Ok(decoded) => StructuredBlock {
                kind: field.to_string(),
                is_raw: false,
                payload: decoded,
            },
            Err(_) => StructuredBlock {
                kind: field.to_string(),
                is_raw: true,
                payload: serde_json::Value::String(s),
            },
        },
        other => StructuredBlock {
            kind: field.to_string(),
            is_raw: false,
            payload: other,
        },
    }
}

/// Parse an upstream timestamp string to an absolute instant.
/// RFC 3339 first, then the tolerated naive formats (assumed UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Empty strings normalise to `None` so every downstream "if present and
/// non-empty" check collapses to `is_some()`.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
