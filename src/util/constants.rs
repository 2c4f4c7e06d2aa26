// TerraLens - util/constants.rs
//
// Single source of truth for all named constants, sentinels, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "TerraLens";

/// Application identifier used for config directories.
pub const APP_ID: &str = "TerraLens";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Filtering
// =============================================================================

/// Sentinel value meaning "no filter" for operation/level query parameters.
/// Parsed at the boundary into `None` so the engine never compares against it.
pub const FILTER_ALL: &str = "all";

// =============================================================================
// Correlation
// =============================================================================

/// Group key assigned to entries carrying neither a request id nor a
/// transaction id. A valid group like any other, not an error state.
pub const UNGROUPED_KEY: &str = "ungrouped";

// =============================================================================
// Timeline layout
// =============================================================================

/// Minimum bar width as a percentage of the full time scale. Guarantees
/// every segment stays visible and clickable no matter how short its
/// duration is relative to the whole run.
pub const MIN_WIDTH_PERCENT: f64 = 0.5;

/// Floor applied to the scale range (seconds) when all segments collapse to
/// a single instant. Avoids division by zero in position maths.
pub const MIN_SCALE_RANGE_SECS: f64 = 1.0;

/// Minimum duration (seconds) assigned to a derived segment so point-like
/// request groups still occupy a visible span.
pub const MIN_SEGMENT_DURATION_SECS: f64 = 1.0;

/// Gap (seconds) that starts a new time bucket when deriving segments from
/// entries that carry no request ids.
pub const TIME_BUCKET_GAP_SECS: f64 = 5.0;

// =============================================================================
// Quality scoring
// =============================================================================

/// Score deducted per error entry.
pub const ERROR_PENALTY: u32 = 10;

/// Score deducted per warning entry.
pub const WARNING_PENALTY: u32 = 2;

/// Inclusive lower score bounds for letter grades A, B, C, D.
/// Anything below the last threshold is an F.
pub const GRADE_THRESHOLDS: [(u8, char); 4] = [(90, 'A'), (80, 'B'), (70, 'C'), (60, 'D')];

// =============================================================================
// Export
// =============================================================================

/// Default maximum number of entries in a single export operation.
pub const DEFAULT_MAX_EXPORT_ENTRIES: usize = 1_000_000;

/// Minimum user-configurable export cap.
pub const MIN_MAX_EXPORT_ENTRIES: usize = 1_000;

/// Hard upper bound on the export cap (prevents configuration mistakes).
pub const ABSOLUTE_MAX_EXPORT_ENTRIES: usize = 5_000_000;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
