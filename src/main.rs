// TerraLens - main.rs
//
// CLI entry point. Handles:
// 1. CLI argument parsing
// 2. Logging initialisation (debug mode support)
// 3. Configuration loading
// 4. Driving the engine pipeline and rendering text reports

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use terralens::core::model::{FieldFilter, FilterSpec, LogEntry, LogLevel, Operation};
use terralens::core::timeline::RawSegmentRecord;
use terralens::core::{adapter, correlate, export, filter, score, stats, timeline};
use terralens::platform::config::{AppConfig, PlatformPaths};
use terralens::util;
use terralens::util::error::{InputError, Result, TerraLensError};

/// Width in characters of the rendered timeline axis.
const GANTT_COLS: usize = 60;

/// Which report to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum View {
    /// Filtered entry rows.
    #[default]
    Entries,
    /// Correlation groups keyed by request id.
    Groups,
    /// Gantt-style timeline of operation segments.
    Timeline,
    /// Quality score and statistics.
    Score,
}

/// TerraLens - Terraform execution-log correlation and timeline analysis.
///
/// Point TerraLens at a structured Terraform trace-log export (JSON array or
/// JSON lines) to filter, correlate, and analyse it from the terminal.
#[derive(Parser, Debug)]
#[command(name = "TerraLens", version, about)]
struct Cli {
    /// Input file of raw log records (JSON array or JSON lines).
    entries: PathBuf,

    /// Report to render.
    #[arg(short = 'v', long = "view", value_enum, default_value = "entries")]
    view: View,

    /// Filter by operation (plan, apply, validate; "all" disables).
    #[arg(short = 'o', long = "operation")]
    operation: Option<String>,

    /// Filter by level (error, warn, info, debug, trace; "all" disables).
    #[arg(short = 'l', long = "level")]
    level: Option<String>,

    /// Case-insensitive substring search over message and RPC name.
    #[arg(short = 's', long = "search", default_value = "")]
    search: String,

    /// Exclude entries already marked read.
    #[arg(long = "hide-read")]
    hide_read: bool,

    /// Dynamic field filter as field=value; repeatable, all must match.
    #[arg(short = 'f', long = "filter")]
    fields: Vec<String>,

    /// Independently-sourced segment file for the timeline view
    /// (derived from correlated entries when omitted).
    #[arg(long = "segments")]
    segments: Option<PathBuf>,

    /// Write the filtered entries to this path (.csv or .json).
    #[arg(short = 'e', long = "export")]
    export: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config must load before logging so the configured level can apply,
    // but config loading itself may want to log; resolve with defaults on
    // failure and surface the error after logging is up.
    let paths = PlatformPaths::resolve();
    let config_result = AppConfig::load(&paths.config_file());
    let config = config_result.as_ref().ok().cloned().unwrap_or_default();

    util::logging::init(cli.debug, config.logging.level.as_deref());

    if let Err(e) = &config_result {
        tracing::error!(error = %e, "Invalid configuration");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        input = %cli.entries.display(),
        "TerraLens starting"
    );

    if let Err(e) = run(&cli, &config) {
        tracing::error!(error = %e, "Run failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    let entries = load_entries(&cli.entries)?;
    let spec = build_spec(cli, config);
    let indices = filter::apply_filters(&entries, &spec);

    tracing::info!(
        total = entries.len(),
        matched = indices.len(),
        "Filter applied"
    );

    match cli.view {
        View::Entries => render_entries(&entries, &indices),
        View::Groups => render_groups(&entries, &indices),
        View::Timeline => render_timeline(cli, &entries, &indices)?,
        View::Score => render_score(&entries, &indices),
    }

    if let Some(ref path) = cli.export {
        let written = write_export(&entries, &indices, path, config.export.max_entries)?;
        tracing::info!(path = %path.display(), written, "Export complete");
        eprintln!("Exported {written} entries to {}", path.display());
    }

    Ok(())
}

/// Build the filter spec from CLI flags and config defaults.
fn build_spec(cli: &Cli, config: &AppConfig) -> FilterSpec {
    let dynamic = cli
        .fields
        .iter()
        .map(|raw| match raw.split_once('=') {
            Some((field, value)) => FieldFilter {
                field: field.to_string(),
                value: value.to_string(),
            },
            None => {
                tracing::warn!(filter = %raw, "Ignoring malformed --filter (expected field=value)");
                FieldFilter::default()
            }
        })
        .collect();

    FilterSpec {
        operation: cli.operation.as_deref().and_then(Operation::parse_filter),
        level: cli.level.as_deref().and_then(LogLevel::parse_filter),
        search_text: cli.search.clone(),
        include_read: if cli.hide_read {
            false
        } else {
            config.filter.include_read
        },
        dynamic,
    }
}

/// Read and normalise the raw record file.
fn load_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let raw = std::fs::read_to_string(path).map_err(|e| InputError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let records = decode_records(&raw, path)?;
    let record_count = records.len();
    let (entries, skipped) = adapter::normalize(records);

    if skipped > 0 {
        tracing::warn!(skipped, "Records excluded by validation");
    }
    if entries.is_empty() && record_count > 0 {
        return Err(InputError::NoUsableRecords {
            path: path.to_path_buf(),
            skipped,
        }
        .into());
    }

    Ok(entries)
}

/// Decode a JSON array or JSON-lines file of values.
fn decode_records<T: serde::de::DeserializeOwned>(
    raw: &str,
    path: &Path,
) -> Result<Vec<T>> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw).map_err(|e| {
            InputError::JsonDecode {
                path: path.to_path_buf(),
                source: e,
            }
            .into()
        });
    }

    let mut records = Vec::new();
    let mut first_error: Option<serde_json::Error> = None;
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!(error = %e, "Undecodable line skipped");
                first_error.get_or_insert(e);
            }
        }
    }

    if records.is_empty() {
        if let Some(source) = first_error {
            return Err(InputError::JsonDecode {
                path: path.to_path_buf(),
                source,
            }
            .into());
        }
    }
    Ok(records)
}

// =============================================================================
// Report rendering
// =============================================================================

fn render_entries(entries: &[LogEntry], indices: &[usize]) {
    if indices.is_empty() {
        println!("No entries match the current filters.");
        return;
    }
    for &idx in indices {
        let Some(entry) = entries.get(idx) else {
            continue;
        };
        println!(
            "[{:<4}] {} | {:>12} | {}",
            entry.level.short_label(),
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.request_id.as_deref().unwrap_or("-"),
            entry.message.lines().next().unwrap_or(&entry.message),
        );
    }
}

fn render_groups(entries: &[LogEntry], indices: &[usize]) {
    let groups = correlate::group_entries(entries, indices);
    if groups.is_empty() {
        println!("No entries match the current filters.");
        return;
    }
    for group in &groups {
        println!("{} ({} entries)", group.key, group.entry_indices.len());
        for &idx in &group.entry_indices {
            let Some(entry) = entries.get(idx) else {
                continue;
            };
            println!(
                "  [{:<4}] {} | {}",
                entry.level.short_label(),
                entry.timestamp.format("%H:%M:%S%.3f"),
                entry.message.lines().next().unwrap_or(&entry.message),
            );
        }
    }
}

fn render_timeline(cli: &Cli, entries: &[LogEntry], indices: &[usize]) -> Result<()> {
    let layout = match cli.segments {
        Some(ref path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| InputError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            let records: Vec<RawSegmentRecord> = decode_records(&raw, path)?;
            timeline::layout(&records)
        }
        None => timeline::layout_segments(timeline::build_segments(entries, indices)),
    };

    if layout.skipped > 0 {
        tracing::warn!(skipped = layout.skipped, "Segments excluded from layout");
        eprintln!("Warning: {} segments skipped (bad time values)", layout.skipped);
    }
    if layout.positioned.is_empty() {
        println!("No segments to lay out.");
        return Ok(());
    }

    println!(
        "Timeline {} .. {} (span {})",
        layout.scale.min.format("%H:%M:%S"),
        layout.scale.max.format("%H:%M:%S"),
        timeline::format_duration(layout.scale.range_secs),
    );

    let task_width = layout
        .positioned
        .iter()
        .map(|p| p.segment.task.chars().count().min(32))
        .max()
        .unwrap_or(0);

    for positioned in &layout.positioned {
        let offset =
            ((positioned.left_percent / 100.0) * GANTT_COLS as f64).round() as usize;
        let width = (((positioned.width_percent / 100.0) * GANTT_COLS as f64).round() as usize)
            .max(1);
        let offset = offset.min(GANTT_COLS);
        let width = width.min(GANTT_COLS - offset).max(1);

        let mut bar = String::with_capacity(GANTT_COLS);
        bar.push_str(&" ".repeat(offset));
        bar.push_str(&"#".repeat(width));

        let task: String = positioned.segment.task.chars().take(32).collect();

        println!(
            "{:<tw$} |{:<cols$}| {}",
            task,
            bar,
            timeline::format_duration(positioned.segment.duration_secs),
            tw = task_width,
            cols = GANTT_COLS,
        );
    }
    Ok(())
}

fn render_score(entries: &[LogEntry], indices: &[usize]) {
    let stats = stats::collect(entries, indices);
    let quality = score::score_stats(&stats);

    println!("Quality score: {} (grade {})", quality.score, quality.grade);
    println!(
        "  base {} - {} (errors: {}) - {} (warnings: {}) over {} entries",
        quality.breakdown.base,
        quality.breakdown.error_penalty,
        quality.breakdown.error_count,
        quality.breakdown.warning_penalty,
        quality.breakdown.warning_count,
        quality.breakdown.total_entries,
    );
    println!("Recommendations:");
    for recommendation in &quality.recommendations {
        println!("  - {recommendation}");
    }

    println!("Levels:");
    for level in LogLevel::all() {
        if let Some(count) = stats.levels.get(level) {
            println!("  {:<8} {count}", level.label());
        }
    }
    println!("Operations:");
    for operation in Operation::all() {
        if let Some(count) = stats.operations.get(operation) {
            println!("  {:<8} {count}", operation.label());
        }
    }
}

/// Write the filtered view to disk, format chosen by extension.
fn write_export(
    entries: &[LogEntry],
    indices: &[usize],
    path: &Path,
    max_entries: usize,
) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|e| TerraLensError::Io {
        path: path.to_path_buf(),
        operation: "create export file",
        source: e,
    })?;
    let writer = std::io::BufWriter::new(file);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    let written = match extension.as_deref() {
        Some("csv") => export::export_csv(entries, indices, writer, path, max_entries)?,
        Some("json") => export::export_json(entries, indices, writer, path, max_entries)?,
        _ => {
            return Err(terralens::util::error::ExportError::UnknownFormat {
                path: path.to_path_buf(),
            }
            .into())
        }
    };
    Ok(written)
}
