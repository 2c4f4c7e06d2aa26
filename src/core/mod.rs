// TerraLens - core/mod.rs
//
// Core engine layer: adapter, filtering, correlation, timeline layout,
// statistics, scoring, and export.
// Dependencies: standard library, serde, chrono.
// Must NOT depend on: platform, the CLI, or any I/O beyond Write trait objects.

pub mod adapter;
pub mod correlate;
pub mod export;
pub mod filter;
pub mod model;
pub mod score;
pub mod stats;
pub mod timeline;
