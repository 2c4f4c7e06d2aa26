// TerraLens - util/mod.rs
//
// Cross-cutting utilities: typed errors, named constants, logging setup.

pub mod constants;
pub mod error;
pub mod logging;
