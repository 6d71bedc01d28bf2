//! LanternWave - Adventure Codex pipeline
//!
//! Imports published adventures as shared template campaigns, resolves the
//! name references between their entities, and clones complete templates
//! into tenant-owned campaigns.

pub mod config;
pub mod core;
pub mod database;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
