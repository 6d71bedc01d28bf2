//! Crate test suite
//!
//! - `common`: database fixtures and seed helpers
//! - `database`: campaign and content row operations
//! - `codex`: cloning, relationship resolution and ingestion against a real
//!   SQLite database
//! - `property`: proptest invariants

mod common;
mod codex;
mod property;
