//! Property-based tests
//!
//! Invariants checked with proptest over generated inputs:
//!
//! - `normalize_props`: name keys are stable, case-insensitive and free of
//!   punctuation and stray whitespace
//! - `remap_props`: the id remapper is a per-kind bijection
//!
//! By default, proptest runs 256 cases per property. This can be configured
//! via the `PROPTEST_CASES` environment variable:
//!
//! ```sh
//! PROPTEST_CASES=1000 cargo test property --release
//! ```

mod remap_props;
