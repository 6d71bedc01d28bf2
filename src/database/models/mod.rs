//! Database Models
//!
//! Record types mapped to database rows.

mod core;


pub use self::core::*;
