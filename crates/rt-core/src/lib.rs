//! rusty-threads/crates/rt-core/src/lib.rs
//!
//! The central domain logic and interface definitions for rusty-threads.

pub mod error;
pub mod models;
pub mod services;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
