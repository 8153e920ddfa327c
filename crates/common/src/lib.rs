//! ZenPosture Common Utilities
//!
//! Shared infrastructure for all ZenPosture crates:
//! - Error types and result aliases
//! - Monotonic clock and periodic schedules for the monitor loop
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
