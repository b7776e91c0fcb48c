//! Core lending logic.
//!
//! This module contains:
//! - Library: Borrow/return orchestration and admin operations
//! - ErrorLog: Append-only log of file-level failures

pub mod error_log;
pub mod lending;

// Re-export commonly used types
pub use error_log::ErrorLog;
pub use lending::{LendingPolicy, Library};
