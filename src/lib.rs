//! libranet - library catalog and lending manager
//!
//! Tracks books, audiobooks and e-magazines, lends them out for a fixed
//! seven-day period, and keeps everything in two delimited text files.
//!
//! # Architecture
//!
//! - The catalog is held in memory and rewritten in full on every change
//! - The loan ledger is appended on borrow and re-read on every query
//! - Returning an item flips its ledger row from ACTIVE to RETURNED
//!
//! # Modules
//!
//! - `domain`: Data structures (CatalogItem, LoanRecord)
//! - `library`: File-backed stores (CatalogStore, LoanLedger)
//! - `core`: Lending service and error log
//! - `config`: Path and policy configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! libranet add book --id 1 --title "Dune" --author "Herbert" --pages 412
//! libranet borrow 1
//! libranet due
//! libranet --today 2024-02-01 overdue
//! libranet return 1
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod library;

// Re-export main types at crate root for convenience
pub use core::{ErrorLog, LendingPolicy, Library};
pub use domain::{CatalogItem, ItemFormat, ItemId, ItemKind, LoanRecord, LoanStatus};
pub use error::LibraryError;
pub use library::{CatalogStore, LoanLedger};
