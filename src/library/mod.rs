//! File-backed persistence for the catalog and the loan ledger.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.libranet/
//! ├── inventory.txt     # Catalog: header + one row per item
//! ├── borrowed.txt      # Ledger: one row per loan, no header
//! └── errors.log        # Append-only failure log
//! ```

pub mod catalog;
pub mod file;
pub mod ledger;

pub use catalog::{CatalogStore, CATALOG_HEADER};
pub use ledger::LoanLedger;
