//! Domain types for libranet.
//!
//! This module contains the core data structures:
//! - Items: Books, audiobooks and e-magazines in the catalog
//! - Loans: Ledger records and the due/overdue views derived from them

pub mod item;
pub mod loan;

// Re-export commonly used types
pub use item::{Audiobook, CatalogItem, ItemFormat, ItemId, ItemKind};
pub use loan::{DueLoan, DueStanding, LoanRecord, LoanStatus, OverdueLoan, LOAN_PERIOD_DAYS};
