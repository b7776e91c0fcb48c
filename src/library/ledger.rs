//! Loan ledger backed by a delimited text file.
//!
//! One row per borrow event, no header, in insertion order:
//!
//! ```text
//! U1,1,2024-01-01,2024-01-08,ACTIVE
//! ```
//!
//! Borrowing appends a row. Returning rewrites the file with the first
//! matching ACTIVE row flipped to RETURNED. Queries re-read the file every
//! time.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::file;
use crate::core::ErrorLog;
use crate::domain::item::check_field;
use crate::domain::loan::DATE_FORMAT;
use crate::domain::{DueLoan, ItemId, LoanRecord, LoanStatus, OverdueLoan};
use crate::error::LibraryError;

const FIELD_COUNT: usize = 5;

/// File-backed loan ledger
#[derive(Debug, Clone)]
pub struct LoanLedger {
    /// Path to the ledger file
    path: PathBuf,

    error_log: ErrorLog,
}

impl LoanLedger {
    pub fn new(path: impl Into<PathBuf>, error_log: ErrorLog) -> Self {
        Self {
            path: path.into(),
            error_log,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an ACTIVE loan due `LOAN_PERIOD_DAYS` after `today`
    pub async fn record_borrow(
        &self,
        user_id: &str,
        item_id: ItemId,
        today: NaiveDate,
    ) -> Result<LoanRecord, LibraryError> {
        check_field("user id", user_id)?;

        let record = LoanRecord::new(user_id, item_id, today);
        let line = format!("{}\n", to_row(&record));

        if let Err(e) = self.append(&line).await {
            let err = LibraryError::io(&self.path, e);
            self.error_log
                .record(&format!("Failed to save borrowed: {}", err))
                .await;
            return Err(err);
        }

        debug!("Recorded loan of item {} to {}", item_id, user_id);
        Ok(record)
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// Flip the first ACTIVE row for `item_id` to RETURNED.
    ///
    /// Returns the updated record, or `None` (file untouched) when there is
    /// no active loan for the item. Rows that do not parse are kept verbatim.
    pub async fn record_return(&self, item_id: ItemId) -> Result<Option<LoanRecord>, LibraryError> {
        let Some(content) = self.read("Failed to update borrowed").await? else {
            return Ok(None);
        };

        let mut lines: Vec<String> = content
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();

        let mut returned = None;
        for line in lines.iter_mut() {
            if let Ok(mut record) = parse_row(line) {
                if record.item_id == item_id && record.is_active() {
                    record.status = LoanStatus::Returned;
                    *line = to_row(&record);
                    returned = Some(record);
                    break;
                }
            }
        }

        let Some(record) = returned else {
            return Ok(None);
        };

        let mut out = lines.join("\n");
        out.push('\n');

        if let Err(e) = file::write_replace(&self.path, &out).await {
            let err = LibraryError::io(&self.path, e);
            self.error_log
                .record(&format!("Failed to update borrowed: {}", err))
                .await;
            return Err(err);
        }

        debug!("Marked loan of item {} as returned", item_id);
        Ok(Some(record))
    }

    /// Every parseable record, in file order.
    ///
    /// Malformed rows are written to the error log and skipped.
    pub async fn records(&self) -> Result<Vec<LoanRecord>, LibraryError> {
        let Some(content) = self.read("Failed to read borrowed").await? else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            match parse_row(line) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    let err = LibraryError::Parse {
                        path: self.path.clone(),
                        line: idx + 1,
                        reason,
                    };
                    self.error_log
                        .record(&format!("Skipping ledger row: {}", err))
                        .await;
                }
            }
        }

        Ok(records)
    }

    /// ACTIVE loans whose due date is strictly before `today`
    pub async fn list_overdue(&self, today: NaiveDate) -> Result<Vec<OverdueLoan>, LibraryError> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .filter(|r| r.is_overdue(today))
            .map(|record| OverdueLoan {
                days_overdue: (today - record.due_date).num_days(),
                record,
            })
            .collect())
    }

    /// ACTIVE loans held by `user_id`, with their standing relative to `today`
    pub async fn list_due_for_user(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<DueLoan>, LibraryError> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .filter(|r| r.user_id == user_id && r.is_active())
            .map(|record| DueLoan::evaluate(record, today))
            .collect())
    }

    async fn read(&self, context: &str) -> Result<Option<String>, LibraryError> {
        match file::read_optional(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) => {
                let err = LibraryError::io(&self.path, e);
                self.error_log.record(&format!("{}: {}", context, err)).await;
                Err(err)
            }
        }
    }
}

/// Serialize a record as a ledger row (no trailing newline)
pub fn to_row(record: &LoanRecord) -> String {
    format!(
        "{},{},{},{},{}",
        record.user_id,
        record.item_id,
        record.borrow_date.format(DATE_FORMAT),
        record.due_date.format(DATE_FORMAT),
        record.status
    )
}

/// Parse a ledger row
pub fn parse_row(line: &str) -> Result<LoanRecord, String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(format!(
            "expected {} fields, found {}",
            FIELD_COUNT,
            fields.len()
        ));
    }

    let item_id: ItemId = fields[1]
        .parse()
        .map_err(|_| format!("invalid item id {:?}", fields[1]))?;
    let borrow_date = parse_date(fields[2])?;
    let due_date = parse_date(fields[3])?;
    let status: LoanStatus = fields[4].parse().map_err(|e: anyhow::Error| e.to_string())?;

    Ok(LoanRecord {
        user_id: fields[0].to_string(),
        item_id,
        borrow_date,
        due_date,
        status,
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format!("invalid date {:?}: {}", s, e))
}
