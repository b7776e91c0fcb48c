//! Loan records kept in the ledger.
//!
//! A record is written once on borrow and flipped to `Returned` on return;
//! records are never deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::item::ItemId;

/// Fixed lending period, in calendar days
pub const LOAN_PERIOD_DAYS: u64 = 7;

/// Date format used in the ledger file (ISO-8601)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Status column of a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Returned => "RETURNED",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "ACTIVE" => Ok(LoanStatus::Active),
            "RETURNED" => Ok(LoanStatus::Returned),
            _ => anyhow::bail!("Unknown loan status: {}", s),
        }
    }
}

/// One borrow event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub user_id: String,
    pub item_id: ItemId,
    pub borrow_date: NaiveDate,
    /// Always `borrow_date + LOAN_PERIOD_DAYS`
    pub due_date: NaiveDate,
    pub status: LoanStatus,
}

impl LoanRecord {
    /// Create an active loan starting on `borrow_date`
    pub fn new(user_id: impl Into<String>, item_id: ItemId, borrow_date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            item_id,
            borrow_date,
            due_date: due_date_for(borrow_date),
            status: LoanStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// Signed number of days from `today` until the due date
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }

    /// Active and strictly past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.due_date < today
    }
}

/// Due date for a loan borrowed on `borrow_date`
pub fn due_date_for(borrow_date: NaiveDate) -> NaiveDate {
    borrow_date
        .checked_add_days(Days::new(LOAN_PERIOD_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// An active loan past its due date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueLoan {
    pub record: LoanRecord,
    /// `today - due_date`, at least 1
    pub days_overdue: i64,
}

/// Where a user's active loan stands relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStanding {
    /// Due today (0) or in the future
    DueIn { days: i64 },
    OverdueSince { due_date: NaiveDate },
}

impl fmt::Display for DueStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueStanding::DueIn { days: 1 } => f.write_str("due in 1 day"),
            DueStanding::DueIn { days } => write!(f, "due in {} days", days),
            DueStanding::OverdueSince { due_date } => write!(f, "overdue since {}", due_date),
        }
    }
}

/// An active loan for a particular user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueLoan {
    pub record: LoanRecord,
    pub standing: DueStanding,
}

impl DueLoan {
    pub fn evaluate(record: LoanRecord, today: NaiveDate) -> Self {
        let days = record.days_until_due(today);
        let standing = if days >= 0 {
            DueStanding::DueIn { days }
        } else {
            DueStanding::OverdueSince {
                due_date: record.due_date,
            }
        };
        Self { record, standing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_date_is_seven_days_later() {
        let record = LoanRecord::new("U1", ItemId::new(42), date(2024, 1, 1));
        assert_eq!(record.due_date, date(2024, 1, 8));
        assert_eq!(record.status, LoanStatus::Active);
    }

    #[test]
    fn test_due_date_crosses_month_and_leap_day() {
        assert_eq!(due_date_for(date(2024, 2, 25)), date(2024, 3, 3));
        assert_eq!(due_date_for(date(2023, 12, 28)), date(2024, 1, 4));
    }

    #[test]
    fn test_overdue_is_strict() {
        let record = LoanRecord::new("U1", ItemId::new(1), date(2024, 1, 1));
        assert!(!record.is_overdue(date(2024, 1, 8)));
        assert!(record.is_overdue(date(2024, 1, 9)));

        let mut returned = record.clone();
        returned.status = LoanStatus::Returned;
        assert!(!returned.is_overdue(date(2024, 2, 1)));
    }

    #[test]
    fn test_due_standing() {
        let record = LoanRecord::new("U1", ItemId::new(1), date(2024, 1, 1));

        let due = DueLoan::evaluate(record.clone(), date(2024, 1, 5));
        assert_eq!(due.standing, DueStanding::DueIn { days: 3 });
        assert_eq!(due.standing.to_string(), "due in 3 days");

        let due = DueLoan::evaluate(record.clone(), date(2024, 1, 7));
        assert_eq!(due.standing.to_string(), "due in 1 day");

        let due = DueLoan::evaluate(record.clone(), date(2024, 1, 8));
        assert_eq!(due.standing, DueStanding::DueIn { days: 0 });
        assert_eq!(due.standing.to_string(), "due in 0 days");

        let due = DueLoan::evaluate(record, date(2024, 1, 10));
        assert_eq!(
            due.standing,
            DueStanding::OverdueSince {
                due_date: date(2024, 1, 8)
            }
        );
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("ACTIVE".parse::<LoanStatus>().unwrap(), LoanStatus::Active);
        assert_eq!("RETURNED".parse::<LoanStatus>().unwrap(), LoanStatus::Returned);
        assert!("active".parse::<LoanStatus>().is_err());
    }
}
