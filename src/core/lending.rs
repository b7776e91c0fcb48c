//! Lending service: the catalog store and the loan ledger behind one API.
//!
//! Borrow and return each touch both files, catalog first. The pair is not
//! atomic: if the ledger write fails after the catalog write, the files
//! disagree until fixed by hand.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::domain::{CatalogItem, DueLoan, ItemId, LoanRecord, OverdueLoan};
use crate::error::LibraryError;
use crate::library::{CatalogStore, LoanLedger};

/// Admin-side checks that are off unless configured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LendingPolicy {
    /// Refuse to add an item whose id is already in the catalog
    #[serde(default)]
    pub reject_duplicate_ids: bool,

    /// Refuse to remove an item that is currently out on loan
    #[serde(default)]
    pub protect_borrowed_items: bool,
}

/// Library with catalog and loan ledger
#[derive(Debug)]
pub struct Library {
    catalog: CatalogStore,
    ledger: LoanLedger,
    policy: LendingPolicy,
}

impl Library {
    pub fn new(catalog: CatalogStore, ledger: LoanLedger, policy: LendingPolicy) -> Self {
        Self {
            catalog,
            ledger,
            policy,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn ledger(&self) -> &LoanLedger {
        &self.ledger
    }

    pub fn policy(&self) -> LendingPolicy {
        self.policy
    }

    /// All catalog items in file order
    pub fn inventory(&self) -> &[CatalogItem] {
        self.catalog.items()
    }

    pub fn find(&self, id: ItemId) -> Option<&CatalogItem> {
        self.catalog.find(id)
    }

    /// Add an item to the catalog
    #[instrument(skip(self, item), fields(item_id = %item.id, kind = %item.kind()))]
    pub async fn add_item(&mut self, item: CatalogItem) -> Result<(), LibraryError> {
        if self.policy.reject_duplicate_ids && self.catalog.find(item.id).is_some() {
            return Err(LibraryError::DuplicateItem { id: item.id });
        }

        self.catalog.add(item).await?;
        info!("Item added");
        Ok(())
    }

    /// Remove every item with `id`; returns how many were removed
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, id: ItemId) -> Result<usize, LibraryError> {
        if self.policy.protect_borrowed_items
            && self.catalog.items().iter().any(|i| i.id == id && !i.available)
        {
            return Err(LibraryError::ItemOnLoan { id });
        }

        let removed = self.catalog.remove(id).await?;
        if removed == 0 {
            info!("Nothing to remove");
        } else {
            info!(removed, "Item removed");
        }
        Ok(removed)
    }

    /// Lend an available item to `user_id`
    #[instrument(skip(self), fields(item_id = %item_id, user_id = %user_id, today = %today))]
    pub async fn borrow(
        &mut self,
        item_id: ItemId,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<LoanRecord, LibraryError> {
        crate::domain::item::check_field("user id", user_id)?;
        let Some(index) = self.catalog.set_available_where(item_id, true, false) else {
            return Err(LibraryError::ItemUnavailable { id: item_id });
        };

        if let Err(e) = self.catalog.save().await {
            self.catalog.set_available_at(index, true);
            return Err(e);
        }

        let record = self.ledger.record_borrow(user_id, item_id, today).await?;
        info!(due = %record.due_date, "Item borrowed");
        Ok(record)
    }

    /// Take back a borrowed item.
    ///
    /// Returns the ledger record that was closed, or `None` if the ledger had
    /// no active loan for the item (the catalog flag is still restored).
    #[instrument(skip(self), fields(item_id = %item_id, today = %today))]
    pub async fn return_item(
        &mut self,
        item_id: ItemId,
        today: NaiveDate,
    ) -> Result<Option<LoanRecord>, LibraryError> {
        let Some(index) = self.catalog.set_available_where(item_id, false, true) else {
            return Err(LibraryError::InvalidReturn { id: item_id });
        };

        if let Err(e) = self.catalog.save().await {
            self.catalog.set_available_at(index, false);
            return Err(e);
        }

        let closed = self.ledger.record_return(item_id).await?;
        match &closed {
            Some(record) => info!(user_id = %record.user_id, "Item returned"),
            None => warn!("Item returned but the ledger had no active loan for it"),
        }
        Ok(closed)
    }

    /// Active loans past their due date
    pub async fn overdue(&self, today: NaiveDate) -> Result<Vec<OverdueLoan>, LibraryError> {
        self.ledger.list_overdue(today).await
    }

    /// Active loans held by `user_id`
    pub async fn due_for_user(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<DueLoan>, LibraryError> {
        self.ledger.list_due_for_user(user_id, today).await
    }

    /// Playback description for an audiobook
    pub fn play(&self, id: ItemId) -> Result<String, LibraryError> {
        let item = self
            .catalog
            .find(id)
            .ok_or(LibraryError::ItemNotFound { id })?;

        item.as_audiobook()
            .map(|audiobook| audiobook.play())
            .ok_or(LibraryError::NotAudiobook { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorLog;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn library_in(temp: &TempDir, policy: LendingPolicy) -> Library {
        let log = ErrorLog::new(temp.path().join("errors.log"));
        Library::new(
            CatalogStore::new(temp.path().join("inventory.txt"), log.clone()),
            LoanLedger::new(temp.path().join("borrowed.txt"), log),
            policy,
        )
    }

    #[tokio::test]
    async fn test_borrow_missing_item_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let mut library = library_in(&temp, LendingPolicy::default());

        let err = library
            .borrow(ItemId::new(1), "U1", date(2024, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::ItemUnavailable { .. }));
        assert!(!err.is_file_failure());
        assert!(!temp.path().join("errors.log").exists());
    }

    #[tokio::test]
    async fn test_borrow_twice_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let mut library = library_in(&temp, LendingPolicy::default());
        library
            .add_item(CatalogItem::book(1, "T", "A", 200))
            .await
            .unwrap();

        library
            .borrow(ItemId::new(1), "U1", date(2024, 1, 1))
            .await
            .unwrap();
        let err = library
            .borrow(ItemId::new(1), "U2", date(2024, 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::ItemUnavailable { .. }));

        let records = library.ledger().records().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_ids_allowed_by_default() {
        let temp = TempDir::new().unwrap();
        let mut library = library_in(&temp, LendingPolicy::default());

        library.add_item(CatalogItem::book(1, "A", "X", 1)).await.unwrap();
        library.add_item(CatalogItem::book(1, "B", "Y", 2)).await.unwrap();
        assert_eq!(library.inventory().len(), 2);
    }

    #[tokio::test]
    async fn test_strict_policy() {
        let temp = TempDir::new().unwrap();
        let policy = LendingPolicy {
            reject_duplicate_ids: true,
            protect_borrowed_items: true,
        };
        let mut library = library_in(&temp, policy);

        library.add_item(CatalogItem::book(1, "A", "X", 1)).await.unwrap();
        let err = library
            .add_item(CatalogItem::book(1, "B", "Y", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateItem { .. }));

        library
            .borrow(ItemId::new(1), "U1", date(2024, 1, 1))
            .await
            .unwrap();
        let err = library.remove_item(ItemId::new(1)).await.unwrap_err();
        assert!(matches!(err, LibraryError::ItemOnLoan { .. }));

        library
            .return_item(ItemId::new(1), date(2024, 1, 3))
            .await
            .unwrap();
        assert_eq!(library.remove_item(ItemId::new(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_borrowed_item_allowed_by_default() {
        let temp = TempDir::new().unwrap();
        let mut library = library_in(&temp, LendingPolicy::default());

        library.add_item(CatalogItem::book(1, "A", "X", 1)).await.unwrap();
        library
            .borrow(ItemId::new(1), "U1", date(2024, 1, 1))
            .await
            .unwrap();
        assert_eq!(library.remove_item(ItemId::new(1)).await.unwrap(), 1);

        // The loan stays in the ledger
        let overdue = library.overdue(date(2024, 2, 1)).await.unwrap();
        assert_eq!(overdue.len(), 1);
    }

    #[tokio::test]
    async fn test_play() {
        let temp = TempDir::new().unwrap();
        let mut library = library_in(&temp, LendingPolicy::default());

        library
            .add_item(CatalogItem::audiobook(2, "Dune", "Herbert", "21h"))
            .await
            .unwrap();
        library
            .add_item(CatalogItem::book(3, "Dune", "Herbert", 412))
            .await
            .unwrap();

        assert_eq!(
            library.play(ItemId::new(2)).unwrap(),
            "Playing audiobook: Dune by Herbert (21h)"
        );
        assert!(matches!(
            library.play(ItemId::new(3)),
            Err(LibraryError::NotAudiobook { .. })
        ));
        assert!(matches!(
            library.play(ItemId::new(4)),
            Err(LibraryError::ItemNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_add_is_rolled_back() {
        let temp = TempDir::new().unwrap();
        let log = ErrorLog::new(temp.path().join("errors.log"));

        // The catalog path is a directory, so every save fails
        let catalog_dir = temp.path().join("inventory.txt");
        std::fs::create_dir_all(&catalog_dir).unwrap();

        let mut catalog = CatalogStore::new(&catalog_dir, log.clone());
        assert!(catalog.add(CatalogItem::book(1, "T", "A", 1)).await.is_err());
        assert!(catalog.is_empty());

        let log_content = std::fs::read_to_string(temp.path().join("errors.log")).unwrap();
        assert!(log_content.contains("Failed to save inventory"));
    }

    /// Swap the catalog file for a directory so the next save fails
    fn break_catalog_file(temp: &TempDir) {
        let path = temp.path().join("inventory.txt");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir_all(&path).unwrap();
    }

    #[tokio::test]
    async fn test_borrow_picks_available_copy_of_duplicate_id() {
        let temp = TempDir::new().unwrap();
        let mut library = library_in(&temp, LendingPolicy::default());
        library.add_item(CatalogItem::book(1, "T", "A", 10)).await.unwrap();
        library.add_item(CatalogItem::book(1, "T", "A", 10)).await.unwrap();

        library.borrow(ItemId::new(1), "U1", date(2024, 1, 1)).await.unwrap();
        library.borrow(ItemId::new(1), "U2", date(2024, 1, 1)).await.unwrap();
        assert!(library.inventory().iter().all(|item| !item.available));

        let err = library
            .borrow(ItemId::new(1), "U3", date(2024, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::ItemUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_return_picks_lent_copy_of_duplicate_id() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("inventory.txt"),
            "ID,Type,Title,Author,Availability,Extra\n\
             1,Book,T,A,true,10\n\
             1,Book,T,A,false,10\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("borrowed.txt"),
            "U1,1,2024-01-01,2024-01-08,ACTIVE\n",
        )
        .unwrap();

        let mut library = library_in(&temp, LendingPolicy::default());
        library.catalog.load().await.unwrap();

        let closed = library
            .return_item(ItemId::new(1), date(2024, 1, 3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.user_id, "U1");
        assert!(library.inventory().iter().all(|item| item.available));

        let content = std::fs::read_to_string(temp.path().join("inventory.txt")).unwrap();
        assert!(content.ends_with("1,Book,T,A,true,10\n1,Book,T,A,true,10\n"));
    }

    #[tokio::test]
    async fn test_failed_save_reverts_borrow() {
        let temp = TempDir::new().unwrap();
        let mut library = library_in(&temp, LendingPolicy::default());
        library.add_item(CatalogItem::book(1, "T", "A", 10)).await.unwrap();
        break_catalog_file(&temp);

        let err = library
            .borrow(ItemId::new(1), "U1", date(2024, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Io { .. }));
        assert!(library.find(ItemId::new(1)).unwrap().available);
        assert!(!temp.path().join("borrowed.txt").exists());

        let log_content = std::fs::read_to_string(temp.path().join("errors.log")).unwrap();
        assert!(log_content.contains("Failed to save inventory"));
    }

    #[tokio::test]
    async fn test_failed_save_reverts_return() {
        let temp = TempDir::new().unwrap();
        let mut library = library_in(&temp, LendingPolicy::default());
        library.add_item(CatalogItem::book(1, "T", "A", 10)).await.unwrap();
        library.borrow(ItemId::new(1), "U1", date(2024, 1, 1)).await.unwrap();
        break_catalog_file(&temp);

        let err = library
            .return_item(ItemId::new(1), date(2024, 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Io { .. }));
        assert!(!library.find(ItemId::new(1)).unwrap().available);

        let ledger = std::fs::read_to_string(temp.path().join("borrowed.txt")).unwrap();
        assert_eq!(ledger, "U1,1,2024-01-01,2024-01-08,ACTIVE\n");

        let log_content = std::fs::read_to_string(temp.path().join("errors.log")).unwrap();
        assert!(log_content.contains("Failed to save inventory"));
    }
}
