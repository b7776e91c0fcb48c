//! Command-line interface for libranet.
//!
//! Provides admin commands (inventory, add, remove, overdue) and user
//! commands (borrow, return, due, play).

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::config::{self, ResolvedConfig};
use crate::core::{ErrorLog, Library};
use crate::domain::{CatalogItem, ItemId};
use crate::error::LibraryError;
use crate::library::{CatalogStore, LoanLedger};

/// libranet - library catalog and lending manager
#[derive(Parser, Debug)]
#[command(name = "libranet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Date to use as "today" (YYYY-MM-DD); defaults to the local date
    #[arg(long, global = true, env = "LIBRANET_TODAY")]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every item in the catalog
    #[command(alias = "catalog")]
    Inventory,

    /// Add an item to the catalog
    Add {
        #[command(subcommand)]
        item: AddItem,
    },

    /// Remove every catalog item with the given ID
    Remove {
        /// Item ID
        id: ItemId,
    },

    /// Borrow an item for 7 days
    Borrow {
        /// Item ID
        id: ItemId,

        /// Borrowing user (defaults to the configured user)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Return a borrowed item
    Return {
        /// Item ID
        id: ItemId,
    },

    /// List active loans past their due date
    Overdue,

    /// List a user's active loans and when they are due
    Due {
        /// User (defaults to the configured user)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Play an audiobook
    Play {
        /// Item ID
        id: ItemId,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Item to add, one variant per item type
#[derive(Subcommand, Debug)]
pub enum AddItem {
    /// Add a book
    Book {
        #[arg(long)]
        id: ItemId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// Number of pages
        #[arg(long, allow_negative_numbers = true)]
        pages: i32,
    },

    /// Add an audiobook
    Audiobook {
        #[arg(long)]
        id: ItemId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// Running time, e.g. 15h30m
        #[arg(long)]
        duration: String,
    },

    /// Add an e-magazine
    #[command(name = "emagazine", alias = "e-magazine")]
    EMagazine {
        #[arg(long)]
        id: ItemId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// Issue number
        #[arg(long)]
        issue: String,
    },
}

impl From<AddItem> for CatalogItem {
    fn from(item: AddItem) -> Self {
        match item {
            AddItem::Book {
                id,
                title,
                author,
                pages,
            } => CatalogItem::book(id, title, author, pages),
            AddItem::Audiobook {
                id,
                title,
                author,
                duration,
            } => CatalogItem::audiobook(id, title, author, duration),
            AddItem::EMagazine {
                id,
                title,
                author,
                issue,
            } => CatalogItem::emagazine(id, title, author, issue),
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());

        match self.command {
            Commands::Inventory => {
                show_inventory(&open_library(cfg).await);
                Ok(())
            }
            Commands::Add { item } => add_item(&mut open_library(cfg).await, item.into()).await,
            Commands::Remove { id } => remove_item(&mut open_library(cfg).await, id).await,
            Commands::Borrow { id, user } => {
                let user = user.unwrap_or_else(|| cfg.default_user.clone());
                borrow_item(&mut open_library(cfg).await, id, &user, today).await
            }
            Commands::Return { id } => return_item(&mut open_library(cfg).await, id, today).await,
            Commands::Overdue => show_overdue(&open_library(cfg).await, today).await,
            Commands::Due { user } => {
                let user = user.unwrap_or_else(|| cfg.default_user.clone());
                show_due(&open_library(cfg).await, &user, today).await
            }
            Commands::Play { id } => play_item(&open_library(cfg).await, id),
            Commands::Config => {
                show_config(cfg);
                Ok(())
            }
        }
    }
}

/// Build the library from configuration; a partially loaded catalog is
/// reported but not fatal
pub async fn open_library(cfg: &ResolvedConfig) -> Library {
    let error_log = ErrorLog::new(&cfg.error_log_path);

    let mut catalog = CatalogStore::new(&cfg.catalog_path, error_log.clone());
    if let Err(e) = catalog.load().await {
        eprintln!(
            "[WARN] Catalog loaded partially ({} items): {}",
            catalog.len(),
            e
        );
    }

    let ledger = LoanLedger::new(&cfg.ledger_path, error_log);
    Library::new(catalog, ledger, cfg.policy)
}

/// Print user-facing conditions as warnings, propagate everything else
fn report(result: Result<(), LibraryError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if !e.is_file_failure() => {
            eprintln!("[WARN] {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max - 3).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

fn show_inventory(library: &Library) {
    let items = library.inventory();

    if items.is_empty() {
        println!("Catalog is empty. Use 'libranet add' to add items.");
        return;
    }

    println!(
        "{:<6} {:<10} {:<30} {:<20} {:<10} {:<10}",
        "ID", "TYPE", "TITLE", "AUTHOR", "AVAILABLE", "EXTRA"
    );
    println!("{}", "-".repeat(91));

    for item in items {
        println!(
            "{:<6} {:<10} {:<30} {:<20} {:<10} {:<10}",
            item.id.to_string(),
            item.kind().to_string(),
            truncate(&item.title, 30),
            truncate(&item.author, 20),
            if item.available { "yes" } else { "no" },
            item.extra()
        );
    }

    println!("\nTotal: {} items", items.len());
}

async fn add_item(library: &mut Library, item: CatalogItem) -> Result<()> {
    let id = item.id;
    report(library.add_item(item).await.map(|()| {
        println!("[INFO] Item {} added successfully.", id);
    }))
}

async fn remove_item(library: &mut Library, id: ItemId) -> Result<()> {
    report(library.remove_item(id).await.map(|removed| {
        if removed == 0 {
            println!("[INFO] No item with ID {}.", id);
        } else {
            println!("[INFO] Item {} removed successfully.", id);
        }
    }))
}

async fn borrow_item(library: &mut Library, id: ItemId, user: &str, today: NaiveDate) -> Result<()> {
    report(library.borrow(id, user, today).await.map(|record| {
        println!(
            "[INFO] Borrowed successfully. Due in {} days ({}).",
            crate::domain::LOAN_PERIOD_DAYS,
            record.due_date
        );
    }))
}

async fn return_item(library: &mut Library, id: ItemId, today: NaiveDate) -> Result<()> {
    report(library.return_item(id, today).await.map(|_| {
        println!("[INFO] Returned successfully.");
    }))
}

async fn show_overdue(library: &Library, today: NaiveDate) -> Result<()> {
    let overdue = library.overdue(today).await?;

    if overdue.is_empty() {
        println!("No overdue items as of {}.", today);
        return Ok(());
    }

    println!("{:<8} {:<12} {:<12} {:<6}", "ITEM", "USER", "DUE", "DAYS");
    println!("{}", "-".repeat(41));
    for loan in &overdue {
        println!(
            "{:<8} {:<12} {:<12} {:<6}",
            loan.record.item_id.to_string(),
            loan.record.user_id,
            loan.record.due_date.to_string(),
            loan.days_overdue
        );
    }

    Ok(())
}

async fn show_due(library: &Library, user: &str, today: NaiveDate) -> Result<()> {
    let due = library.due_for_user(user, today).await?;

    if due.is_empty() {
        println!("{} has no active loans.", user);
        return Ok(());
    }

    for loan in &due {
        let level = match loan.standing {
            crate::domain::DueStanding::DueIn { .. } => "INFO",
            crate::domain::DueStanding::OverdueSince { .. } => "WARN",
        };
        println!(
            "[{}] ItemID: {} | {} ({})",
            level, loan.record.item_id, loan.standing, loan.record.due_date
        );
    }

    Ok(())
}

fn play_item(library: &Library, id: ItemId) -> Result<()> {
    report(library.play(id).map(|line| {
        println!("[INFO] {}", line);
    }))
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) {
    println!("LibraNet Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:      {}", cfg.home.display());
    println!("  Catalog:   {}", cfg.catalog_path.display());
    println!("  Ledger:    {}", cfg.ledger_path.display());
    println!("  Error log: {}", cfg.error_log_path.display());
    println!();
    println!("Lending:");
    println!("  Default user:           {}", cfg.default_user);
    println!("  Loan period:            {} days", crate::domain::LOAN_PERIOD_DAYS);
    println!("  Reject duplicate IDs:   {}", cfg.policy.reject_duplicate_ids);
    println!("  Protect borrowed items: {}", cfg.policy.protect_borrowed_items);
}
