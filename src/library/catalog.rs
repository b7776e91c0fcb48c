//! Catalog store backed by a delimited text file.
//!
//! The whole catalog lives in memory and is rewritten in full after every
//! mutation:
//!
//! ```text
//! ID,Type,Title,Author,Availability,Extra
//! 1,Book,T,A,true,200
//! 2,Audiobook,Dune,Herbert,false,21h
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::file;
use crate::core::ErrorLog;
use crate::domain::{CatalogItem, ItemFormat, ItemId, ItemKind};
use crate::error::LibraryError;

/// First line of the catalog file
pub const CATALOG_HEADER: &str = "ID,Type,Title,Author,Availability,Extra";

const FIELD_COUNT: usize = 6;

/// In-memory catalog with full-file persistence
#[derive(Debug)]
pub struct CatalogStore {
    /// Path to the catalog file
    path: PathBuf,

    /// Items in file order
    items: Vec<CatalogItem>,

    error_log: ErrorLog,
}

impl CatalogStore {
    /// Create an empty store; call [`CatalogStore::load`] to read the file
    pub fn new(path: impl Into<PathBuf>, error_log: ErrorLog) -> Self {
        Self {
            path: path.into(),
            items: Vec::new(),
            error_log,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog from disk, replacing whatever is in memory.
    ///
    /// Stops at the first malformed row: the rows before it stay loaded and
    /// the failure is logged and returned. A missing file is an empty catalog.
    pub async fn load(&mut self) -> Result<usize, LibraryError> {
        self.items.clear();

        let content = match file::read_optional(&self.path).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!("No catalog at {}, starting empty", self.path.display());
                return Ok(0);
            }
            Err(e) => {
                let err = LibraryError::io(&self.path, e);
                self.error_log
                    .record(&format!("Failed to load inventory: {}", err))
                    .await;
                return Err(err);
            }
        };

        // Line 1 is the header
        for (idx, line) in content.lines().enumerate().skip(1) {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            match parse_row(line) {
                Ok(Some(item)) => self.items.push(item),
                Ok(None) => warn!("Skipping row {} with unknown item type: {}", idx + 1, line),
                Err(reason) => {
                    let err = LibraryError::Parse {
                        path: self.path.clone(),
                        line: idx + 1,
                        reason,
                    };
                    self.error_log
                        .record(&format!("Failed to load inventory: {}", err))
                        .await;
                    return Err(err);
                }
            }
        }

        debug!("Loaded {} catalog items", self.items.len());
        Ok(self.items.len())
    }

    /// Overwrite the catalog file with the in-memory items
    pub async fn save(&self) -> Result<(), LibraryError> {
        let content = render(&self.items);

        if let Err(e) = file::write_replace(&self.path, &content).await {
            let err = LibraryError::io(&self.path, e);
            self.error_log
                .record(&format!("Failed to save inventory: {}", err))
                .await;
            return Err(err);
        }

        Ok(())
    }

    /// Append an item and persist. Duplicate ids are not checked here.
    pub async fn add(&mut self, item: CatalogItem) -> Result<(), LibraryError> {
        item.validate()?;
        self.items.push(item);

        if let Err(e) = self.save().await {
            self.items.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove every item with `id` and persist; returns how many went away
    pub async fn remove(&mut self, id: ItemId) -> Result<usize, LibraryError> {
        let before = self.items.clone();
        self.items.retain(|item| item.id != id);

        let removed = before.len() - self.items.len();
        if removed == 0 {
            return Ok(0);
        }

        if let Err(e) = self.save().await {
            self.items = before;
            return Err(e);
        }
        Ok(removed)
    }

    /// Get an item by ID
    pub fn find(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Flip the first item with `id` whose flag is `from` to `to`, in memory.
    ///
    /// Returns the position of the flipped item, or `None` if no copy with
    /// that id is in the `from` state.
    pub fn set_available_where(&mut self, id: ItemId, from: bool, to: bool) -> Option<usize> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id && item.available == from)?;
        self.items[index].available = to;
        Some(index)
    }

    /// Set the flag of the item at `index`; returns false if out of range
    pub fn set_available_at(&mut self, index: usize, available: bool) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.available = available;
                true
            }
            None => false,
        }
    }

    /// All items in file order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Serialize one item as a catalog row (no trailing newline)
pub fn to_row(item: &CatalogItem) -> String {
    format!(
        "{},{},{},{},{},{}",
        item.id,
        item.kind(),
        item.title,
        item.author,
        item.available,
        item.extra()
    )
}

fn render(items: &[CatalogItem]) -> String {
    let mut out = String::with_capacity(CATALOG_HEADER.len() + 1 + items.len() * 48);
    out.push_str(CATALOG_HEADER);
    out.push('\n');
    for item in items {
        out.push_str(&to_row(item));
        out.push('\n');
    }
    out
}

/// Parse a catalog row. `Ok(None)` means the Type column is not one we know.
pub fn parse_row(line: &str) -> Result<Option<CatalogItem>, String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(format!(
            "expected {} fields, found {}",
            FIELD_COUNT,
            fields.len()
        ));
    }

    let id: ItemId = fields[0]
        .parse()
        .map_err(|_| format!("invalid id {:?}", fields[0]))?;

    let kind = match fields[1].parse::<ItemKind>() {
        Ok(kind) if kind.as_str() == fields[1] => kind,
        _ => return Ok(None),
    };

    let available = parse_bool(fields[4])
        .ok_or_else(|| format!("invalid availability {:?}", fields[4]))?;

    let extra = fields[5];
    let format = match kind {
        ItemKind::Book => ItemFormat::Book {
            page_count: extra
                .trim()
                .parse()
                .map_err(|_| format!("invalid page count {:?}", extra))?,
        },
        ItemKind::Audiobook => ItemFormat::Audiobook {
            duration: extra.to_string(),
        },
        ItemKind::EMagazine => ItemFormat::EMagazine {
            issue_number: extra.to_string(),
        },
    };

    Ok(Some(CatalogItem {
        id,
        title: fields[2].to_string(),
        author: fields[3].to_string(),
        available,
        format,
    }))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
