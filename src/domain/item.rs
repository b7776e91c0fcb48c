//! Catalog item types.
//!
//! Every item shares an id, title, author and availability flag; the
//! format-specific detail lives in [`ItemFormat`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// Catalog item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(i64);

impl ItemId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw integer value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<i32> for ItemId {
    fn from(raw: i32) -> Self {
        Self(i64::from(raw))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

/// Kind of catalog item, as written in the Type column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Book,
    Audiobook,
    EMagazine,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Book => "Book",
            ItemKind::Audiobook => "Audiobook",
            ItemKind::EMagazine => "EMagazine",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "book" => Ok(ItemKind::Book),
            "audiobook" => Ok(ItemKind::Audiobook),
            "emagazine" | "e-magazine" => Ok(ItemKind::EMagazine),
            _ => anyhow::bail!("Unknown item type: {}", s),
        }
    }
}

/// Format-specific detail of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemFormat {
    Book { page_count: i32 },
    Audiobook { duration: String },
    EMagazine { issue_number: String },
}

impl ItemFormat {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemFormat::Book { .. } => ItemKind::Book,
            ItemFormat::Audiobook { .. } => ItemKind::Audiobook,
            ItemFormat::EMagazine { .. } => ItemKind::EMagazine,
        }
    }

    /// Value of the Extra column
    pub fn extra(&self) -> String {
        match self {
            ItemFormat::Book { page_count } => page_count.to_string(),
            ItemFormat::Audiobook { duration } => duration.clone(),
            ItemFormat::EMagazine { issue_number } => issue_number.clone(),
        }
    }
}

/// A lendable unit in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique catalog key
    pub id: ItemId,

    pub title: String,

    pub author: String,

    /// False while the item is out on loan
    pub available: bool,

    pub format: ItemFormat,
}

impl CatalogItem {
    /// Create an available book
    pub fn book(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        author: impl Into<String>,
        page_count: i32,
    ) -> Self {
        Self::with_format(id, title, author, ItemFormat::Book { page_count })
    }

    /// Create an available audiobook
    pub fn audiobook(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        author: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self::with_format(
            id,
            title,
            author,
            ItemFormat::Audiobook {
                duration: duration.into(),
            },
        )
    }

    /// Create an available e-magazine
    pub fn emagazine(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        author: impl Into<String>,
        issue_number: impl Into<String>,
    ) -> Self {
        Self::with_format(
            id,
            title,
            author,
            ItemFormat::EMagazine {
                issue_number: issue_number.into(),
            },
        )
    }

    fn with_format(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        author: impl Into<String>,
        format: ItemFormat,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            available: true,
            format,
        }
    }

    /// Mark availability (builder style)
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn kind(&self) -> ItemKind {
        self.format.kind()
    }

    pub fn extra(&self) -> String {
        self.format.extra()
    }

    /// Audiobook view of this item, if it is one
    pub fn as_audiobook(&self) -> Option<Audiobook<'_>> {
        match &self.format {
            ItemFormat::Audiobook { duration } => Some(Audiobook {
                item: self,
                duration,
            }),
            _ => None,
        }
    }

    /// Reject text values that would break the delimited row format
    pub fn validate(&self) -> Result<(), LibraryError> {
        check_field("title", &self.title)?;
        check_field("author", &self.author)?;
        match &self.format {
            ItemFormat::Book { .. } => Ok(()),
            ItemFormat::Audiobook { duration } => check_field("duration", duration),
            ItemFormat::EMagazine { issue_number } => check_field("issue number", issue_number),
        }
    }
}

/// Borrowed view over an audiobook entry
#[derive(Debug, Clone, Copy)]
pub struct Audiobook<'a> {
    item: &'a CatalogItem,
    duration: &'a str,
}

impl<'a> Audiobook<'a> {
    pub fn item(&self) -> &'a CatalogItem {
        self.item
    }

    pub fn duration(&self) -> &'a str {
        self.duration
    }

    /// Describe playback; there is no actual audio
    pub fn play(&self) -> String {
        format!(
            "Playing audiobook: {} by {} ({})",
            self.item.title, self.item.author, self.duration
        )
    }
}

/// Fields are stored in comma-delimited rows, one per line
pub fn check_field(field: &'static str, value: &str) -> Result<(), LibraryError> {
    if value.contains(',') || value.contains('\n') || value.contains('\r') {
        return Err(LibraryError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
