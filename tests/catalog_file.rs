//! Catalog File Integration Tests
//!
//! Tests for the catalog file format and round-tripping through a reload.

use libranet::library::CATALOG_HEADER;
use libranet::{CatalogItem, CatalogStore, ErrorLog, ItemFormat, ItemId, ItemKind};
use tempfile::TempDir;

fn store(temp: &TempDir) -> CatalogStore {
    CatalogStore::new(
        temp.path().join("inventory.txt"),
        ErrorLog::new(temp.path().join("errors.log")),
    )
}

#[tokio::test]
async fn test_round_trip_preserves_every_field() {
    let temp = TempDir::new().unwrap();
    let mut original = store(&temp);

    let items = vec![
        CatalogItem::emagazine(30, "National Geographic", "Various", "2024-05"),
        CatalogItem::book(10, "The Rust Programming Language", "Klabnik", 552),
        CatalogItem::audiobook(20, "Project Hail Mary", "Weir", "16h10m").with_available(false),
        CatalogItem::book(11, "Zero To Production", "Palmieri", 0).with_available(false),
    ];
    for item in items.clone() {
        original.add(item).await.unwrap();
    }

    let mut reloaded = store(&temp);
    reloaded.load().await.unwrap();

    let mut expected = items;
    let mut actual = reloaded.items().to_vec();
    expected.sort_by_key(|i| i.id);
    actual.sort_by_key(|i| i.id);
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_file_keeps_insertion_order() {
    let temp = TempDir::new().unwrap();
    let mut catalog = store(&temp);

    catalog.add(CatalogItem::book(3, "C", "Z", 3)).await.unwrap();
    catalog.add(CatalogItem::audiobook(1, "A", "X", "1h")).await.unwrap();
    catalog.add(CatalogItem::emagazine(2, "B", "Y", "9")).await.unwrap();

    let content = std::fs::read_to_string(catalog.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            CATALOG_HEADER,
            "3,Book,C,Z,true,3",
            "1,Audiobook,A,X,true,1h",
            "2,EMagazine,B,Y,true,9",
        ]
    );
}

#[tokio::test]
async fn test_load_hand_written_file() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("inventory.txt"),
        "ID,Type,Title,Author,Availability,Extra\r\n\
         101,Book,Clean Code,Martin,true,464\r\n\
         \r\n\
         102,Audiobook,Atomic Habits,Clear,false,5h35m\r\n",
    )
    .unwrap();

    let mut catalog = store(&temp);
    assert_eq!(catalog.load().await.unwrap(), 2);

    let audiobook = catalog.find(ItemId::new(102)).unwrap();
    assert_eq!(audiobook.kind(), ItemKind::Audiobook);
    assert!(!audiobook.available);
    assert_eq!(
        audiobook.format,
        ItemFormat::Audiobook {
            duration: "5h35m".to_string()
        }
    );
}

#[tokio::test]
async fn test_header_only_file_is_empty_catalog() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("inventory.txt"), format!("{}\n", CATALOG_HEADER)).unwrap();

    let mut catalog = store(&temp);
    assert_eq!(catalog.load().await.unwrap(), 0);
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn test_negative_page_count_does_not_stop_load() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("inventory.txt"),
        "ID,Type,Title,Author,Availability,Extra\n\
         1,Book,Odd,Someone,true,-5\n\
         2,Book,Next,Other,true,120\n",
    )
    .unwrap();

    let mut catalog = store(&temp);
    assert_eq!(catalog.load().await.unwrap(), 2);
    assert_eq!(
        catalog.find(ItemId::new(1)).unwrap().format,
        ItemFormat::Book { page_count: -5 }
    );
}
