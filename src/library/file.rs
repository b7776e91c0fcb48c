//! Whole-file writes shared by the catalog store and the loan ledger.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;

/// Sibling path used while rewriting `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("libranet"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace the contents of `path`: write a sibling temp file, then rename it
/// over the target so a crash never leaves a half-written file behind.
pub async fn write_replace(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = temp_path(path);
    fs::write(&tmp, contents).await?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }

    Ok(())
}

/// Read a whole file; a missing file reads as `None`
pub async fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
