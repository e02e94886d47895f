// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! JSON File Storage Helpers
//!
//! Filesystem primitives shared by the file-backed repositories.
//!
//! - Whole-document writes go through a temp file followed by a rename, so
//!   readers never observe a half-written index or manifest.
//! - Collection loads skip (and log) individual corrupt documents or lines
//!   instead of failing the whole load.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::domain::identifier_sanitizer::IdentifierSanitizer;
use crate::domain::repository::RepositoryError;
use crate::domain::similarity::stable_hash_hex;

const ID_DIGEST_LEN: usize = 12;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn ensure_parent(path: &Path) -> Result<(), RepositoryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// File name for the document keyed by `id`: `<sanitized>_<digest>.json`.
///
/// Sanitizing is lossy (`task.1` and `task1` clean to the same stem), so the
/// first 12 hex digits of the SHA-256 of the raw id keep names distinct.
pub fn document_file_name(
    sanitizer: &dyn IdentifierSanitizer,
    id: &str,
) -> Result<String, RepositoryError> {
    let stem = sanitizer.sanitize(id)?;
    let digest = stable_hash_hex(id);
    Ok(format!("{stem}_{}.json", &digest[..ID_DIGEST_LEN]))
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), RepositoryError> {
    ensure_parent(path).await?;
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read a JSON document. A missing file is `Ok(None)`.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RepositoryError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load every `*.json` document in `dir`, in file-name order.
///
/// Files named in `skip` (e.g. a manifest) are ignored; documents that fail
/// to parse are logged and skipped. A missing directory yields an empty list.
pub async fn load_json_dir<T: DeserializeOwned>(
    dir: &Path,
    skip: &[&str],
) -> Result<Vec<T>, RepositoryError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let skipped = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| skip.contains(&n))
            .unwrap_or(true);
        if is_json && !skipped {
            paths.push(path);
        }
    }
    paths.sort();

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        match read_json::<T>(&path).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping corrupt record"),
        }
    }
    Ok(items)
}

/// Append one JSON line to `path`, creating it (and its parents) if needed.
pub async fn append_json_line<T: Serialize>(path: &Path, value: &T) -> Result<(), RepositoryError> {
    ensure_parent(path).await?;
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

/// Read a JSON-lines file, skipping blank and corrupt lines.
/// A missing file yields an empty list.
pub async fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RepositoryError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut items = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(item) => items.push(item),
            Err(e) => warn!(
                path = %path.display(),
                line = line_no + 1,
                error = %e,
                "Skipping corrupt line"
            ),
        }
    }
    Ok(items)
}

/// Delete `path`; a missing file is not an error.
pub async fn remove_file_if_exists(path: &Path) -> Result<(), RepositoryError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identifier_sanitizer::StrictIdentifierSanitizer;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        id: String,
        value: f64,
    }

    #[tokio::test]
    async fn test_atomic_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let doc = Doc { id: "a".into(), value: 0.5 };

        write_json_atomic(&path, &doc).await.unwrap();
        let loaded: Option<Doc> = read_json(&path).await.unwrap();
        assert_eq!(loaded, Some(doc));
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_document_names_stay_distinct_after_sanitizing() {
        let sanitizer = StrictIdentifierSanitizer::new();
        let dotted = document_file_name(&sanitizer, "task.1").unwrap();
        let plain = document_file_name(&sanitizer, "task1").unwrap();
        assert_ne!(dotted, plain);
        assert!(plain.starts_with("task1_"));
        assert!(plain.ends_with(".json"));
        assert_ne!(
            document_file_name(&sanitizer, "a/1").unwrap(),
            document_file_name(&sanitizer, "b/1").unwrap()
        );
        assert_eq!(plain, document_file_name(&sanitizer, "task1").unwrap());
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Doc> = read_json(&dir.path().join("missing.json")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_dir_skips_corrupt_and_excluded() {
        let dir = tempfile::tempdir().unwrap();
        write_json_atomic(&dir.path().join("a.json"), &Doc { id: "a".into(), value: 1.0 })
            .await
            .unwrap();
        write_json_atomic(&dir.path().join("b.json"), &Doc { id: "b".into(), value: 2.0 })
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("broken.json"), b"{not json").await.unwrap();
        tokio::fs::write(dir.path().join("manifest.json"), b"{}").await.unwrap();

        let docs: Vec<Doc> = load_json_dir(dir.path(), &["manifest.json"]).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[1].id, "b");
    }

    #[tokio::test]
    async fn test_json_lines_append_and_skip_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2026-01").join("records.jsonl");

        append_json_line(&path, &Doc { id: "1".into(), value: 0.1 }).await.unwrap();
        {
            let mut file = tokio::fs::OpenOptions::new().append(true).open(&path).await.unwrap();
            file.write_all(b"garbage\n").await.unwrap();
        }
        append_json_line(&path, &Doc { id: "2".into(), value: 0.2 }).await.unwrap();

        let docs: Vec<Doc> = read_json_lines(&path).await.unwrap();
        assert_eq!(docs.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
    }
}
