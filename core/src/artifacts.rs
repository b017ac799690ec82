// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Names and locations of every file the pipeline writes.
//!
//! For a directory `P/N`:
//! - cache sidecar: `P/.N.previewgrid.json`
//! - mosaic: `P/N.previewgrid.jpg`
//! - index: `P/N/.previewgrid-index.json`

use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

pub const MOSAIC_SUFFIX: &str = ".previewgrid.jpg";
pub const CACHE_SUFFIX: &str = ".previewgrid.json";
pub const INDEX_FILE_NAME: &str = ".previewgrid-index.json";

/// Builds a file name in the parent of `directory` from the directory's own name.
/// Filesystem roots have neither, so nothing can be placed beside them.
fn beside(directory: &Path, name: impl FnOnce(&str) -> String) -> Option<PathBuf> {
    let parent = directory.parent()?;
    let dir_name = directory.file_name()?.to_string_lossy();
    Some(parent.join(name(&dir_name)))
}

pub fn cache_path(directory: &Path) -> Option<PathBuf> {
    beside(directory, |name| format!(".{}{}", name, CACHE_SUFFIX))
}

pub fn mosaic_path(directory: &Path) -> Option<PathBuf> {
    beside(directory, |name| format!("{}{}", name, MOSAIC_SUFFIX))
}

pub fn index_path(directory: &Path) -> PathBuf {
    directory.join(INDEX_FILE_NAME)
}

/// Whether a file is a mosaic written by an earlier run.
pub fn is_mosaic_artifact(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().ends_with(MOSAIC_SUFFIX))
        .unwrap_or(false)
}

/// Path of `path` relative to `ancestor`, always `/` separated.
/// The ancestor itself is `.`.
pub fn relative_key(path: &Path, ancestor: &Path) -> Option<String> {
    let relative = path.strip_prefix(ancestor).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        Some(String::from("."))
    } else {
        Some(parts.join("/"))
    }
}

/// Writes to a temporary sibling first and then renames, so an interrupted
/// write never leaves a truncated artifact behind.
pub async fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temporary = path.as_os_str().to_owned();
    temporary.push(".tmp");
    let temporary = PathBuf::from(temporary);

    tokio::fs::write(&temporary, bytes).await?;
    if let Err(e) = tokio::fs::rename(&temporary, path).await {
        let _ = tokio::fs::remove_file(&temporary).await;
        return Err(e);
    }
    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

/// Removes an artifact left behind by an earlier run that no longer applies.
pub async fn remove_stale(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed stale artifact {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed removing stale artifact {:?}: {}", path, e),
    }
}
