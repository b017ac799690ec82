// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use super::model::DirectoryCache;
use crate::artifacts;
use crate::Result;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Reads a cache sidecar. A missing or corrupt file is an empty cache.
pub async fn load(path: &Path) -> DirectoryCache {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No cache at {:?}", path);
            return DirectoryCache::new();
        }
        Err(e) => {
            warn!("Failed reading cache {:?}: {}", path, e);
            return DirectoryCache::new();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(cache) => cache,
        Err(e) => {
            debug!("Ignoring unparsable cache {:?}: {}", path, e);
            DirectoryCache::new()
        }
    }
}

/// Overwrites a cache sidecar with the full cache.
pub async fn save(path: &Path, cache: &DirectoryCache) -> Result<()> {
    let json = serde_json::to_vec_pretty(cache)?;
    artifacts::write_atomically(path, &json).await?;
    Ok(())
}
