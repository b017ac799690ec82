// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::Error;
use crate::Result;
use std::path::Path;
use tracing::debug;

/// Copies the static viewer file into `destination_dir` unless a copy of
/// the same size is already there. Returns whether a copy was made.
pub async fn install(asset: &Path, destination_dir: &Path) -> Result<bool> {
    let file_name = asset
        .file_name()
        .ok_or_else(|| Error::Config(format!("viewer asset {:?} has no file name", asset)))?;
    let destination = destination_dir.join(file_name);

    let source_len = tokio::fs::metadata(asset).await?.len();
    if let Ok(existing) = tokio::fs::metadata(&destination).await {
        if existing.is_file() && existing.len() == source_len {
            return Ok(false);
        }
    }

    tokio::fs::copy(asset, &destination).await?;
    debug!("Installed viewer at {:?}", destination);
    Ok(true)
}
