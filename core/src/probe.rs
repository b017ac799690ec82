// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::cache::Dimensions;
use crate::file_types::MediaKind;
use crate::video;
use anyhow::{anyhow, Result};
use image::ImageReader;
use std::future::Future;
use std::io::Cursor;
use std::path::Path;

/// Determines the pixel size of a media file.
///
/// Probing is the expensive step that the cache exists to avoid, so the
/// reconciler only calls this for new or changed files.
pub trait MediaProbe: Send + Sync {
    fn dimensions(
        &self,
        path: &Path,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Dimensions>> + Send;
}

/// Decodes image headers in memory and asks ffprobe about videos.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolProbe;

impl MediaProbe for ToolProbe {
    async fn dimensions(&self, path: &Path, kind: MediaKind) -> Result<Dimensions> {
        match kind {
            MediaKind::Image => image_dimensions(path).await,
            MediaKind::Video => video::metadata::stream_dimensions(path).await,
            other => Err(anyhow!("Cannot probe {:?} of kind {}", path, other)),
        }
    }
}

/// Reads the file and decodes only as much as is needed for the size.
pub async fn image_dimensions(path: &Path) -> Result<Dimensions> {
    let bytes = tokio::fs::read(path).await?;
    let (width, height) = tokio::task::spawn_blocking(move || {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(anyhow::Error::from)
    })
    .await??;
    Ok(Dimensions::new(width, height))
}
