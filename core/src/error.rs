// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;
use thiserror::Error;

/// A unified error type for the preview grid library.
#[derive(Error, Debug)]
pub enum Error {
    /// Wraps standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wraps errors originating from the `image` crate.
    #[error("Image crate error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image resize error: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("Resized {edge}px cell has {actual} bytes, expected {expected}")]
    CellBuffer {
        edge: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Required tool '{0}' was not found. Install ffmpeg (it provides both ffprobe and ffmpeg) and make sure it is on your PATH.")]
    MissingTool(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("Invalid mosaic metadata: {0}")]
    Trailer(String),
}
