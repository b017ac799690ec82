// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::Error;
use crate::Result;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub const FFPROBE: &str = "ffprobe";
pub const FFMPEG: &str = "ffmpeg";

/// Fails with [`Error::MissingTool`] unless both ffprobe and ffmpeg can be run.
pub async fn ensure_available() -> Result<()> {
    for tool in [FFPROBE, FFMPEG] {
        if !is_runnable(tool).await {
            return Err(Error::MissingTool(tool.to_string()));
        }
        debug!("Found {}", tool);
    }
    Ok(())
}

async fn is_runnable(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
