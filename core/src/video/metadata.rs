// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use super::tools::FFPROBE;
use crate::cache::Dimensions;
use anyhow::*;
use chrono::TimeDelta;
use serde_json::Value;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct Metadata {
    pub width: Option<u32>,

    pub height: Option<u32>,

    pub duration: Option<TimeDelta>,
}

impl Metadata {
    /// Probes the container duration and the first video stream's size.
    pub async fn from(path: &Path) -> Result<Metadata> {
        let output = Command::new(FFPROBE)
            .arg("-v")
            .arg("error")
            .arg("-select_streams")
            .arg("v:0")
            .arg("-print_format")
            .arg("json")
            .arg("-show_entries")
            .arg("format=duration:stream=width,height")
            .arg("-i")
            .arg(path.as_os_str())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed running {} on {:?}", FFPROBE, path))?;

        if !output.status.success() {
            bail!(
                "{} exited with {} for {:?}: {}",
                FFPROBE,
                output.status,
                path,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let v: Value = serde_json::from_slice(output.stdout.as_slice())?;
        let metadata = Metadata::parse(&v);
        debug!("Video metadata for {:?}: {:?}", path, metadata);
        Ok(metadata)
    }

    fn parse(v: &Value) -> Metadata {
        let mut metadata = Metadata::default();

        metadata.duration = v["format"]["duration"] // seconds with decimal
            .as_str()
            .and_then(|x| {
                let fractional_secs = x.parse::<f64>();
                let millis = fractional_secs.map(|s| s * 1000.0).ok();
                millis.and_then(|m| TimeDelta::try_milliseconds(m as i64))
            });

        let video_stream = &v["streams"][0];
        metadata.width = video_stream["width"].as_u64().and_then(|w| u32::try_from(w).ok());
        metadata.height = video_stream["height"].as_u64().and_then(|h| u32::try_from(h).ok());

        metadata
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(Dimensions::new(width, height)),
            _ => None,
        }
    }
}

/// Width and height of the first video stream.
pub async fn stream_dimensions(path: &Path) -> Result<Dimensions> {
    Metadata::from(path)
        .await?
        .dimensions()
        .ok_or_else(|| anyhow!("No video stream in {:?}", path))
}
