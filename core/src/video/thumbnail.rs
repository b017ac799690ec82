// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use super::tools::FFMPEG;
use super::Metadata;
use anyhow::*;
use chrono::TimeDelta;
use image::{DynamicImage, ImageReader};
use std::path::Path;
use std::result::Result::Ok;
use tokio::process::Command;
use tracing::{debug, warn};

/// Grabs one representative still frame from a video.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    capture_ceiling: TimeDelta,
}

impl FrameExtractor {
    pub fn new(capture_ceiling: TimeDelta) -> Self {
        Self { capture_ceiling }
    }

    /// Offset of the captured frame: half the duration, but never later than
    /// the ceiling. Videos of unknown length are captured at the start.
    pub fn capture_offset(&self, duration: Option<TimeDelta>) -> TimeDelta {
        let Some(duration) = duration else {
            return TimeDelta::zero();
        };
        let half = duration / 2;
        if half > self.capture_ceiling {
            self.capture_ceiling
        } else if half < TimeDelta::zero() {
            TimeDelta::zero()
        } else {
            half
        }
    }

    /// Extracts a frame scaled and centre-cropped to `width` x `height`.
    /// Returns `None` on any failure so the caller can leave the slot empty.
    pub async fn extract_frame(
        &self,
        video_path: &Path,
        width: u32,
        height: u32,
    ) -> Option<DynamicImage> {
        match self.try_extract_frame(video_path, width, height).await {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("Failed extracting frame from {:?}: {:#}", video_path, e);
                None
            }
        }
    }

    async fn try_extract_frame(
        &self,
        video_path: &Path,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage> {
        let metadata = Metadata::from(video_path).await?;
        let offset = self.capture_offset(metadata.duration);

        // Removed with its contents when dropped, whichever way we leave.
        let temporary_dir = tempfile::Builder::new()
            .prefix("previewgrid-frame-")
            .tempdir()?;
        let frame_path = temporary_dir.path().join("frame.png");

        debug!("Capturing {:?} at {} ms", video_path, offset.num_milliseconds());

        let output = Command::new(FFMPEG)
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-ss")
            .arg(seconds_arg(offset))
            .arg("-i")
            .arg(video_path.as_os_str())
            .arg("-frames:v")
            .arg("1")
            .arg("-vf")
            .arg(crop_filter(width, height))
            .arg(&frame_path)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed running {} on {:?}", FFMPEG, video_path))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                FFMPEG,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let frame = tokio::task::spawn_blocking(move || -> Result<DynamicImage> {
            Ok(ImageReader::open(&frame_path)?.decode()?)
        })
        .await??;

        drop(temporary_dir);
        Ok(frame)
    }
}

fn seconds_arg(offset: TimeDelta) -> String {
    format!("{:.3}", offset.num_milliseconds() as f64 / 1000.0)
}

/// Cover-fit: scale up until both edges fill the cell, then crop the centre.
fn crop_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = width,
        h = height
    )
}
