// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::Error;
use crate::Result;
use chrono::TimeDelta;
use std::path::PathBuf;

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cells per row and per column of the mosaic.
    pub grid_columns: u32,

    /// Edge length in pixels of one square cell.
    pub cell_size: u32,

    pub jpeg_quality: u8,

    /// Maximum number of simultaneous file probes within one directory.
    pub probe_concurrency: usize,

    /// Latest offset into a video at which a frame is captured.
    pub capture_ceiling: TimeDelta,

    /// Static viewer file copied next to every mosaic.
    pub viewer_asset: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_columns: 2,
            cell_size: 256,
            jpeg_quality: 85,
            probe_concurrency: 10,
            capture_ceiling: TimeDelta::seconds(5),
            viewer_asset: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.grid_columns == 0 {
            return Err(Error::Config("grid columns must be at least 1".into()));
        }
        if self.cell_size < 16 {
            return Err(Error::Config(format!(
                "cell size must be at least 16 pixels, got {}",
                self.cell_size
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::Config(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if self.probe_concurrency == 0 {
            return Err(Error::Config("probe concurrency must be at least 1".into()));
        }
        if self.capture_ceiling < TimeDelta::zero() {
            return Err(Error::Config("capture ceiling must not be negative".into()));
        }
        if let Some(ref asset) = self.viewer_asset {
            if !asset.is_file() {
                return Err(Error::Config(format!(
                    "viewer asset {:?} is not a file",
                    asset
                )));
            }
        }
        Ok(())
    }
}
