// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use chrono::TimeDelta;
use clap::Parser;
use previewgrid_core::Config;
use std::path::PathBuf;

/// Builds preview grids and freshness indexes for a media library.
#[derive(Parser, Debug)]
#[command(name = "previewgrid", version)]
pub struct Cli {
    /// Root directory of the media library.
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Print the metadata embedded in a mosaic and exit.
    #[arg(long, value_name = "MOSAIC", conflicts_with = "root")]
    pub inspect: Option<PathBuf>,

    #[arg(
        long,
        value_name = "N",
        env = "PREVIEWGRID_COLUMNS",
        default_value_t = 2,
        help = "Cells per row and column of each mosaic"
    )]
    pub columns: u32,

    #[arg(
        long = "cell-size",
        value_name = "PIXELS",
        env = "PREVIEWGRID_CELL_SIZE",
        default_value_t = 256,
        help = "Edge length of one mosaic cell"
    )]
    pub cell_size: u32,

    #[arg(
        long,
        value_name = "1-100",
        env = "PREVIEWGRID_QUALITY",
        default_value_t = 85,
        help = "JPEG quality of the mosaics"
    )]
    pub quality: u8,

    #[arg(
        long,
        value_name = "N",
        env = "PREVIEWGRID_CONCURRENCY",
        default_value_t = 10,
        help = "Files probed at the same time within a directory"
    )]
    pub concurrency: usize,

    #[arg(
        long = "capture-ceiling",
        value_name = "SECONDS",
        env = "PREVIEWGRID_CAPTURE_CEILING",
        default_value_t = 5.0,
        help = "Latest point in a video to take its thumbnail from"
    )]
    pub capture_ceiling: f64,

    #[arg(
        long = "viewer-asset",
        value_name = "FILE",
        env = "PREVIEWGRID_VIEWER_ASSET",
        help = "Viewer file to copy next to every mosaic (default: none)"
    )]
    pub viewer_asset: Option<PathBuf>,

    /// Log debug detail unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            grid_columns: self.columns,
            cell_size: self.cell_size,
            jpeg_quality: self.quality,
            probe_concurrency: self.concurrency,
            capture_ceiling: TimeDelta::milliseconds((self.capture_ceiling * 1000.0) as i64),
            viewer_asset: self.viewer_asset.clone(),
        }
    }
}
