// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

mod cli;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::Cli;
use humansize::{format_size, DECIMAL};
use previewgrid_core::grid::trailer;
use previewgrid_core::video::tools;
use previewgrid_core::{Controller, RunReport};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Enable logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Some(ref mosaic) = cli.inspect {
        inspect(mosaic).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(root) = cli.root.as_deref().filter(|root| root.is_dir()) else {
        eprintln!("{}", Cli::command().render_usage());
        match cli.root {
            Some(ref root) => eprintln!("Not a directory: {}", root.display()),
            None => eprintln!("The root directory of a media library is required."),
        }
        return Ok(ExitCode::FAILURE);
    };

    let config = cli.config();
    let controller = Controller::with_tools(config).context("Invalid settings")?;

    tools::ensure_available().await?;

    info!("Building preview grids under {}", root.display());
    let report = controller.run(root).await?;
    print_summary(&report);

    Ok(ExitCode::SUCCESS)
}

/// Prints the metadata block of a mosaic as JSON.
async fn inspect(mosaic: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(mosaic)
        .await
        .with_context(|| format!("Failed reading {}", mosaic.display()))?;
    let metadata = trailer::extract(&bytes)
        .with_context(|| format!("No preview grid metadata in {}", mosaic.display()))?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("Directories scanned:   {}", report.directories_scanned);
    println!("Symlink loops skipped: {}", report.loops_skipped);
    println!("Unreadable:            {}", report.unreadable_directories);
    println!(
        "Files processed:       {} ({} new, {} cached)",
        report.files_processed, report.new_files, report.cached_files
    );
    println!(
        "Media size:            {}",
        format_size(report.media_bytes, DECIMAL)
    );
    println!(
        "Mosaics:               {} generated, {} skipped",
        report.mosaics_generated, report.mosaics_skipped
    );
    println!("Index entries:         {}", report.index_entries);
    println!(
        "Elapsed:               {:.1} s",
        report.elapsed.as_secs_f64()
    );
}
