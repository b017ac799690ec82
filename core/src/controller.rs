// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::artifacts;
use crate::cache::{DirectoryCache, LiveFile, Reconciler};
use crate::config::Config;
use crate::grid::{Composer, MosaicMetadata};
use crate::index::{self, Aggregator};
use crate::probe::{MediaProbe, ToolProbe};
use crate::scanner::{FileRef, ScanResult, Scanner};
use crate::time::{self, Millis};
use crate::viewer;
use crate::Result;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of processing one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryReport {
    pub directory: PathBuf,

    /// Media files in the whole subtree.
    pub files: usize,

    /// Files in the subtree that had to be probed.
    pub new_files: usize,

    pub mosaic: bool,

    /// Entries in this directory's index.
    pub index_entries: usize,

    pub elapsed: Duration,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub directories_scanned: usize,
    pub loops_skipped: usize,
    pub unreadable_directories: usize,

    pub files_processed: usize,
    pub new_files: usize,
    pub cached_files: usize,

    pub mosaics_generated: usize,

    /// Directories that had media but not a single usable file.
    pub mosaics_skipped: usize,

    /// Entries in the root's index.
    pub index_entries: usize,

    /// Total size of all media files under the root.
    pub media_bytes: u64,

    /// Every directory in the order it was finished.
    pub order: Vec<DirectoryReport>,

    pub elapsed: Duration,
}

/// Drives the scan, cache, mosaic, and index stages over one tree.
#[derive(Debug)]
pub struct Controller<P: MediaProbe = ToolProbe> {
    config: Config,
    probe: P,
    composer: Composer,
}

impl Controller<ToolProbe> {
    /// A controller that probes with the image decoder and ffprobe.
    pub fn with_tools(config: Config) -> Result<Self> {
        Self::new(config, ToolProbe)
    }
}

impl<P: MediaProbe> Controller<P> {
    pub fn new(config: Config, probe: P) -> Result<Self> {
        config.validate()?;
        let composer = Composer::new(&config);
        Ok(Self {
            config,
            probe,
            composer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes every directory below `root`, children before parents.
    pub async fn run(&self, root: &Path) -> Result<RunReport> {
        let start = Instant::now();

        let scanner = Scanner::build(root)?;
        let scan = tokio::task::spawn_blocking(move || scanner.scan()).await?;

        let mut report = RunReport {
            directories_scanned: scan.directories.len(),
            loops_skipped: scan.loops_skipped,
            unreadable_directories: scan.unreadable,
            files_processed: scan.file_count(),
            ..RunReport::default()
        };

        let mut aggregator = Aggregator::new();
        let mut probed: HashSet<PathBuf> = HashSet::new();

        for directory in scan.deepest_first() {
            let (directory_report, cache) = self
                .process_directory(&scan, directory, &mut aggregator, &mut probed)
                .await;

            if directory_report.mosaic {
                report.mosaics_generated += 1;
            } else if !cache.is_empty() {
                report.mosaics_skipped += 1;
            }

            if directory == scan.root.as_path() {
                report.index_entries = directory_report.index_entries;
                report.media_bytes = cache.values().map(|e| e.file_size_bytes).sum();
            }

            report.order.push(directory_report);
        }

        // Each file counts once, however many ancestors looked at it.
        report.new_files = probed.len();
        report.cached_files = report.files_processed.saturating_sub(report.new_files);
        report.elapsed = start.elapsed();

        info!(
            "Processed {} directories in {} ms.",
            report.directories_scanned,
            report.elapsed.as_millis()
        );

        Ok(report)
    }

    /// Reconciles, composes, and indexes one directory. Failures are logged
    /// and never stop the run.
    async fn process_directory(
        &self,
        scan: &ScanResult,
        directory: &Path,
        aggregator: &mut Aggregator,
        probed: &mut HashSet<PathBuf>,
    ) -> (DirectoryReport, DirectoryCache) {
        let start = Instant::now();

        let keyed: Vec<(String, &FileRef)> = scan
            .descendant_files(directory)
            .into_iter()
            .filter_map(|file| Some((file.key_for(directory)?, file)))
            .collect();

        let live: Vec<LiveFile> = keyed
            .iter()
            .map(|(key, file)| LiveFile {
                key: key.as_str(),
                file: *file,
            })
            .collect();

        let subdirectories = scan.subdirectories(directory);

        let reconciler = Reconciler::new(&self.probe, self.config.probe_concurrency);
        let reconciliation = reconciler
            .reconcile(directory, &live, subdirectories)
            .await;
        probed.extend(
            keyed
                .iter()
                .filter(|(key, _)| reconciliation.probed.contains(key))
                .map(|(_, file)| file.path.clone()),
        );
        let cache = reconciliation.cache;

        let birthtimes = Self::birthtimes(scan, directory).await;
        let own_birthtime = birthtimes.get(".").copied().unwrap_or(0);

        let mosaic = if cache.is_empty() {
            self.discard_mosaic(directory).await;
            false
        } else {
            let pairs: Vec<(&str, &FileRef)> =
                keyed.iter().map(|(key, file)| (key.as_str(), *file)).collect();
            let metadata = MosaicMetadata::new(cache.clone(), birthtimes);
            self.write_mosaic(directory, &pairs, &cache, &metadata)
                .await
        };

        let own = if mosaic {
            index::own_entry(directory, &cache, own_birthtime)
        } else {
            None
        };

        let index_entries = match aggregator.aggregate(directory, own, subdirectories).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed writing index for {:?}: {}", directory, e);
                aggregator.entries(directory).len()
            }
        };

        let elapsed = start.elapsed();
        info!(
            "Finished {:?}: {} files, {} new, mosaic {}, {} index entries in {} ms.",
            directory,
            cache.len(),
            reconciliation.new_files,
            if mosaic { "written" } else { "skipped" },
            index_entries,
            elapsed.as_millis()
        );

        let report = DirectoryReport {
            directory: directory.to_path_buf(),
            files: cache.len(),
            new_files: reconciliation.new_files,
            mosaic,
            index_entries,
            elapsed,
        };
        (report, cache)
    }

    /// Composes the mosaic and writes it beside the directory.
    /// Returns whether a mosaic now exists.
    async fn write_mosaic(
        &self,
        directory: &Path,
        files: &[(&str, &FileRef)],
        cache: &DirectoryCache,
        metadata: &MosaicMetadata,
    ) -> bool {
        let Some(mosaic_path) = artifacts::mosaic_path(directory) else {
            return false;
        };

        let mosaic = match self.composer.compose(directory, files, cache, metadata).await {
            Ok(Some(mosaic)) => mosaic,
            Ok(None) => {
                info!("No usable media for a mosaic of {:?}", directory);
                artifacts::remove_stale(&mosaic_path).await;
                return false;
            }
            Err(e) => {
                warn!("Failed composing mosaic for {:?}: {}", directory, e);
                artifacts::remove_stale(&mosaic_path).await;
                return false;
            }
        };

        if let Err(e) = artifacts::write_atomically(&mosaic_path, &mosaic.bytes).await {
            warn!("Failed writing mosaic {:?}: {}", mosaic_path, e);
            return false;
        }

        if let (Some(asset), Some(parent)) = (&self.config.viewer_asset, mosaic_path.parent()) {
            if let Err(e) = viewer::install(asset, parent).await {
                warn!("Failed installing viewer into {:?}: {}", parent, e);
            }
        }

        true
    }

    async fn discard_mosaic(&self, directory: &Path) {
        if let Some(mosaic_path) = artifacts::mosaic_path(directory) {
            artifacts::remove_stale(&mosaic_path).await;
        }
    }

    /// Birth time of the directory (`.`) and of every directory below it.
    async fn birthtimes(scan: &ScanResult, directory: &Path) -> BTreeMap<String, Millis> {
        let mut birthtimes = BTreeMap::new();
        for dir in scan.descendant_directories(directory) {
            let Some(key) = artifacts::relative_key(dir, directory) else {
                continue;
            };
            let birthtime = match tokio::fs::metadata(dir).await {
                Ok(metadata) => time::birthtime_millis(&metadata),
                Err(e) => {
                    warn!("Failed reading metadata of {:?}: {}", dir, e);
                    0
                }
            };
            birthtimes.insert(key, birthtime);
        }
        birthtimes
    }
}
