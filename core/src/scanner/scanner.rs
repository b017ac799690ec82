// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use super::model::{DirectoryNode, FileRef, ScanResult};
use crate::artifacts;
use crate::file_types;
use crate::Error;
use crate::Result;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Scans a file system for pictures and videos.
#[derive(Debug, Clone)]
pub struct Scanner {
    /// File system path to scan.
    scan_base: PathBuf,
}

impl Scanner {
    /// The base is canonicalized so that every recorded path is absolute
    /// and every directory has a usable name.
    pub fn build(scan_base: &Path) -> Result<Self> {
        let scan_base = fs::canonicalize(scan_base)?;
        if !scan_base.is_dir() {
            return Err(Error::NotADirectory(scan_base));
        }
        Ok(Self { scan_base })
    }

    pub fn scan_base(&self) -> &Path {
        &self.scan_base
    }

    /// Walks the tree breadth first, visiting each real directory once.
    pub fn scan(&self) -> ScanResult {
        let start = std::time::Instant::now();

        let mut result = ScanResult {
            root: self.scan_base.clone(),
            ..ScanResult::default()
        };

        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::from([self.scan_base.clone()]);

        while let Some(dir) = queue.pop_front() {
            let real_path = match fs::canonicalize(&dir) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Failed resolving {:?}: {}", dir, e);
                    result.unreadable += 1;
                    continue;
                }
            };

            if !visited.insert(real_path.clone()) {
                info!("Skipping symlink loop at {:?} (already visited {:?})", dir, real_path);
                result.loops_skipped += 1;
                continue;
            }

            let node = self.read_directory(&dir, &mut result);
            queue.extend(node.subdirectories.iter().cloned());
            result.directories.push(dir.clone());
            result.nodes.insert(dir, node);
        }

        // Subdirectories that turned out to be loops or unreadable were never
        // recorded, so drop them from their parents.
        let recorded: HashSet<PathBuf> = result.nodes.keys().cloned().collect();
        for node in result.nodes.values_mut() {
            node.subdirectories.retain(|s| recorded.contains(s));
        }

        info!(
            "Scanned {} directories and found {} media files in {} ms.",
            result.directories.len(),
            result.file_count(),
            start.elapsed().as_millis()
        );

        result
    }

    /// Lists the direct children of one directory.
    fn read_directory(&self, dir: &Path, result: &mut ScanResult) -> DirectoryNode {
        let mut node = DirectoryNode::default();

        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && Scanner::is_hidden(e)));

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if let Some(ancestor) = e.loop_ancestor() {
                        info!(
                            "Skipping symlink loop at {:?} (already visited {:?})",
                            e.path(),
                            ancestor
                        );
                        result.loops_skipped += 1;
                    } else if e.path().is_some_and(|p| p == dir) {
                        warn!("Failed reading directory {:?}: {}", dir, e);
                        result.unreadable += 1;
                    } else {
                        warn!("Failed walking: {}", e);
                    }
                    continue;
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                node.subdirectories.push(path.to_path_buf());
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let kind = file_types::classify(path);
            if !kind.is_media() || artifacts::is_mosaic_artifact(path) {
                debug!("Ignoring {:?} ({})", path, kind);
                continue;
            }

            node.files.push(FileRef {
                path: path.to_path_buf(),
                relative_path: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }

        node
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with("."))
            .unwrap_or(false)
    }
}
