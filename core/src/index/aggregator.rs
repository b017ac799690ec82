// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use super::model::{DirectoryFreshness, IndexEntry, IndexFile, INDEX_FORMAT_VERSION};
use crate::artifacts;
use crate::cache::DirectoryCache;
use crate::time::{self, Millis};
use crate::Result;
use itertools::Itertools;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds each directory's entry for the freshness index.
/// Directories without any cached files contribute nothing.
pub fn own_entry(
    directory: &Path,
    cache: &DirectoryCache,
    birthtime: Millis,
) -> Option<DirectoryFreshness> {
    let latest_modification_time = cache.values().map(|e| e.modification_time_millis).max()?;
    Some(DirectoryFreshness {
        directory: directory.to_path_buf(),
        latest_modification_time,
        file_count: cache.len(),
        birthtime,
    })
}

/// Collects index entries bottom up. Directories must be handed over
/// deepest first so that children are always finished before their parent.
#[derive(Debug, Default)]
pub struct Aggregator {
    pending: HashMap<PathBuf, Vec<DirectoryFreshness>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combines the directory's own entry with everything its immediate
    /// subdirectories gathered, writes the directory's index file, and keeps
    /// the combined list for the parent. Returns the number of entries.
    pub async fn aggregate(
        &mut self,
        directory: &Path,
        own: Option<DirectoryFreshness>,
        subdirectories: &[PathBuf],
    ) -> Result<usize> {
        let mut combined: Vec<DirectoryFreshness> = own.into_iter().collect();
        for subdirectory in subdirectories {
            // A child is consumed by exactly one parent.
            if let Some(child_entries) = self.pending.remove(subdirectory) {
                combined.extend(child_entries);
            }
        }

        let count = combined.len();
        let index = (!combined.is_empty())
            .then(|| Self::index_for(directory, &combined, time::now_millis()));

        // Kept even if writing fails, so the parent still sees these entries.
        self.pending.insert(directory.to_path_buf(), combined);

        let index_path = artifacts::index_path(directory);
        match index {
            Some(index) => {
                let json = serde_json::to_vec_pretty(&index)?;
                artifacts::write_atomically(&index_path, &json).await?;
                debug!("Wrote {} index entries for {:?}", count, directory);
            }
            None => artifacts::remove_stale(&index_path).await,
        }

        Ok(count)
    }

    /// Entries gathered for a directory that no parent has consumed yet.
    pub fn entries(&self, directory: &Path) -> &[DirectoryFreshness] {
        self.pending
            .get(directory)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn index_for(owner: &Path, entries: &[DirectoryFreshness], generated_at: Millis) -> IndexFile {
        let directories = entries
            .iter()
            .filter_map(|e| {
                Some(IndexEntry {
                    path: artifacts::relative_key(&e.directory, owner)?,
                    latest_modification_time: e.latest_modification_time,
                    file_count: e.file_count,
                    birthtime: e.birthtime,
                })
            })
            .sorted_by(|a, b| a.path.cmp(&b.path))
            .collect();

        IndexFile {
            format_version: INDEX_FORMAT_VERSION,
            directories,
            generated_at,
        }
    }
}
