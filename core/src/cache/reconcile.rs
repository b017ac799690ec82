// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use super::model::{CacheEntry, Dimensions, DirectoryCache, FileStat};
use super::store;
use crate::artifacts;
use crate::probe::MediaProbe;
use crate::scanner::FileRef;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A live media file keyed by its path relative to the directory being reconciled.
#[derive(Debug, Clone, Copy)]
pub struct LiveFile<'a> {
    pub key: &'a str,
    pub file: &'a FileRef,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub cache: DirectoryCache,

    /// Files that were new, changed, or could not be stat'ed, and so were probed.
    pub new_files: usize,

    /// Keys of the probed files.
    pub probed: BTreeSet<String>,

    /// Entries taken over from immediate children's caches.
    pub recovered: usize,
}

/// Brings a directory's cache in line with the files that exist now,
/// probing only what changed.
#[derive(Debug)]
pub struct Reconciler<'p, P: MediaProbe> {
    probe: &'p P,
    concurrency: usize,
}

impl<'p, P: MediaProbe> Reconciler<'p, P> {
    pub fn new(probe: &'p P, concurrency: usize) -> Self {
        Self {
            probe,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn reconcile(
        &self,
        directory: &Path,
        live_files: &[LiveFile<'_>],
        child_directories: &[PathBuf],
    ) -> Reconciliation {
        let cache_path = artifacts::cache_path(directory);

        if live_files.is_empty() {
            if let Some(ref path) = cache_path {
                artifacts::remove_stale(path).await;
            }
            return Reconciliation::default();
        }

        let mut cache = match cache_path {
            Some(ref path) => store::load(path).await,
            None => DirectoryCache::new(),
        };

        let live_keys: HashSet<&str> = live_files.iter().map(|f| f.key).collect();
        cache.retain(|key, _| live_keys.contains(key.as_str()));

        let mut children = Self::load_children(child_directories).await;
        children.retain(|key, _| live_keys.contains(key.as_str()));
        let recovered = children
            .keys()
            .filter(|key| !cache.contains_key(*key))
            .count();

        // Each task owns a distinct key, so results are merged after the join
        // without any locking.
        let (cache, children) = (&cache, &children);
        let results: Vec<(String, CacheEntry, bool)> = stream::iter(live_files)
            .map(|live| async move {
                let candidates = [cache.get(live.key), children.get(live.key)];
                let (entry, probed) = self.refresh(live, candidates).await;
                (live.key.to_string(), entry, probed)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut reconciled = DirectoryCache::new();
        let mut probed_keys = BTreeSet::new();
        for (key, entry, probed) in results {
            if probed {
                probed_keys.insert(key.clone());
            }
            reconciled.insert(key, entry);
        }
        let new_files = probed_keys.len();

        if let Some(ref path) = cache_path {
            if let Err(e) = store::save(path, &reconciled).await {
                warn!("Failed writing cache {:?}: {}", path, e);
            }
        }

        if new_files > 0 || recovered > 0 {
            info!(
                "Reconciled {:?}: {} files, {} new, {} recovered from subdirectories",
                directory,
                reconciled.len(),
                new_files,
                recovered
            );
        }

        Reconciliation {
            cache: reconciled,
            new_files,
            probed: probed_keys,
            recovered,
        }
    }

    /// Every immediate child's cache, keyed under `child-name/`. Only
    /// immediate children are consulted.
    async fn load_children(child_directories: &[PathBuf]) -> DirectoryCache {
        let mut children = DirectoryCache::new();
        for child in child_directories {
            let (Some(child_cache_path), Some(child_name)) =
                (artifacts::cache_path(child), child.file_name())
            else {
                continue;
            };
            let child_name = child_name.to_string_lossy();

            for (key, entry) in store::load(&child_cache_path).await {
                children.insert(format!("{}/{}", child_name, key), entry);
            }
        }
        children
    }

    /// Reuses the first fresh candidate or probes the file again. The
    /// directory's own entry comes first, then the child's. Returns whether
    /// it probed.
    async fn refresh(
        &self,
        live: &LiveFile<'_>,
        candidates: [Option<&CacheEntry>; 2],
    ) -> (CacheEntry, bool) {
        let path = &live.file.path;

        let stat = match tokio::fs::metadata(path).await {
            Ok(metadata) => Some(FileStat::from(&metadata)),
            Err(e) => {
                warn!("Failed to stat {:?}: {}", path, e);
                None
            }
        };

        if let Some(ref stat) = stat {
            if let Some(cached) = candidates.into_iter().flatten().find(|c| c.is_fresh(stat)) {
                debug!("Cache hit for {:?}", path);
                return (*cached, false);
            }
        }

        let dimensions = match self.probe.dimensions(path, live.file.kind).await {
            Ok(dimensions) => dimensions,
            Err(e) => {
                warn!("Failed to probe {:?}: {:#}", path, e);
                Dimensions::UNKNOWN
            }
        };

        (CacheEntry::new(stat.unwrap_or_default(), dimensions), true)
    }
}
