// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use image::{Rgb, RgbImage};
use previewgrid_core::artifacts;
use previewgrid_core::cache::{Dimensions, DirectoryCache};
use previewgrid_core::file_types::MediaKind;
use previewgrid_core::grid::trailer;
use previewgrid_core::index::IndexFile;
use previewgrid_core::probe;
use previewgrid_core::{Config, Controller, MediaProbe, RunReport};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reads real image headers, counting calls, or refuses every file.
#[derive(Debug, Default)]
struct CountingProbe {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingProbe {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MediaProbe for &CountingProbe {
    async fn dimensions(&self, path: &Path, _kind: MediaKind) -> anyhow::Result<Dimensions> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("probing is disabled");
        }
        probe::image_dimensions(path).await
    }
}

fn config() -> Config {
    Config {
        cell_size: 32,
        ..Config::default()
    }
}

async fn run(root: &Path, probe: &CountingProbe) -> RunReport {
    Controller::new(config(), probe)
        .unwrap()
        .run(root)
        .await
        .unwrap()
}

fn jpeg(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, Rgb([90, 120, 200]))
        .save(path)
        .unwrap();
}

fn garbage(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"this is not a jpeg").unwrap();
}

/// A small library below a fresh temporary directory:
///
/// lib/a/Bird.jpg, lib/a/Cat.jpg, lib/a/b/Dog.jpg, lib/c/Eel.jpg
fn library() -> (tempfile::TempDir, PathBuf) {
    let base = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(base.path()).unwrap().join("lib");
    jpeg(&root.join("a/Bird.jpg"), 40, 30);
    jpeg(&root.join("a/Cat.jpg"), 30, 40);
    jpeg(&root.join("a/b/Dog.jpg"), 20, 20);
    jpeg(&root.join("c/Eel.jpg"), 64, 16);
    (base, root)
}

fn read_cache(directory: &Path) -> DirectoryCache {
    let bytes = fs::read(artifacts::cache_path(directory).unwrap()).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn read_index(directory: &Path) -> Option<IndexFile> {
    let bytes = fs::read(artifacts::index_path(directory)).ok()?;
    Some(serde_json::from_slice(&bytes).unwrap())
}

/// Absolute paths of every directory listed in a directory's index.
fn indexed_directories(directory: &Path) -> HashSet<PathBuf> {
    read_index(directory)
        .map(|index| {
            index
                .directories
                .into_iter()
                .map(|e| match e.path.as_str() {
                    "." => directory.to_path_buf(),
                    path => directory.join(path),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let (_base, root) = library();
    let directories = [root.clone(), root.join("a"), root.join("a/b"), root.join("c")];

    let probe = CountingProbe::default();
    let first = run(&root, &probe).await;
    assert_eq!(4, first.files_processed);
    assert_eq!(4, first.new_files);
    assert_eq!(4, probe.calls());

    let before: Vec<Vec<u8>> = directories
        .iter()
        .map(|d| fs::read(artifacts::cache_path(d).unwrap()).unwrap())
        .collect();

    let probe = CountingProbe::default();
    let second = run(&root, &probe).await;
    assert_eq!(4, second.files_processed);
    assert_eq!(0, second.new_files);
    assert_eq!(4, second.cached_files);
    assert_eq!(0, probe.calls());

    let after: Vec<Vec<u8>> = directories
        .iter()
        .map(|d| fs::read(artifacts::cache_path(d).unwrap()).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn unchanged_files_are_never_probed_again() {
    let (_base, root) = library();
    run(&root, &CountingProbe::default()).await;

    let probe = CountingProbe::failing();
    let report = run(&root, &probe).await;
    assert_eq!(0, probe.calls());
    assert_eq!(0, report.new_files);

    let cache = read_cache(&root);
    assert_eq!(Dimensions::new(40, 30), cache["a/Bird.jpg"].dimensions);
    assert_eq!(Dimensions::new(20, 20), cache["a/b/Dog.jpg"].dimensions);
    assert_eq!(Dimensions::new(64, 16), cache["c/Eel.jpg"].dimensions);
}

#[tokio::test]
async fn deleted_files_leave_the_cache() {
    let (_base, root) = library();
    run(&root, &CountingProbe::default()).await;

    fs::remove_file(root.join("a/Cat.jpg")).unwrap();
    let report = run(&root, &CountingProbe::default()).await;
    assert_eq!(3, report.files_processed);

    let keys: Vec<String> = read_cache(&root.join("a")).into_keys().collect();
    assert_eq!(vec!["Bird.jpg", "b/Dog.jpg"], keys);
    assert!(!read_cache(&root).contains_key("a/Cat.jpg"));
}

#[tokio::test]
async fn lost_parent_cache_is_recovered_from_children() {
    let (_base, root) = library();
    run(&root, &CountingProbe::default()).await;
    let original = read_cache(&root);

    fs::remove_file(artifacts::cache_path(&root).unwrap()).unwrap();
    fs::remove_file(artifacts::cache_path(&root.join("a")).unwrap()).unwrap();

    // `a` recovers Dog.jpg from `b` but must probe its own files again.
    let probe = CountingProbe::default();
    let report = run(&root, &probe).await;
    assert_eq!(2, probe.calls());
    assert_eq!(2, report.new_files);

    fs::remove_file(artifacts::cache_path(&root).unwrap()).unwrap();
    let probe = CountingProbe::failing();
    run(&root, &probe).await;
    assert_eq!(0, probe.calls());
    assert_eq!(original, read_cache(&root));
}

#[tokio::test]
async fn changed_nested_file_is_measured_once() {
    let (_base, root) = library();
    run(&root, &CountingProbe::default()).await;

    jpeg(&root.join("a/b/Dog.jpg"), 30, 25);
    let probe = CountingProbe::default();
    let report = run(&root, &probe).await;

    assert_eq!(1, probe.calls());
    assert_eq!(4, report.files_processed);
    assert_eq!(1, report.new_files);
    assert_eq!(3, report.cached_files);

    let size = fs::metadata(root.join("a/b/Dog.jpg")).unwrap().len();
    for (directory, key) in [
        (root.join("a/b"), "Dog.jpg"),
        (root.join("a"), "b/Dog.jpg"),
        (root.clone(), "a/b/Dog.jpg"),
    ] {
        let entry = read_cache(&directory)[key];
        assert_eq!(Dimensions::new(30, 25), entry.dimensions, "{:?}", directory);
        assert_eq!(size, entry.file_size_bytes, "{:?}", directory);
    }
}

#[tokio::test]
async fn children_finish_before_parents() {
    let (_base, root) = library();
    let report = run(&root, &CountingProbe::default()).await;

    let order: Vec<&Path> = report.order.iter().map(|r| r.directory.as_path()).collect();
    assert_eq!(4, order.len());
    for (i, later) in order.iter().enumerate() {
        for earlier in &order[..i] {
            assert!(
                !later.starts_with(earlier) || later == earlier,
                "{:?} was processed before its descendant {:?}",
                earlier,
                later
            );
        }
    }
    assert_eq!(root.as_path(), *order.last().unwrap());
}

#[tokio::test]
async fn every_index_is_the_union_of_its_children() {
    let (_base, root) = library();
    let report = run(&root, &CountingProbe::default()).await;
    assert_eq!(4, report.index_entries);
    assert_eq!(4, report.mosaics_generated);

    let tree: [(PathBuf, Vec<PathBuf>); 4] = [
        (root.clone(), vec![root.join("a"), root.join("c")]),
        (root.join("a"), vec![root.join("a/b")]),
        (root.join("a/b"), vec![]),
        (root.join("c"), vec![]),
    ];

    for (directory, children) in tree {
        let mut expected: HashSet<PathBuf> = children
            .iter()
            .flat_map(|c| indexed_directories(c))
            .collect();
        expected.insert(directory.clone());
        assert_eq!(expected, indexed_directories(&directory), "{:?}", directory);
    }

    let index = read_index(&root).unwrap();
    let paths: Vec<&str> = index.directories.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(vec![".", "a", "a/b", "c"], paths);
    let a = &index.directories[1];
    assert_eq!(3, a.file_count);
}

#[tokio::test]
async fn corrupt_media_produces_no_mosaic() {
    let base = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(base.path()).unwrap().join("lib");
    garbage(&root.join("bad/Broken.jpg"));
    jpeg(&root.join("good/Fine.jpg"), 10, 10);

    let report = run(&root, &CountingProbe::default()).await;
    assert_eq!(2, report.mosaics_generated);
    assert_eq!(1, report.mosaics_skipped);
    assert!(!artifacts::mosaic_path(&root.join("bad")).unwrap().exists());
    assert!(artifacts::mosaic_path(&root.join("good")).unwrap().exists());

    // The broken file still has a cache entry, but nothing to show for it.
    let cache = read_cache(&root.join("bad"));
    assert_eq!(Dimensions::UNKNOWN, cache["Broken.jpg"].dimensions);
    assert!(!indexed_directories(&root).contains(&root.join("bad")));
}

#[tokio::test]
async fn five_good_pictures_and_one_broken() {
    let base = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(base.path()).unwrap().join("lib");
    let a = root.join("a");
    for i in 0..5 {
        jpeg(&a.join(format!("Picture{}.jpg", i)), 24 + i, 24);
    }
    garbage(&a.join("Corrupt.jpg"));

    let report = run(&root, &CountingProbe::default()).await;
    assert_eq!(6, report.files_processed);
    assert_eq!(6, report.new_files);

    let cache = read_cache(&a);
    assert_eq!(6, cache.len());
    assert_eq!(5, cache.values().filter(|e| e.dimensions.is_known()).count());
    assert_eq!(Dimensions::UNKNOWN, cache["Corrupt.jpg"].dimensions);

    let bytes = fs::read(artifacts::mosaic_path(&a).unwrap()).unwrap();
    let mosaic = image::load_from_memory(&bytes).unwrap();
    assert_eq!((64, 64), (mosaic.width(), mosaic.height()));
    let metadata = trailer::extract(&bytes).unwrap();
    assert_eq!(cache, metadata.files);
    assert!(metadata.directories.contains_key("."));

    let report = run(&root, &CountingProbe::default()).await;
    assert_eq!(6, report.files_processed);
    assert_eq!(0, report.new_files);
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_loops_are_visited_once() {
    let base = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(base.path()).unwrap().join("lib");
    jpeg(&root.join("b/Frog.jpg"), 12, 12);
    std::os::unix::fs::symlink(&root, root.join("b/loop")).unwrap();

    let report = run(&root, &CountingProbe::default()).await;
    assert_eq!(2, report.directories_scanned);
    assert_eq!(1, report.loops_skipped);
    assert_eq!(1, report.files_processed);
}
