// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::artifacts;
use crate::file_types::MediaKind;
use itertools::Itertools;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A media file found during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Absolute path. This is the file's identity.
    pub path: PathBuf,

    /// Path relative to the directory that contains the file.
    pub relative_path: String,

    pub kind: MediaKind,
}

impl FileRef {
    /// Path of this file relative to `ancestor`, used as its key in the
    /// ancestor's cache.
    pub fn key_for(&self, ancestor: &Path) -> Option<String> {
        artifacts::relative_key(&self.path, ancestor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryNode {
    pub files: Vec<FileRef>,
    pub subdirectories: Vec<PathBuf>,
}

/// Snapshot of the whole tree, built once and read by every later stage.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub root: PathBuf,

    /// Directories in the order they were visited (breadth first).
    pub directories: Vec<PathBuf>,

    pub nodes: HashMap<PathBuf, DirectoryNode>,

    /// Directories skipped because their real path was already visited.
    pub loops_skipped: usize,

    /// Directories that could not be read and were treated as empty.
    pub unreadable: usize,
}

impl ScanResult {
    pub fn node(&self, directory: &Path) -> Option<&DirectoryNode> {
        self.nodes.get(directory)
    }

    pub fn files(&self, directory: &Path) -> &[FileRef] {
        self.node(directory).map(|n| n.files.as_slice()).unwrap_or(&[])
    }

    pub fn subdirectories(&self, directory: &Path) -> &[PathBuf] {
        self.node(directory)
            .map(|n| n.subdirectories.as_slice())
            .unwrap_or(&[])
    }

    /// The directory itself followed by every directory below it.
    pub fn descendant_directories<'a>(&'a self, directory: &'a Path) -> Vec<&'a Path> {
        let mut found = Vec::new();
        let mut stack = vec![directory];
        while let Some(dir) = stack.pop() {
            if !self.nodes.contains_key(dir) {
                continue;
            }
            found.push(dir);
            stack.extend(self.subdirectories(dir).iter().map(PathBuf::as_path));
        }
        found
    }

    /// Every media file in the subtree rooted at `directory`.
    pub fn descendant_files<'a>(&'a self, directory: &'a Path) -> Vec<&'a FileRef> {
        self.descendant_directories(directory)
            .into_iter()
            .flat_map(|dir| self.files(dir))
            .collect()
    }

    /// Directories ordered so that every directory comes after all of its
    /// descendants. Ties are broken by path so runs are repeatable.
    pub fn deepest_first(&self) -> Vec<&Path> {
        self.directories
            .iter()
            .map(PathBuf::as_path)
            .sorted_by(|a, b| {
                let depth_a = a.components().count();
                let depth_b = b.components().count();
                depth_b.cmp(&depth_a).then_with(|| a.cmp(b))
            })
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.nodes.values().map(|n| n.files.len()).sum()
    }
}
