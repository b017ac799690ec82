// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::time::{self, Millis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::Metadata;

/// Pixel size of a picture or of the first video stream.
/// Zero by zero means the size could not be determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const UNKNOWN: Dimensions = Dimensions {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_known(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Size and modification time of a file as read from the filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: Millis,
}

impl From<&Metadata> for FileStat {
    fn from(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: time::modified_millis(metadata).unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub file_size_bytes: u64,
    pub modification_time_millis: Millis,
    pub dimensions: Dimensions,
}

impl CacheEntry {
    pub fn new(stat: FileStat, dimensions: Dimensions) -> Self {
        Self {
            file_size_bytes: stat.size,
            modification_time_millis: stat.modified,
            dimensions,
        }
    }

    /// An entry can be reused without probing iff size and modification
    /// time both match exactly.
    pub fn is_fresh(&self, stat: &FileStat) -> bool {
        self.file_size_bytes == stat.size && self.modification_time_millis == stat.modified
    }
}

/// Cache of one directory, keyed by path relative to that directory.
/// Ordered so that an unchanged directory serializes to identical bytes.
pub type DirectoryCache = BTreeMap<String, CacheEntry>;
