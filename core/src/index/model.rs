// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::time::Millis;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Freshness of one directory, held in memory with its absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryFreshness {
    pub directory: PathBuf,
    pub latest_modification_time: Millis,
    pub file_count: usize,
    pub birthtime: Millis,
}

/// One line of an index file, with the path relative to the index owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub path: String,
    pub latest_modification_time: Millis,
    pub file_count: usize,
    pub birthtime: Millis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    pub format_version: u32,
    pub directories: Vec<IndexEntry>,
    pub generated_at: Millis,
}
