// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Metadata appended after the end of a mosaic's JPEG data.
//!
//! JPEG decoders stop at the end-of-image marker, so the block is invisible
//! to image viewers while programs can find it between the two sentinels.

use crate::cache::DirectoryCache;
use crate::time::Millis;
use crate::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const BEGIN_MARKER: &[u8] = b"\n--PREVIEWGRID-METADATA-BEGIN--\n";
pub const END_MARKER: &[u8] = b"\n--PREVIEWGRID-METADATA-END--\n";

pub const CURRENT_VERSION: u32 = 2;

/// Metadata in its current shape. Older versions are migrated on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicMetadata {
    pub format_version: u32,

    /// The directory's cache at the time the mosaic was made.
    pub files: DirectoryCache,

    /// Birth time of the directory (`.`) and of every directory below it.
    #[serde(default)]
    pub directories: BTreeMap<String, Millis>,
}

impl MosaicMetadata {
    pub fn new(files: DirectoryCache, directories: BTreeMap<String, Millis>) -> Self {
        Self {
            format_version: CURRENT_VERSION,
            files,
            directories,
        }
    }
}

/// Version 1 carried only the file cache.
#[derive(Debug, Deserialize)]
struct MosaicMetadataV1 {
    files: DirectoryCache,
}

/// Appends the sentinel-delimited metadata block to encoded image bytes.
pub fn append(image: &mut Vec<u8>, metadata: &MosaicMetadata) -> Result<()> {
    let json = serde_json::to_vec(metadata)?;
    image.reserve(BEGIN_MARKER.len() + json.len() + END_MARKER.len());
    image.extend_from_slice(BEGIN_MARKER);
    image.extend_from_slice(&json);
    image.extend_from_slice(END_MARKER);
    Ok(())
}

/// Finds the last metadata block in `bytes` and reads it, migrating older versions.
pub fn extract(bytes: &[u8]) -> Result<MosaicMetadata> {
    let begin = find_last(bytes, BEGIN_MARKER)
        .ok_or_else(|| Error::Trailer("no metadata block found".into()))?;
    let json_start = begin + BEGIN_MARKER.len();
    let json_len = find_last(&bytes[json_start..], END_MARKER)
        .ok_or_else(|| Error::Trailer("metadata block is not terminated".into()))?;

    let value: Value = serde_json::from_slice(&bytes[json_start..json_start + json_len])?;
    migrate(value)
}

fn migrate(value: Value) -> Result<MosaicMetadata> {
    match value.get("formatVersion").and_then(Value::as_u64) {
        Some(1) => {
            let v1: MosaicMetadataV1 = serde_json::from_value(value)?;
            Ok(MosaicMetadata::new(v1.files, BTreeMap::new()))
        }
        Some(2) => Ok(serde_json::from_value(value)?),
        Some(other) => Err(Error::Trailer(format!(
            "unsupported format version {}",
            other
        ))),
        None => Err(Error::Trailer("missing format version".into())),
    }
}

fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
