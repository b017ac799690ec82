// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::time::SystemTime;

/// Milliseconds since the UNIX epoch.
pub type Millis = i64;

pub fn to_millis(time: SystemTime) -> Millis {
    DateTime::<Utc>::from(time).timestamp_millis()
}

pub fn now_millis() -> Millis {
    Utc::now().timestamp_millis()
}

/// Modification time of a file, if the platform reports one.
pub fn modified_millis(metadata: &Metadata) -> Option<Millis> {
    metadata.modified().ok().map(to_millis)
}

/// Creation time of a file or directory.
///
/// Not every filesystem records a birth time, so this falls back to the
/// modification time and finally to zero.
pub fn birthtime_millis(metadata: &Metadata) -> Millis {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(to_millis)
        .unwrap_or(0)
}
