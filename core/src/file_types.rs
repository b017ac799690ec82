// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use strum::Display;

const PICTURE_SUFFIXES: [&str; 9] = [
    "bmp", "gif", "jfif", "jpeg", "jpg", "png", "tif", "tiff", "webp",
];

const VIDEO_SUFFIXES: [&str; 12] = [
    "3gp", "avi", "flv", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "ts", "webm", "wmv",
];

/// Formats that look like media but are known to break decoders, plus
/// archives and markers left behind by interrupted downloads.
const SKIP_SUFFIXES: [&str; 14] = [
    "psd", "psb", "xcf", "kra", "zip", "rar", "7z", "tar", "gz", "part", "crdownload", "ytdl",
    "tmp", "download",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Skip,
    Other,
}

impl MediaKind {
    pub fn is_media(self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Video)
    }
}

/// Classifies a path by its extension, ignoring case.
pub fn classify(path: &Path) -> MediaKind {
    let Some(path_ext) = path.extension() else {
        return MediaKind::Other;
    };

    let listed = |suffixes: &[&str]| suffixes.iter().any(|ext| path_ext.eq_ignore_ascii_case(ext));

    if listed(&SKIP_SUFFIXES[..]) {
        MediaKind::Skip
    } else if listed(&PICTURE_SUFFIXES[..]) {
        MediaKind::Image
    } else if listed(&VIDEO_SUFFIXES[..]) {
        MediaKind::Video
    } else {
        MediaKind::Other
    }
}
