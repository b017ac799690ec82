// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod metadata;
pub mod thumbnail;
pub mod tools;

pub use metadata::Metadata;
pub use thumbnail::FrameExtractor;
