// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod composer;
pub mod trailer;

pub use composer::Composer;
pub use composer::GridLayout;
pub use composer::Mosaic;
pub use trailer::MosaicMetadata;
