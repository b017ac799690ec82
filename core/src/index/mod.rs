// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod aggregator;
pub mod model;

pub use aggregator::own_entry;
pub use aggregator::Aggregator;
pub use model::DirectoryFreshness;
pub use model::IndexEntry;
pub use model::IndexFile;
