// SPDX-FileCopyrightText: © 2025 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod model;
pub mod reconcile;
pub mod store;

pub use model::CacheEntry;
pub use model::Dimensions;
pub use model::DirectoryCache;
pub use model::FileStat;
pub use reconcile::LiveFile;
pub use reconcile::Reconciler;
pub use reconcile::Reconciliation;
