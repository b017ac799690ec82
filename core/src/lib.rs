// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod artifacts;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod file_types;
pub mod grid;
pub mod index;
pub mod probe;
pub mod scanner;
pub mod time;
pub mod video;
pub mod viewer;

pub use config::Config;
pub use controller::Controller;
pub use controller::DirectoryReport;
pub use controller::RunReport;
pub use error::Error;
pub use probe::MediaProbe;
pub use probe::ToolProbe;
pub use scanner::Scanner;

/// A typedef of the result returned by many methods.
pub type Result<T, E = Error> = std::result::Result<T, E>;
