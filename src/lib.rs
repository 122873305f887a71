pub mod config;
pub mod core;
pub mod domain;
pub mod sources;
pub mod store;
pub mod utils;

pub use config::{cli::LocalStorage, Settings};

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::processing::ImageProcessor;
pub use core::search::{SearchManager, SearchOutcome};
pub use domain::model::{LogoFormat, LogoResult, SourceKind};
pub use store::LogoStore;
pub use utils::error::{LogoError, Result};
