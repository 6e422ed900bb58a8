pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::dart::DartClient;
pub use adapters::storage::LocalStorage;
pub use app::pipelines::DisclosurePipeline;
pub use config::toml_config::TomlConfig;
pub use core::etl::EtlEngine;
pub use utils::error::{EtlError, Result};
