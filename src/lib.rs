pub mod adapters;
pub mod analysis;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::local::LocalStorage;
pub use config::toml_config::TomlConfig;

pub use self::core::{etl::EtlEngine, pipeline::FluxPipeline};
pub use utils::error::{FluxError, Result};
