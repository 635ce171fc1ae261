//! Process-level plumbing shared by Questline binaries: layered configuration
//! and logging setup.

pub mod config;
pub mod logging;
mod paths;

pub use config::{
    default_logging_config, AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section,
    ServerConfig,
};
