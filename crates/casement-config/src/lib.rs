//! casement configuration.
//!
//! TOML-based configuration with full validation. All sections use
//! sensible defaults so partial configs work out of the box.
//!
//! ```rust,no_run
//! let config = casement_config::load_config().expect("failed to load config");
//! println!("{}", config.server.address());
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    CasementConfig, LogLevel, LoggingConfig, ServerConfig, SyncConfig, TabstripConfig,
    CONFIG_SCHEMA_VERSION,
};

use casement_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path, creating a default file if
/// none exists, and validate it.
pub fn load_config() -> Result<CasementConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load and validate config from an explicit path.
pub fn load_config_from(path: &Path) -> Result<CasementConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}
