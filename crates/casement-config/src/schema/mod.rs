//! Configuration schema types for casement.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod logging;
mod server;
mod sync;
mod tabstrip;

pub use logging::*;
pub use server::*;
pub use sync::*;
pub use tabstrip::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CasementConfig {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub tabstrip: TabstripConfig,
    pub logging: LoggingConfig,
}
