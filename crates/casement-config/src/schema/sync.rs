use serde::{Deserialize, Serialize};

/// State synchronization and event fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on a single window host call, in milliseconds (100-60000).
    pub host_timeout_ms: u32,
    /// Buffered events per subscriber before slow clients start lagging
    /// (16-65536).
    pub event_capacity: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            host_timeout_ms: 5000,
            event_capacity: 256,
        }
    }
}
