use serde::{Deserialize, Serialize};

/// Tabstrip proxy windows created for each tab group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TabstripConfig {
    /// Page loaded into every tabstrip window.
    pub url: String,
    /// Strip height in pixels (8.0-200.0).
    pub height: f64,
}

impl Default for TabstripConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9400/tabstrip.html".into(),
            height: 32.0,
        }
    }
}
