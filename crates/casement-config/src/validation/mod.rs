//! Full configuration validation.
//!
//! Every check runs; all failures are reported together.

mod helpers;


use crate::schema::CasementConfig;
use casement_common::ConfigError;

use helpers::{validate_non_empty, validate_range, validate_range_f64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CasementConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_non_empty(&mut errors, "server.bind", &config.server.bind);
    validate_range(&mut errors, "server.port", config.server.port, 1024, 65535);
    validate_range(
        &mut errors,
        "server.hello_timeout_secs",
        config.server.hello_timeout_secs,
        1,
        300,
    );

    validate_range(&mut errors, "sync.host_timeout_ms", config.sync.host_timeout_ms, 100, 60_000);
    validate_range(&mut errors, "sync.event_capacity", config.sync.event_capacity, 16, 65_536);

    validate_tabstrip_url(&mut errors, &config.tabstrip.url);
    validate_range_f64(&mut errors, "tabstrip.height", config.tabstrip.height, 8.0, 200.0);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_tabstrip_url(errors: &mut Vec<String>, url: &str) {
    validate_non_empty(errors, "tabstrip.url", url);
    let scheme_ok = ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| url.starts_with(scheme));
    if !url.trim().is_empty() && !scheme_ok {
        errors.push(format!("tabstrip.url = {url:?} must be an http(s) or file URL"));
    }
}
