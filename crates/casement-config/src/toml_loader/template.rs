//! Default TOML config template with documentation comments.

/// Generate the default TOML config content with comments.
pub(super) fn default_config_toml() -> String {
    r##"# casement configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[server]
# bind = "127.0.0.1"
# port = 9400              # 1024-65535
# hello_timeout_secs = 10  # 1-300

[sync]
# host_timeout_ms = 5000   # 100-60000
# event_capacity = 256     # 16-65536

[tabstrip]
# url = "http://localhost:9400/tabstrip.html"
# height = 32.0            # 8.0-200.0

[logging]
# level = "info"           # trace, debug, info, warn, error
"##
    .to_string()
}
