//! Environment variable names used by this crate for convenient
//! configuration of the MQTT backend from services.
//!
//! These are purely helpers; the backend types remain decoupled from
//! environment access.

/// Topic every record is published to, e.g. `devices/gw-01/logs`.
pub const MQTT_LOG_TOPIC_ENV: &str = "MQTT_LOG_TOPIC";

/// Rendering style token: `FORMATTED`, `MINIMAL` or `JSON`.
pub const MQTT_LOG_STYLE_ENV: &str = "MQTT_LOG_STYLE";

/// Publish wait timeout in milliseconds.
pub const MQTT_LOG_TIMEOUT_MS_ENV: &str = "MQTT_LOG_TIMEOUT_MS";

/// `true`/`1` makes the publish timeout a hard bound.
pub const MQTT_LOG_STRICT_TIMEOUT_ENV: &str = "MQTT_LOG_STRICT_TIMEOUT";

/// Read an environment variable, treating unset and empty alike.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Interpret common truthy spellings: `1`, `true`, `yes`, `on`.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
