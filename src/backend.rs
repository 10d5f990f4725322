use crate::env::{
    env_opt, parse_flag, MQTT_LOG_STRICT_TIMEOUT_ENV, MQTT_LOG_STYLE_ENV, MQTT_LOG_TIMEOUT_MS_ENV,
    MQTT_LOG_TOPIC_ENV,
};
use crate::error::ConfigError;
use crate::style::Style;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound for the publish acknowledgment wait.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// What happens when a publish is still pending after the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Keep waiting with no further bound. The timeout only marks the point
    /// where a slow broker is noticed.
    #[default]
    Advisory,
    /// Give up and return [`BackendError::Timeout`](crate::error::BackendError::Timeout).
    Strict,
}

/// Configuration for [`MqttBackend`](crate::mqtt::MqttBackend).
///
/// Loadable from any serde format or from the environment via
/// [`MqttBackendConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttBackendConfig {
    /// Topic every record is published to.
    pub topic: String,
    /// Rendering style; unknown tokens resolve to `FORMATTED`.
    #[serde(default)]
    pub style: Style,
    /// Publish wait timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub publish_timeout_ms: u64,
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_PUBLISH_TIMEOUT.as_millis() as u64
}

impl MqttBackendConfig {
    pub fn new(topic: impl Into<String>, style: Style) -> Self {
        MqttBackendConfig {
            topic: topic.into(),
            style,
            publish_timeout_ms: default_timeout_ms(),
            timeout_policy: TimeoutPolicy::default(),
        }
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    /// Build a config from the `MQTT_LOG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_opt)
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let topic = lookup(MQTT_LOG_TOPIC_ENV).ok_or(ConfigError::MissingEnv(MQTT_LOG_TOPIC_ENV))?;
        let style = lookup(MQTT_LOG_STYLE_ENV).map(Style::from).unwrap_or_default();

        let publish_timeout_ms = match lookup(MQTT_LOG_TIMEOUT_MS_ENV) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                key: MQTT_LOG_TIMEOUT_MS_ENV,
                value: raw.clone(),
            })?,
            None => default_timeout_ms(),
        };

        let strict = match lookup(MQTT_LOG_STRICT_TIMEOUT_ENV) {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidEnv {
                key: MQTT_LOG_STRICT_TIMEOUT_ENV,
                value: raw.clone(),
            })?,
            None => false,
        };

        let config = MqttBackendConfig {
            topic,
            style,
            publish_timeout_ms,
            timeout_policy: if strict { TimeoutPolicy::Strict } else { TimeoutPolicy::Advisory },
        };
        validate_topic(&config.topic)?;
        Ok(config)
    }
}

/// Check that `topic` can be published to: non-empty, no `+`/`#` wildcards.
pub fn validate_topic(topic: &str) -> Result<(), ConfigError> {
    if topic.is_empty() {
        return Err(ConfigError::EmptyTopic);
    }
    if topic.contains(['+', '#']) {
        return Err(ConfigError::WildcardTopic(topic.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn topic_validation() {
        assert_eq!(validate_topic("site/logs"), Ok(()));
        assert_eq!(validate_topic(""), Err(ConfigError::EmptyTopic));
        assert_eq!(
            validate_topic("site/+/logs"),
            Err(ConfigError::WildcardTopic("site/+/logs".into()))
        );
        assert!(validate_topic("site/#").is_err());
    }

    #[test]
    fn from_lookup_defaults() {
        let cfg = MqttBackendConfig::from_lookup(lookup(&[("MQTT_LOG_TOPIC", "gw/logs")])).unwrap();
        assert_eq!(cfg, MqttBackendConfig::new("gw/logs", Style::Formatted));
        assert_eq!(cfg.publish_timeout(), DEFAULT_PUBLISH_TIMEOUT);
        assert_eq!(cfg.timeout_policy, TimeoutPolicy::Advisory);
    }

    #[test]
    fn from_lookup_all_vars() {
        let cfg = MqttBackendConfig::from_lookup(lookup(&[
            ("MQTT_LOG_TOPIC", "gw/logs"),
            ("MQTT_LOG_STYLE", "JSON"),
            ("MQTT_LOG_TIMEOUT_MS", "250"),
            ("MQTT_LOG_STRICT_TIMEOUT", "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.style, Style::Structured);
        assert_eq!(cfg.publish_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.timeout_policy, TimeoutPolicy::Strict);
    }

    #[test]
    fn from_lookup_errors() {
        assert_eq!(
            MqttBackendConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingEnv("MQTT_LOG_TOPIC"))
        );
        assert_eq!(
            MqttBackendConfig::from_lookup(lookup(&[
                ("MQTT_LOG_TOPIC", "gw/logs"),
                ("MQTT_LOG_TIMEOUT_MS", "soon"),
            ])),
            Err(ConfigError::InvalidEnv { key: "MQTT_LOG_TIMEOUT_MS", value: "soon".into() })
        );
        assert!(matches!(
            MqttBackendConfig::from_lookup(lookup(&[("MQTT_LOG_TOPIC", "gw/#")])),
            Err(ConfigError::WildcardTopic(_))
        ));
    }

    #[test]
    fn deserializes_with_defaults() {
        let raw = r#"{"topic":"a/b","style":"MINIMAL","timeout_policy":"strict"}"#;
        let cfg: MqttBackendConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.style, Style::Minimal);
        assert_eq!(cfg.publish_timeout_ms, 5000);
        assert_eq!(cfg.timeout_policy, TimeoutPolicy::Strict);

        let cfg: MqttBackendConfig =
            serde_json::from_str(r#"{"topic":"a/b","style":"yaml"}"#).unwrap();
        assert_eq!(cfg.style, Style::Formatted);
    }
}
