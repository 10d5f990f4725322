use crate::backend::{
    validate_topic, MqttBackendConfig, TimeoutPolicy, DEFAULT_PUBLISH_TIMEOUT,
};
use crate::client::{MqttClient, PublishToken};
use crate::error::{BackendError, ConfigError};
use crate::message::LogMessage;
use crate::record::LogRecord;
use crate::sink::LogBackend;
use crate::style::Style;
use rumqttc::QoS;
use std::time::Duration;
use tracing::Level;

/// [`LogBackend`] that publishes every record to a single MQTT topic.
///
/// The client is expected to be connected already and its event loop
/// driven elsewhere; the backend never opens, closes or reconnects it.
/// Each call renders the record per the configured [`Style`], publishes it
/// at QoS 0 without the retain flag, and waits for the client to report
/// completion.
#[derive(Debug, Clone)]
pub struct MqttBackend<C> {
    client: C,
    topic: String,
    style: Style,
    publish_timeout: Duration,
    timeout_policy: TimeoutPolicy,
}

impl<C: MqttClient> MqttBackend<C> {
    /// Create a backend publishing to `topic` with the default 5 second
    /// advisory timeout.
    ///
    /// **Errors**
    /// - [`ConfigError::EmptyTopic`] / [`ConfigError::WildcardTopic`] if
    ///   `topic` cannot be published to.
    pub fn new(client: C, topic: impl Into<String>, style: Style) -> Result<Self, ConfigError> {
        let topic = topic.into();
        validate_topic(&topic)?;
        Ok(MqttBackend {
            client,
            topic,
            style,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            timeout_policy: TimeoutPolicy::Advisory,
        })
    }

    pub fn with_config(client: C, config: &MqttBackendConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(client, config.topic.clone(), config.style)?
            .with_timeout(config.publish_timeout(), config.timeout_policy))
    }

    pub fn with_timeout(mut self, timeout: Duration, policy: TimeoutPolicy) -> Self {
        self.publish_timeout = timeout;
        self.timeout_policy = policy;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Render `record` into the payload that [`LogBackend::log`] would
    /// publish for the same `call_depth`.
    pub fn render(&self, call_depth: usize, record: &LogRecord) -> Result<Vec<u8>, BackendError> {
        let payload = match self.style {
            Style::Structured => LogMessage::from_record(record).to_vec()?,
            Style::Minimal => record.message().as_bytes().to_vec(),
            // One more frame for this call.
            Style::Formatted => record.formatted(call_depth + 1).into_bytes(),
        };
        Ok(payload)
    }

    fn await_token(&self, mut token: C::Token) -> Result<(), BackendError> {
        let done = token.wait_timeout(self.publish_timeout);
        if !done {
            match self.timeout_policy {
                TimeoutPolicy::Strict => return Err(BackendError::Timeout(self.publish_timeout)),
                TimeoutPolicy::Advisory => token.wait(),
            }
        }
        match token.into_error() {
            Some(err) => Err(BackendError::Publish(err)),
            None => Ok(()),
        }
    }
}

impl<C: MqttClient> LogBackend for MqttBackend<C> {
    fn log(
        &self,
        _level: Level,
        call_depth: usize,
        record: &LogRecord,
    ) -> Result<(), BackendError> {
        let payload = self.render(call_depth, record)?;
        let token = self.client.publish(&self.topic, QoS::AtMostOnce, false, payload);
        self.await_token(token)
    }
}
