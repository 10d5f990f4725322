use std::time::Duration;

/// Error returned by [`LogBackend::log`](crate::sink::LogBackend::log).
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    /// The record could not be rendered into a structured payload. Nothing
    /// was published.
    #[error("failed to serialize log entry: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The MQTT client reported a failure for the publish.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The publish did not complete in time under
    /// [`TimeoutPolicy::Strict`](crate::backend::TimeoutPolicy::Strict).
    #[error("publish not completed within {0:?}")]
    Timeout(Duration),

    /// A local writer (console) failed.
    #[error("failed to write log line: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by an MQTT client for a single publish.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The client library refused the request.
    #[error("mqtt client error: {0}")]
    Client(String),

    /// The connection to the broker is gone.
    #[error("mqtt connection closed")]
    Disconnected,

    /// Whoever was supposed to complete the publish went away first.
    #[error("publish abandoned before completion")]
    Abandoned,

    /// The broker or a downstream component rejected the message.
    #[error("publish rejected: {0}")]
    Rejected(String),
}

impl From<rumqttc::ClientError> for PublishError {
    fn from(err: rumqttc::ClientError) -> Self {
        PublishError::Client(err.to_string())
    }
}

/// Error type returned when building a backend from configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("publish topic must not be empty")]
    EmptyTopic,

    #[error("publish topic must not contain wildcards: {0}")]
    WildcardTopic(String),

    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Error type returned when parsing a layout pattern.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("unknown layout verb %{{{0}}}")]
    UnknownVerb(String),

    #[error("unterminated directive at byte {0}")]
    Unterminated(usize),

    #[error("dangling '%' at byte {0}")]
    DanglingPercent(usize),
}

/// Error type returned when installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("global subscriber already set: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}
