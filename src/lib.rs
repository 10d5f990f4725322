pub mod error;
pub mod record;
pub mod layout;
pub mod style;
pub mod message;
pub mod client;
pub mod sink;
pub mod console;
pub mod mqtt;
pub mod layer;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub mod backend;
pub mod env;
pub mod init;
pub mod noop_sink;

pub use backend::{MqttBackendConfig, TimeoutPolicy};
pub use client::{MqttClient, PublishToken};
pub use console::ConsoleBackend;
pub use error::{BackendError, ConfigError, PublishError};
pub use mqtt::MqttBackend;
pub use record::LogRecord;
pub use sink::{FanOut, LogBackend};
pub use style::Style;
