//! Publish capability the backend needs from an MQTT client.
//!
//! The backend only ever publishes and waits, so the seam is kept to
//! [`MqttClient::publish`] plus a [`PublishToken`] to wait on. Both
//! `rumqttc` clients are supported out of the box; tests swap in
//! [`MockClient`](crate::mock::MockClient).

use crate::error::PublishError;
use rumqttc::QoS;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Handle for one in-flight publish.
pub trait PublishToken {
    /// Wait up to `timeout` for completion. Returns `true` if the publish
    /// completed (successfully or not) within the bound.
    fn wait_timeout(&mut self, timeout: Duration) -> bool;

    /// Wait until the publish completes, without bound.
    fn wait(&mut self);

    /// Terminal error, if the publish failed. Only meaningful after waiting.
    fn into_error(self) -> Option<PublishError>;
}

/// A connected client capable of publishing. Implementations must be safe
/// to call from several threads at once.
pub trait MqttClient: Send + Sync {
    type Token: PublishToken;

    fn publish(&self, topic: &str, qos: QoS, retain: bool, payload: Vec<u8>) -> Self::Token;
}

impl<T: MqttClient + ?Sized> MqttClient for Arc<T> {
    type Token = T::Token;

    fn publish(&self, topic: &str, qos: QoS, retain: bool, payload: Vec<u8>) -> Self::Token {
        (**self).publish(topic, qos, retain, payload)
    }
}

impl<T: MqttClient + ?Sized> MqttClient for &T {
    type Token = T::Token;

    fn publish(&self, topic: &str, qos: QoS, retain: bool, payload: Vec<u8>) -> Self::Token {
        (**self).publish(topic, qos, retain, payload)
    }
}

/// Token whose outcome was known when it was created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadyToken {
    error: Option<PublishError>,
}

impl ReadyToken {
    pub fn ok() -> Self {
        ReadyToken { error: None }
    }

    pub fn failed(error: PublishError) -> Self {
        ReadyToken { error: Some(error) }
    }
}

impl<E: Into<PublishError>> From<Result<(), E>> for ReadyToken {
    fn from(result: Result<(), E>) -> Self {
        ReadyToken { error: result.err().map(Into::into) }
    }
}

impl PublishToken for ReadyToken {
    fn wait_timeout(&mut self, _timeout: Duration) -> bool {
        true
    }

    fn wait(&mut self) {}

    fn into_error(self) -> Option<PublishError> {
        self.error
    }
}

/// Token completed later, from any thread, through its [`PublishCompleter`].
#[derive(Debug)]
pub struct PendingToken {
    rx: Receiver<Result<(), PublishError>>,
    outcome: Option<Result<(), PublishError>>,
}

/// Completing side of a [`PendingToken`]. Dropping it without calling
/// [`complete`](PublishCompleter::complete) resolves the token with
/// [`PublishError::Abandoned`].
#[derive(Debug)]
pub struct PublishCompleter {
    tx: Sender<Result<(), PublishError>>,
}

impl PublishCompleter {
    pub fn complete(self, result: Result<(), PublishError>) {
        // Receiver gone means nobody is waiting any more.
        let _ = self.tx.send(result);
    }
}

/// Create a linked token/completer pair.
pub fn pending() -> (PendingToken, PublishCompleter) {
    let (tx, rx) = mpsc::channel();
    (PendingToken { rx, outcome: None }, PublishCompleter { tx })
}

impl PendingToken {
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }
}

impl PublishToken for PendingToken {
    fn wait_timeout(&mut self, timeout: Duration) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(result) => {
                self.outcome = Some(result);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                self.outcome = Some(Err(PublishError::Abandoned));
                true
            }
        }
    }

    fn wait(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let result = self.rx.recv().unwrap_or(Err(PublishError::Abandoned));
        self.outcome = Some(result);
    }

    fn into_error(self) -> Option<PublishError> {
        match self.outcome {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }
}

/// Blocking client: the call returns once the request is queued for the
/// event loop, so the outcome is already known.
impl MqttClient for rumqttc::Client {
    type Token = ReadyToken;

    fn publish(&self, topic: &str, qos: QoS, retain: bool, payload: Vec<u8>) -> ReadyToken {
        rumqttc::Client::publish(self, topic, qos, retain, payload).into()
    }
}

/// Async client driven from synchronous logging callbacks: uses the
/// non-blocking `try_publish`, which fails instead of waiting when the
/// request queue is full.
impl MqttClient for rumqttc::AsyncClient {
    type Token = ReadyToken;

    fn publish(&self, topic: &str, qos: QoS, retain: bool, payload: Vec<u8>) -> ReadyToken {
        self.try_publish(topic, qos, retain, payload).into()
    }
}
