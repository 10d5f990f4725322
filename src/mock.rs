//! In-memory MQTT client for exercising backends without a broker.
//!
//! Records every publish and resolves each token according to a
//! configurable [`MockOutcome`].

use crate::client::{pending, MqttClient, PendingToken, PublishCompleter};
use crate::error::PublishError;
use rumqttc::QoS;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// A recorded publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub qos: QoS,
    pub retain: bool,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("<non-utf8>")
    }
}

/// How the mock resolves the tokens it hands out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Complete immediately with success.
    Succeed,
    /// Complete immediately with the given error.
    Fail(PublishError),
    /// Complete from a helper thread after the delay.
    Delay(Duration, Result<(), PublishError>),
    /// Never complete. Waiting without a bound will block forever.
    Hang,
}

/// Mock implementation of [`MqttClient`].
///
/// Thread-safe via `Mutex` (fine for test contexts).
pub struct MockClient {
    outcome: Mutex<MockOutcome>,
    published: Mutex<Vec<PublishedMessage>>,
    // Completers of `Hang` tokens, kept alive so the tokens never resolve.
    parked: Mutex<Vec<PublishCompleter>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::with_outcome(MockOutcome::Succeed)
    }

    pub fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            published: Mutex::new(Vec::new()),
            parked: Mutex::new(Vec::new()),
        }
    }

    /// Change how subsequent publishes resolve.
    pub fn set_outcome(&self, outcome: MockOutcome) {
        *lock(&self.outcome) = outcome;
    }

    /// Get all published messages.
    pub fn published(&self) -> Vec<PublishedMessage> {
        lock(&self.published).clone()
    }

    /// Get the last published message.
    pub fn last_published(&self) -> Option<PublishedMessage> {
        lock(&self.published).last().cloned()
    }

    /// Get published messages for a specific topic.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        lock(&self.published)
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Clear all recorded state.
    pub fn reset(&self) {
        lock(&self.published).clear();
        lock(&self.parked).clear();
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttClient for MockClient {
    type Token = PendingToken;

    fn publish(&self, topic: &str, qos: QoS, retain: bool, payload: Vec<u8>) -> PendingToken {
        lock(&self.published).push(PublishedMessage {
            topic: topic.to_string(),
            qos,
            retain,
            payload,
        });

        let (token, completer) = pending();
        let outcome = lock(&self.outcome).clone();
        match outcome {
            MockOutcome::Succeed => completer.complete(Ok(())),
            MockOutcome::Fail(err) => completer.complete(Err(err)),
            MockOutcome::Delay(delay, result) => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    completer.complete(result);
                });
            }
            MockOutcome::Hang => lock(&self.parked).push(completer),
        }
        token
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PublishToken;

    #[test]
    fn publish_records_messages() {
        let mock = MockClient::new();
        mock.publish("test/topic", QoS::AtMostOnce, false, b"hello".to_vec());
        mock.publish("test/other", QoS::AtLeastOnce, true, b"world".to_vec());

        let msgs = mock.published();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].topic, "test/topic");
        assert_eq!(msgs[0].payload_str(), "hello");
        assert!(msgs[1].retain);
        assert_eq!(mock.published_to("test/other").len(), 1);
        assert_eq!(mock.last_published().unwrap().topic, "test/other");
    }

    #[test]
    fn outcome_controls_token() {
        let mock = MockClient::with_outcome(MockOutcome::Fail(PublishError::Disconnected));
        let mut token = mock.publish("t", QoS::AtMostOnce, false, Vec::new());
        token.wait();
        assert_eq!(token.into_error(), Some(PublishError::Disconnected));

        mock.set_outcome(MockOutcome::Hang);
        let mut token = mock.publish("t", QoS::AtMostOnce, false, Vec::new());
        assert!(!token.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn reset_clears_state() {
        let mock = MockClient::new();
        mock.publish("t", QoS::AtMostOnce, false, b"d".to_vec());
        mock.reset();
        assert!(mock.published().is_empty());
        assert!(mock.last_published().is_none());
    }
}
