use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rumqttc::{Client, Event, MqttOptions, Packet};
use tracing::{error, info, warn};

use mqtt_log_backend::init::init_tracing;
use mqtt_log_backend::{MqttBackend, MqttBackendConfig, Style};

/// Publishes a few log lines to a local broker. Watch them with:
///
/// ```text
/// mosquitto_sub -t demo/logs -v
/// ```
///
/// Style and topic can be overridden through `MQTT_LOG_STYLE` / `MQTT_LOG_TOPIC`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut options = MqttOptions::new("mqtt-log-demo", "127.0.0.1", 1883);
    options.set_keep_alive(Duration::from_secs(30));
    let (client, mut connection) = Client::new(options, 64);

    // The backend only publishes; driving the connection is our job.
    thread::spawn(move || {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => eprintln!("connected: {:?}", ack.code),
                Ok(_) => {}
                Err(e) => {
                    eprintln!("mqtt connection error: {e}");
                    thread::sleep(Duration::from_secs(1));
                }
            }
        }
    });

    let config = MqttBackendConfig::from_env()
        .unwrap_or_else(|_| MqttBackendConfig::new("demo/logs", Style::Structured));
    let backend = MqttBackend::with_config(client, &config)?;

    init_tracing(Arc::new(backend))?;

    info!("mqtt example started");
    warn!(queue_depth = 118, "consumer falling behind");
    error!(sensor = "t-04", "reading out of range");

    // Let the event loop flush the QoS 0 publishes.
    thread::sleep(Duration::from_secs(1));
    Ok(())
}
