use crate::layout::Layout;
use crate::record::{Frame, LogRecord};
use crate::sink::LogBackend;
use chrono::Utc;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Call depth handed to the backend: frame 0 of every record is the
/// dispatcher inside `on_event`, frame 1 the event's call site.
const DISPATCH_DEPTH: usize = 0;

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`LogBackend`] synchronously, on the emitting thread.
///
/// Events less severe than `min_level` are ignored. Events emitted while a
/// backend call is already running on the same thread (for instance by the
/// MQTT client itself) are dropped instead of being fed back into the
/// backend.
pub struct BackendLayer {
    backend: Arc<dyn LogBackend>,
    layout: Arc<Layout>,
    min_level: Level,
    sequence: AtomicU64,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Accepted by the backend.
    pub published_events: Arc<AtomicU64>,
    /// Rejected by the backend.
    pub failed_events: Arc<AtomicU64>,
}

impl BackendLayer {
    /// Create a layer forwarding `min_level` and more severe events to
    /// `backend`, rendering formatted output through `layout`.
    pub fn new(backend: Arc<dyn LogBackend>, layout: Layout, min_level: Level) -> Self {
        BackendLayer {
            backend,
            layout: Arc::new(layout),
            min_level,
            sequence: AtomicU64::new(0),
            total_events: Arc::new(AtomicU64::new(0)),
            published_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn dispatch(&self, level: Level, record: &LogRecord) {
        match self.backend.log(level, DISPATCH_DEPTH, record) {
            Ok(()) => {
                self.published_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                // Not through tracing: that would come straight back here.
                eprintln!("log backend failed for record {}: {}", record.id, e);
            }
        }
    }
}

/// Resets the re-entrancy flag even if the backend panics.
struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Option<DispatchGuard> {
        DISPATCHING.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(DispatchGuard)
            }
        })
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(false));
    }
}

impl<S> Layer<S> for BackendLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        // `Level` orders by verbosity: TRACE > DEBUG > ... > ERROR.
        if *meta.level() > self.min_level {
            return;
        }

        let Some(_guard) = DispatchGuard::enter() else {
            return;
        };

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let mut frames = vec![Frame::new(file!(), line!())];
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            frames.push(Frame::new(file, line));
        }

        let record = LogRecord {
            id: self.next_id(),
            timestamp: Utc::now(),
            level: *meta.level(),
            module: meta.target().to_string(),
            message: compose_message(message, &fields),
            frames,
            layout: Arc::clone(&self.layout),
        };

        self.dispatch(*meta.level(), &record);
    }
}

/// `message key=value key=value`, fields in name order.
fn compose_message(
    message: Option<String>,
    fields: &BTreeMap<String, serde_json::Value>,
) -> String {
    let mut out = message.unwrap_or_default();
    for (name, value) in fields {
        if !out.is_empty() {
            out.push(' ');
        }
        // Strings unquoted, everything else in its JSON form.
        let _ = match value {
            serde_json::Value::String(s) => write!(out, "{}={}", name, s),
            other => write!(out, "{}={}", name, other),
        };
    }
    out
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `info!("text")` delivers the message through `record_debug`.
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(format!("{:?}", value)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendError, PublishError};
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[derive(Default)]
    struct Capture {
        records: Mutex<Vec<(Level, usize, LogRecord)>>,
        fail: bool,
    }

    impl LogBackend for Capture {
        fn log(
            &self,
            level: Level,
            call_depth: usize,
            record: &LogRecord,
        ) -> Result<(), BackendError> {
            self.records.lock().unwrap().push((level, call_depth, record.clone()));
            // A scoped dispatcher drops this; see tests/global_dispatch.rs.
            tracing::error!("backend noise");
            if self.fail {
                Err(BackendError::Publish(PublishError::Disconnected))
            } else {
                Ok(())
            }
        }
    }

    fn run_with(backend: Arc<Capture>, min_level: Level, f: impl FnOnce()) -> (u64, u64, u64) {
        let layout = Layout::parse("%{shortfile} %{message}").unwrap();
        let layer = BackendLayer::new(backend, layout, min_level);
        let counters = (
            Arc::clone(&layer.total_events),
            Arc::clone(&layer.published_events),
            Arc::clone(&layer.failed_events),
        );
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        (
            counters.0.load(Ordering::Relaxed),
            counters.1.load(Ordering::Relaxed),
            counters.2.load(Ordering::Relaxed),
        )
    }

    #[test]
    fn forwards_events_with_sequence_ids() {
        let backend = Arc::new(Capture::default());
        let (total, published, failed) = run_with(Arc::clone(&backend), Level::INFO, || {
            tracing::info!("first");
            tracing::debug!("filtered out");
            tracing::warn!(attempt = 3, peer = "gw-1", "second");
        });

        let records = backend.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].2.id, 1);
        assert_eq!(records[0].2.message(), "first");
        assert_eq!(records[1].2.id, 2);
        assert_eq!(records[1].0, Level::WARN);
        assert_eq!(records[1].2.message(), "second attempt=3 peer=gw-1");
        assert!(records.iter().all(|(_, depth, _)| *depth == DISPATCH_DEPTH));
        assert_eq!(records[0].2.module, module_path!());

        // Three emitted events, two dispatched.
        assert_eq!(total, 3);
        assert_eq!((published, failed), (2, 0));
    }

    #[test]
    fn depth_one_reports_event_call_site() {
        let backend = Arc::new(Capture::default());
        let line = line!() + 2;
        run_with(Arc::clone(&backend), Level::TRACE, || {
            tracing::info!("where am I");
        });
        let records = backend.records.lock().unwrap();
        let record = &records[0].2;
        assert_eq!(record.formatted(1), format!("layer.rs:{} where am I", line));
        assert!(record.formatted(0).starts_with("layer.rs:"));
    }

    #[test]
    fn counts_failures() {
        let backend = Arc::new(Capture { fail: true, ..Capture::default() });
        let (_, published, failed) = run_with(backend, Level::INFO, || {
            tracing::error!("a");
            tracing::error!("b");
        });
        assert_eq!((published, failed), (0, 2));
    }

    #[test]
    fn message_composition() {
        let mut fields = BTreeMap::new();
        fields.insert("k".to_string(), serde_json::Value::from(1));
        assert_eq!(compose_message(None, &fields), "k=1");
        assert_eq!(compose_message(Some("m".into()), &BTreeMap::new()), "m");
    }
}
