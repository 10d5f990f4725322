use crate::error::BackendError;
use crate::record::LogRecord;
use std::sync::Arc;
use tracing::Level;

/// Synchronous destination for [`LogRecord`]s produced by the logging layer.
///
/// Implementations render the record and hand it to a concrete transport
/// (MQTT, stdout, ...). `log` runs on the thread that emitted the event
/// and may block.
pub trait LogBackend: Send + Sync {
    /// Deliver a single record.
    ///
    /// **Parameters**
    /// - `level`: severity the record was emitted at.
    /// - `call_depth`: frames between the caller of `log` and the code that
    ///   emitted the event. Backends that call [`LogRecord::formatted`] add
    ///   one for their own frame.
    /// - `record`: the record itself, borrowed for the duration of the call.
    ///
    /// **Returns**
    /// - `Ok(())` once the transport accepted the record.
    /// - `Err(..)` on any failure. Backends must not log their own errors;
    ///   reporting is up to the caller.
    fn log(
        &self,
        level: Level,
        call_depth: usize,
        record: &LogRecord,
    ) -> Result<(), BackendError>;
}

impl<B: LogBackend + ?Sized> LogBackend for Arc<B> {
    fn log(
        &self,
        level: Level,
        call_depth: usize,
        record: &LogRecord,
    ) -> Result<(), BackendError> {
        (**self).log(level, call_depth, record)
    }
}

impl<B: LogBackend + ?Sized> LogBackend for Box<B> {
    fn log(
        &self,
        level: Level,
        call_depth: usize,
        record: &LogRecord,
    ) -> Result<(), BackendError> {
        (**self).log(level, call_depth, record)
    }
}

/// Hands every record to several backends in order.
///
/// Every backend sees every record; a failure in one does not stop the
/// rest. The first error encountered is returned.
#[derive(Clone, Default)]
pub struct FanOut {
    backends: Vec<Arc<dyn LogBackend>>,
}

impl FanOut {
    pub fn new(backends: Vec<Arc<dyn LogBackend>>) -> Self {
        FanOut { backends }
    }

    pub fn push(&mut self, backend: Arc<dyn LogBackend>) {
        self.backends.push(backend);
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl LogBackend for FanOut {
    fn log(
        &self,
        level: Level,
        call_depth: usize,
        record: &LogRecord,
    ) -> Result<(), BackendError> {
        let mut first_err = None;
        for backend in &self.backends {
            if let Err(e) = backend.log(level, call_depth, record) {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail_with: Option<PublishError>,
    }

    impl Counting {
        fn new(fail_with: Option<PublishError>) -> Arc<Self> {
            Arc::new(Counting { calls: AtomicUsize::new(0), fail_with })
        }
    }

    impl LogBackend for Counting {
        fn log(&self, _: Level, _: usize, _: &LogRecord) -> Result<(), BackendError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match &self.fail_with {
                Some(e) => Err(BackendError::Publish(e.clone())),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn every_backend_sees_record_and_first_error_wins() {
        let a = Counting::new(Some(PublishError::Disconnected));
        let b = Counting::new(Some(PublishError::Abandoned));
        let c = Counting::new(None);
        let backends: Vec<Arc<dyn LogBackend>> = vec![a.clone(), b.clone(), c.clone()];
        let fan = FanOut::new(backends);

        let record = LogRecord::new(1, Level::INFO, "m", "x");
        match fan.log(Level::INFO, 0, &record) {
            Err(BackendError::Publish(e)) => assert_eq!(e, PublishError::Disconnected),
            other => panic!("unexpected result: {other:?}"),
        }
        for backend in [&a, &b, &c] {
            assert_eq!(backend.calls.load(Ordering::Relaxed), 1);
        }
    }

    #[test]
    fn empty_fan_out_succeeds() {
        let fan = FanOut::default();
        assert!(fan.is_empty());
        assert!(fan.log(Level::INFO, 0, &LogRecord::new(1, Level::INFO, "m", "x")).is_ok());
    }
}
