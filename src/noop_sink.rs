use crate::error::BackendError;
use crate::record::LogRecord;
use crate::sink::LogBackend;
use tracing::Level;

/// A backend that simply drops all records.
///
/// Useful for measuring the overhead of the layer itself without any
/// external I/O, and for unit tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopBackend;

impl LogBackend for NoopBackend {
    fn log(
        &self,
        _level: Level,
        _call_depth: usize,
        _record: &LogRecord,
    ) -> Result<(), BackendError> {
        Ok(())
    }
}
