use crate::error::BackendError;
use crate::record::LogRecord;
use crate::sink::LogBackend;
use std::io::{self, Write};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// [`LogBackend`] printing each record's formatted line, one per record.
///
/// Lines come from [`LogRecord::formatted`], so they match byte for byte
/// what [`Style::Formatted`](crate::style::Style::Formatted) publishes for
/// the same record and call depth.
pub struct ConsoleBackend<W = fn() -> io::Stdout> {
    make_writer: W,
}

impl ConsoleBackend {
    pub fn stdout() -> Self {
        ConsoleBackend { make_writer: io::stdout }
    }
}

impl<W> ConsoleBackend<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync,
{
    /// Write through any `tracing_subscriber` writer factory, e.g.
    /// `std::io::stderr` or a test buffer.
    pub fn with_writer(make_writer: W) -> Self {
        ConsoleBackend { make_writer }
    }
}

impl<W> LogBackend for ConsoleBackend<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync,
{
    fn log(
        &self,
        _level: Level,
        call_depth: usize,
        record: &LogRecord,
    ) -> Result<(), BackendError> {
        // One more frame for this call.
        let mut line = record.formatted(call_depth + 1);
        line.push('\n');
        let mut writer = self.make_writer.make_writer();
        writer.write_all(line.as_bytes())?;
        Ok(())
    }
}
