use crate::layout::Layout;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::Level;

/// Source location of one frame of the logging call chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file: String,
    pub line: u32,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Frame { file: file.into(), line }
    }

    /// `name.rs:42`
    pub fn short(&self) -> String {
        let name = self.file.rsplit(['/', '\\']).next().unwrap_or(&self.file);
        format!("{}:{}", name, self.line)
    }

    /// `/full/path/name.rs:42`
    pub fn long(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// A single log event as handed to a [`LogBackend`](crate::sink::LogBackend).
///
/// `frames` is ordered innermost first: index 0 is whatever dispatched the
/// record to the backend, index 1 the code that emitted the event. The call
/// depth passed to [`LogRecord::formatted`] selects which of them the layout
/// reports as the source location.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub module: String,
    pub message: String,
    pub frames: Vec<Frame>,
    pub layout: Arc<Layout>,
}

impl LogRecord {
    /// Record stamped with the current time and the default layout.
    pub fn new(
        id: u64,
        level: Level,
        module: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LogRecord {
            id,
            timestamp: Utc::now(),
            level,
            module: module.into(),
            message: message.into(),
            frames: Vec::new(),
            layout: Arc::new(Layout::default()),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_layout(mut self, layout: Arc<Layout>) -> Self {
        self.layout = layout;
        self
    }

    /// Plain message text, no metadata.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Upper-case level name, e.g. `INFO`.
    pub fn level_name(&self) -> String {
        self.level.to_string()
    }

    pub fn frame(&self, call_depth: usize) -> Option<&Frame> {
        self.frames.get(call_depth)
    }

    /// Full rendering through the record's layout, reporting the source
    /// location found `call_depth` frames up.
    pub fn formatted(&self, call_depth: usize) -> String {
        self.layout.format(self, call_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_short_strips_directories() {
        let frame = Frame::new("src/net/conn.rs", 17);
        assert_eq!(frame.short(), "conn.rs:17");
        assert_eq!(frame.long(), "src/net/conn.rs:17");
        assert_eq!(Frame::new("main.rs", 3).short(), "main.rs:3");
    }

    #[test]
    fn frame_lookup_by_depth() {
        let record = LogRecord::new(1, Level::WARN, "core", "x")
            .with_frames(vec![Frame::new("a.rs", 1), Frame::new("b.rs", 2)]);
        assert_eq!(record.frame(1), Some(&Frame::new("b.rs", 2)));
        assert!(record.frame(2).is_none());
        assert_eq!(record.level_name(), "WARN");
    }
}
