use crate::error::LayoutError;
use crate::record::LogRecord;
use chrono::SecondsFormat;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::OnceLock;

/// Pattern used when no layout is configured.
pub const DEFAULT_PATTERN: &str = "%{time} %{level} [%{module}] %{shortfile}: %{message}";

/// Rendered in place of a source location the record does not carry.
const UNKNOWN_LOCATION: &str = "???";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Id,
    Pid,
    Time,
    Level,
    Module,
    Program,
    Message,
    ShortFile,
    LongFile,
}

impl Verb {
    fn parse(name: &str) -> Option<Verb> {
        Some(match name {
            "id" => Verb::Id,
            "pid" => Verb::Pid,
            "time" => Verb::Time,
            "level" => Verb::Level,
            "module" => Verb::Module,
            "program" => Verb::Program,
            "message" => Verb::Message,
            "shortfile" => Verb::ShortFile,
            "longfile" => Verb::LongFile,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Verb(Verb),
}

/// Text layout applied by [`LogRecord::formatted`].
///
/// A pattern mixes literal text with `%{verb}` directives:
///
/// | verb | output |
/// |---|---|
/// | `id` | record sequence number |
/// | `pid` | current process id |
/// | `time` | RFC 3339 UTC timestamp with milliseconds |
/// | `level` | `INFO`, `WARN`, ... |
/// | `module` | record module / target |
/// | `program` | executable name |
/// | `message` | plain message text |
/// | `shortfile` | `file.rs:line` of the selected frame |
/// | `longfile` | full path and line of the selected frame |
///
/// `%%` produces a literal percent sign. The pattern is parsed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pattern: String,
    segments: Vec<Segment>,
}

impl Layout {
    pub fn parse(pattern: &str) -> Result<Self, LayoutError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;
        let mut offset = 0;

        while let Some(pos) = rest.find('%') {
            literal.push_str(&rest[..pos]);
            let at = offset + pos;
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('%') {
                literal.push('%');
                offset = at + 2;
                rest = tail;
                continue;
            }

            let Some(body) = after.strip_prefix('{') else {
                return Err(LayoutError::DanglingPercent(at));
            };
            let Some(end) = body.find('}') else {
                return Err(LayoutError::Unterminated(at));
            };
            let name = &body[..end];
            let verb = Verb::parse(name).ok_or_else(|| LayoutError::UnknownVerb(name.to_string()))?;

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Verb(verb));

            // '%' + '{' + name + '}'
            let consumed = pos + 2 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Layout { pattern: pattern.to_string(), segments })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render `record`, taking the source location from `call_depth` frames up.
    pub fn format(&self, record: &LogRecord, call_depth: usize) -> String {
        let mut out = String::with_capacity(self.pattern.len() + record.message.len() + 48);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Verb(verb) => write_verb(&mut out, *verb, record, call_depth),
            }
        }
        out
    }
}

impl Default for Layout {
    fn default() -> Self {
        // DEFAULT_PATTERN only uses known verbs.
        Layout::parse(DEFAULT_PATTERN).unwrap_or_else(|_| Layout {
            pattern: "%{message}".to_string(),
            segments: vec![Segment::Verb(Verb::Message)],
        })
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layout::parse(s)
    }
}

fn write_verb(out: &mut String, verb: Verb, record: &LogRecord, call_depth: usize) {
    // Writing into a String cannot fail.
    let _ = match verb {
        Verb::Id => write!(out, "{}", record.id),
        Verb::Pid => write!(out, "{}", std::process::id()),
        Verb::Time => {
            out.push_str(&record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
            Ok(())
        }
        Verb::Level => write!(out, "{}", record.level),
        Verb::Module => {
            out.push_str(&record.module);
            Ok(())
        }
        Verb::Program => {
            out.push_str(program_name());
            Ok(())
        }
        Verb::Message => {
            out.push_str(&record.message);
            Ok(())
        }
        Verb::ShortFile => {
            match record.frame(call_depth) {
                Some(frame) => out.push_str(&frame.short()),
                None => out.push_str(UNKNOWN_LOCATION),
            }
            Ok(())
        }
        Verb::LongFile => {
            match record.frame(call_depth) {
                Some(frame) => out.push_str(&frame.long()),
                None => out.push_str(UNKNOWN_LOCATION),
            }
            Ok(())
        }
    };
}

/// Base name of the running executable.
pub fn program_name() -> &'static str {
    static PROGRAM: OnceLock<String> = OnceLock::new();
    PROGRAM.get_or_init(|| {
        std::env::args()
            .next()
            .as_deref()
            .and_then(|arg| std::path::Path::new(arg).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Frame;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tracing::Level;

    fn record(layout: Layout) -> LogRecord {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        LogRecord::new(7, Level::INFO, "core::net", "link up")
            .with_timestamp(ts)
            .with_frames(vec![Frame::new("src/layer.rs", 10), Frame::new("src/net/link.rs", 88)])
            .with_layout(Arc::new(layout))
    }

    #[test]
    fn default_layout_renders_all_parts() {
        let rec = record(Layout::default());
        assert_eq!(
            rec.formatted(1),
            "2024-03-09T14:05:07.000Z INFO [core::net] link.rs:88: link up"
        );
    }

    #[test]
    fn call_depth_selects_frame() {
        let rec = record(Layout::parse("%{shortfile}|%{longfile}").unwrap());
        assert_eq!(rec.formatted(0), "layer.rs:10|src/layer.rs:10");
        assert_eq!(rec.formatted(1), "link.rs:88|src/net/link.rs:88");
        assert_eq!(rec.formatted(5), "???|???");
    }

    #[test]
    fn percent_escape_and_literals() {
        let rec = record(Layout::parse("100%% #%{id} %{level}").unwrap());
        assert_eq!(rec.formatted(0), "100% #7 INFO");
    }

    #[test]
    fn pid_and_program() {
        let rec = record(Layout::parse("%{pid}:%{program}").unwrap());
        assert_eq!(rec.formatted(0), format!("{}:{}", std::process::id(), program_name()));
    }

    #[test]
    fn rejects_bad_patterns() {
        assert_eq!(
            Layout::parse("%{nope}"),
            Err(LayoutError::UnknownVerb("nope".to_string()))
        );
        assert_eq!(Layout::parse("x %{message"), Err(LayoutError::Unterminated(2)));
        assert_eq!(Layout::parse("50% off"), Err(LayoutError::DanglingPercent(2)));
    }

    #[test]
    fn keeps_pattern_text() {
        let layout: Layout = "%{message}".parse().unwrap();
        assert_eq!(layout.pattern(), "%{message}");
    }
}
