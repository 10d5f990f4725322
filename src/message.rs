use crate::record::LogRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured log entry published under [`Style::Structured`](crate::style::Style).
///
/// Zero and empty fields are left out of the JSON object entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub id: u64,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub level: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub program: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(rename = "longFileName", default, skip_serializing_if = "String::is_empty")]
    pub long_file: String,
    #[serde(rename = "shortFileName", default, skip_serializing_if = "String::is_empty")]
    pub short_file: String,
    #[serde(rename = "callPath", default, skip_serializing_if = "String::is_empty")]
    pub call_path: String,
}

impl LogMessage {
    /// Entry carrying the record's id, time, message, level and module.
    /// Process, program and source-location fields stay empty.
    pub fn from_record(record: &LogRecord) -> Self {
        LogMessage {
            id: record.id,
            time: Some(record.timestamp),
            level: record.level_name(),
            module: record.module.clone(),
            message: record.message().to_string(),
            ..LogMessage::default()
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tracing::Level;

    #[test]
    fn empty_fields_are_omitted() {
        let json = serde_json::to_string(&LogMessage::default()).unwrap();
        assert_eq!(json, "{}");

        let msg = LogMessage { pid: 12, short_file: "a.rs:1".into(), ..Default::default() };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"pid":12,"shortFileName":"a.rs:1"}"#);
    }

    #[test]
    fn from_record_populates_five_fields() {
        let ts = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        let rec = LogRecord::new(42, Level::INFO, "core", "started").with_timestamp(ts);
        let bytes = LogMessage::from_record(&rec).to_vec().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 42,
                "time": "2023-01-02T03:04:05Z",
                "level": "INFO",
                "module": "core",
                "message": "started"
            })
        );
    }

    #[test]
    fn zero_id_is_omitted() {
        let rec = LogRecord::new(0, Level::DEBUG, "", "only text");
        let value: serde_json::Value = serde_json::to_value(LogMessage::from_record(&rec)).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("module"));
        assert_eq!(obj["message"], "only text");
    }

    #[test]
    fn reads_back_camel_case_keys() {
        let msg: LogMessage =
            serde_json::from_str(r#"{"longFileName":"/x/y.rs:3","callPath":"main.run"}"#).unwrap();
        assert_eq!(msg.long_file, "/x/y.rs:3");
        assert_eq!(msg.call_path, "main.run");
    }
}
