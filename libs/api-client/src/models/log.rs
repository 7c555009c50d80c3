use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application log line, as returned by the log history and the live stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(rename = "_source")]
    pub source: LogSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSource {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "@message")]
    pub message: String,

    #[serde(default)]
    pub syslog_program: Option<String>,
}

impl LogLine {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.source.timestamp
    }

    pub fn message(&self) -> &str {
        &self.source.message
    }
}
