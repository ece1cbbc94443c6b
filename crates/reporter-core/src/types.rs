use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a remote report job.
///
/// Generated client-side before the remote job exists, so the service only
/// ever sees ids it was asked to create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl ReportId {
    /// Fresh random id: UUIDv4 as 32 lowercase hex digits, no dashes.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReportId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReportId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One completed report result, as appended to the result log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Unix epoch seconds with sub-second precision.
    pub timestamp: f64,
    /// The `value` field of the report body, JSON-decoded.
    pub value: serde_json::Value,
}

impl ResultRecord {
    pub fn new(timestamp: f64, value: serde_json::Value) -> Self {
        Self { timestamp, value }
    }

    /// Record stamped with the current wall-clock time.
    pub fn now(value: serde_json::Value) -> Self {
        Self::new(epoch_seconds(chrono::Utc::now()), value)
    }
}

/// Seconds since the Unix epoch, microsecond precision.
pub fn epoch_seconds(at: chrono::DateTime<chrono::Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}
