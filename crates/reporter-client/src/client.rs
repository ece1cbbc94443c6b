use async_trait::async_trait;

use reporter_core::ReportId;

/// Result of asking the service to create a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The job was accepted under this id.
    Created(ReportId),
    /// A job with this id is already known to the service.
    AlreadyExists(ReportId),
}

/// Result of asking the service for a report's value.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The report finished; carries the decoded `value` field.
    Ready(serde_json::Value),
    /// The report exists but is still being computed.
    NotReady,
    /// The service does not know this id.
    NotFound,
}

/// Transport-level or service-level failure. Always fatal to the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status ({status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

/// The two remote operations the scheduler depends on.
///
/// Implementations translate every transport outcome into either a domain
/// outcome or a [`ClientError`]; callers never see raw HTTP details.
#[async_trait]
pub trait ReportClient: Send + Sync {
    async fn create_report(&self, id: &ReportId) -> Result<CreateOutcome, ClientError>;

    async fn fetch_report(&self, id: &ReportId) -> Result<FetchOutcome, ClientError>;
}
