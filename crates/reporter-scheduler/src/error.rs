use reporter_client::ClientError;
use reporter_core::ReportId;
use reporter_sink::SinkError;
use thiserror::Error;

/// Fatal scheduler errors. Any of these ends the run loop.
///
/// Domain outcomes (already exists, not ready, not found) never appear here;
/// they are handled inline by the engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The create call failed at the transport or service level.
    #[error("create report {report_id} failed: {source}")]
    Create {
        report_id: ReportId,
        #[source]
        source: ClientError,
    },

    /// The fetch call failed at the transport or service level.
    #[error("fetch report {report_id} failed: {source}")]
    Fetch {
        report_id: ReportId,
        #[source]
        source: ClientError,
    },

    /// A ready result could not be persisted; the result is lost.
    #[error("persist report {report_id} failed: {source}")]
    Sink {
        report_id: ReportId,
        #[source]
        source: SinkError,
    },
}

impl SchedulerError {
    pub fn report_id(&self) -> &ReportId {
        match self {
            SchedulerError::Create { report_id, .. }
            | SchedulerError::Fetch { report_id, .. }
            | SchedulerError::Sink { report_id, .. } => report_id,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
