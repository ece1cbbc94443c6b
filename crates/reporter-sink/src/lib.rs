//! `reporter-sink`: durable storage for completed report results.

pub mod csv;
pub mod error;

pub use csv::CsvSink;
pub use error::{Result, SinkError};

use reporter_core::ResultRecord;

/// Destination for completed results.
///
/// `append` is synchronous and must only return `Ok` once the record is
/// durable. The scheduler relies on there being no await point between a
/// fetch returning and its record being written.
pub trait ResultSink: Send {
    fn append(&mut self, record: &ResultRecord) -> Result<()>;
}
