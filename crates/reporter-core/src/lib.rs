//! `reporter-core`: shared configuration, error and data types.

pub mod config;
pub mod error;
pub mod types;

pub use config::ReporterConfig;
pub use error::{ReporterError, Result};
pub use types::{ReportId, ResultRecord};
