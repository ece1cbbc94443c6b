//! `reporter-client`: the report service contract and its HTTP implementation.

pub mod client;
pub mod http;

pub use client::{ClientError, CreateOutcome, FetchOutcome, ReportClient};
pub use http::HttpReportClient;
