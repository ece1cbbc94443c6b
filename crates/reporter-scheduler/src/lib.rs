//! `reporter-scheduler`: single-threaded report lifecycle scheduler.
//!
//! # Overview
//!
//! The [`engine::SchedulerEngine`] runs one cooperative loop. Every tick it
//! optionally creates a report (on the create cadence) and then polls the
//! oldest pending report once.
//!
//! # Poll outcomes
//!
//! | Outcome    | Effect                                            |
//! |------------|---------------------------------------------------|
//! | `Ready`    | Record appended to the sink, id dropped           |
//! | `NotReady` | Id requeued at the tail (round-robin)             |
//! | `NotFound` | Id dropped with a warning                         |
//! | failure    | Loop ends with [`SchedulerError`]                 |

pub mod engine;
pub mod error;
pub mod schedule;
pub mod types;

pub use engine::SchedulerEngine;
pub use error::{Result, SchedulerError};
pub use schedule::{CreateCadence, IntervalTicker, SleepTicker, Ticker};
pub use types::{Admission, PendingQueue, ReportEvent, TickReport};
