#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Wall-clock timing of nested named operations.
//!
//! This package measures how long named operations take, keeping track of which
//! operations happened inside which others, and accumulates the time spent in
//! repeated passes through a hot piece of code.
//!
//! The core functionality includes:
//! - [`Session`] - Owns all measurements of one run and routes calls by name
//! - [`MeasurementTree`] - A root measurement and everything measured while it ran
//! - [`AggregateMeasurement`] - Pass count and total time of a repeated operation
//! - [`Report`] - Snapshot of a session, rendered as an indented tree
//!
//! # Nested measurements
//!
//! Measurements are started and stopped by name. A measurement started while
//! another one is running becomes its child:
//!
//! ```
//! use nested_stopwatch::Session;
//!
//! let mut session = Session::new();
//!
//! session.start("request");
//! session.start("database");
//! session.stop("database");
//! session.start("render");
//! session.mark("template_loaded");
//! session.stop("render");
//! session.stop("request");
//!
//! // Prints the tree with elapsed milliseconds:
//! // request: 0
//! // ├── database: 0
//! // └── render: 0
//! //     └── template_loaded: 0
//! session.print_to_stdout();
//! ```
//!
//! # Aggregated measurements
//!
//! Timing every pass of a loop as its own measurement would flood the tree with
//! siblings. An aggregate instead folds the passes into one pass count and one
//! total for the report. The individual passes are still kept for inspection, so
//! memory grows by one measurement per pass:
//!
//! ```
//! use nested_stopwatch::Session;
//!
//! let mut session = Session::new();
//!
//! for i in 0..1000 {
//!     session.start_aggregate("loop_body");
//!     std::hint::black_box(i * 2);
//!     session.pause_aggregate("loop_body");
//! }
//!
//! let aggregate = session.aggregate("loop_body").unwrap();
//! assert_eq!(aggregate.count(), 1000);
//! assert_eq!(aggregate.passes().len(), 1000);
//! ```
//!
//! # Misuse is not fatal
//!
//! Calls made in the wrong order, such as stopping an outer measurement while an
//! inner one is still running, are rejected without panicking: the call returns
//! `None` and the [`Error`] is passed to an optional handler. Instrumentation must
//! never break the code it instruments.
//!
//! ```
//! use nested_stopwatch::Session;
//!
//! let mut session = Session::builder()
//!     .on_error(|error| eprintln!("stopwatch: {error}"))
//!     .build();
//!
//! session.start("outer");
//! session.start("inner");
//! assert!(session.stop("outer").is_none()); // "inner" is still running.
//! ```
//!
//! # Disabling
//!
//! A session can be disabled, after which every call is a no-op that does not even
//! read the clock. This allows instrumentation to stay in place in production code.
//!
//! # Threading
//!
//! A session records one logical sequence of calls, such as one request. Mutating
//! methods take `&mut self`; use one session per thread of control.

mod aggregate;
mod error;
mod measurement;
mod pal;
mod report;
mod session;
mod session_builder;

pub use aggregate::AggregateMeasurement;
pub use error::Error;
pub use measurement::{Measurement, MeasurementId, MeasurementTree};
pub use report::{Report, ReportAggregate};
pub use session::{MeasurementHandle, Session};
pub use session_builder::SessionBuilder;
