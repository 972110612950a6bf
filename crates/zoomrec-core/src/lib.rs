//! Core helpers: date ranges, file naming, tracing setup

pub mod naming;
pub mod time;
pub mod tracing;

pub use naming::sanitize_topic;
pub use time::{DateRange, DateRangeError};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
