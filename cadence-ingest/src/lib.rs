//! cadence-ingest: turns external activity logs (CSV exports, time-tracker text) into `UserActivity` history.

pub mod parsers;
pub mod types;

pub use parsers::activity_csv::{parse_activity_csv, parse_activity_csv_str};
pub use parsers::time_log::parse_time_log;
pub use types::{ActivitySource, ImportReport};
