pub mod activity_csv;
pub mod time_log;
