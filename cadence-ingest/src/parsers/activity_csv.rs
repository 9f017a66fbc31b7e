//! Activity CSV exports.
//!
//! Expected layout (leading junk rows are skipped until the header):
//!   title,category,start,end,score,completed
//!   Yoga,health,2026-03-02 07:00,2026-03-02 07:45,4,true
//!
//! `score` (0-5) and `completed` may be empty; they default to a neutral
//! 2.5 and `true`.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::io::Read;
use std::path::Path;

use cadence_core::UserActivity;

use crate::types::{ActivitySource, ImportReport};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const NEUTRAL_SCORE: f64 = 2.5;

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

fn parse_completed(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn parse_score(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(NEUTRAL_SCORE);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an activity CSV file.
pub fn parse_activity_csv(path: impl AsRef<Path>) -> Result<ImportReport> {
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    read_records(rdr)
}

/// Parse activity CSV text already in memory.
pub fn parse_activity_csv_str(text: &str) -> Result<ImportReport> {
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes());
    read_records(rdr)
}

fn parse_row(record: &csv::StringRecord) -> Option<UserActivity> {
    let field = |i: usize| record.get(i).unwrap_or("").trim();
    let title = field(0);
    if title.is_empty() {
        return None;
    }
    let start = parse_timestamp(field(2))?;
    let end = parse_timestamp(field(3))?;
    if end <= start {
        return None;
    }
    let score = parse_score(field(4))?;
    let completed = parse_completed(field(5))?;

    let activity = UserActivity::new(title, field(1), start, end, score);
    Some(if completed { activity } else { activity.not_completed() })
}

fn read_records<R: Read>(mut rdr: csv::Reader<R>) -> Result<ImportReport> {
    let mut report = ImportReport::new(ActivitySource::Csv);
    let mut header_found = false;

    for (idx, result) in rdr.byte_records().enumerate() {
        let raw = result.with_context(|| format!("reading csv row {}", idx + 1))?;
        let record = match csv::StringRecord::from_byte_record(raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(row = idx + 1, error = %e, "ingest: skipping non-utf8 csv row");
                if header_found {
                    report.skipped += 1;
                }
                continue;
            }
        };
        if !header_found {
            if record
                .get(0)
                .is_some_and(|s| s.trim().eq_ignore_ascii_case("title"))
            {
                header_found = true;
            }
            continue;
        }

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let Some(activity) = parse_row(&record) else {
            tracing::debug!(row = idx + 1, "ingest: skipping malformed csv row");
            report.skipped += 1;
            continue;
        };
        report.activities.push(activity);
    }

    if !header_found {
        tracing::warn!("ingest: no `title,...` header row found in csv");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_activity_csv_basic() {
        let text = "\
exported by tracker,,,,,
title,category,start,end,score,completed
Yoga,health,2026-03-02 07:00,2026-03-02 07:45,4,true
Email,admin,2026-03-02 09:00,2026-03-02 09:30,,
Taxes,admin,2026-03-02 15:00,2026-03-02 16:00,1,no
";
        let report = parse_activity_csv_str(text).unwrap();
        assert_eq!(report.source, ActivitySource::Csv);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.activities.len(), 3);

        let yoga = &report.activities[0];
        assert_eq!(yoga.title, "Yoga");
        assert_eq!(yoga.category, "health");
        assert_eq!((yoga.start, yoga.end), (at(2, 7, 0), at(2, 7, 45)));
        assert_eq!(yoga.productivity, 4.0);

        assert_eq!(report.activities[1].productivity, 2.5);
        assert!(report.activities[1].completed);
        assert!(!report.activities[2].completed);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let text = "\
title,category,start,end,score,completed
,health,2026-03-02 07:00,2026-03-02 07:45,4,true
Yoga,health,03/02/2026 7am,2026-03-02 07:45,4,true
Backwards,work,2026-03-02 10:00,2026-03-02 09:00,3,true
Score,work,2026-03-02 10:00,2026-03-02 11:00,great,true
,,,,,
Ok,work,2026-03-02 10:00,2026-03-02 11:00,9,true
";
        let report = parse_activity_csv_str(text).unwrap();
        assert_eq!(report.skipped, 4);
        assert_eq!(report.activities.len(), 1);
        // clamped to the 0-5 scale
        assert_eq!(report.activities[0].productivity, 5.0);
    }

    #[test]
    fn non_utf8_row_is_skipped_not_fatal() {
        let mut bytes = b"title,category,start,end,score,completed\n".to_vec();
        bytes.extend_from_slice(b"Yoga,health,2026-03-02 07:00,2026-03-02 07:45,4,true\n");
        bytes.extend_from_slice(b"Bad\xff\xfe,work,2026-03-02 09:00,2026-03-02 10:00,3,true\n");
        bytes.extend_from_slice(b"Email,admin,2026-03-02 10:00,2026-03-02 10:30,2,true\n");

        let rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(bytes.as_slice());
        let report = read_records(rdr).unwrap();
        assert_eq!(report.activities.len(), 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.activities[1].title, "Email");
    }

    #[test]
    fn missing_header_yields_nothing() {
        let text = "Yoga,health,2026-03-02 07:00,2026-03-02 07:45,4,true\n";
        let report = parse_activity_csv_str(text).unwrap();
        assert!(report.is_empty());
    }
}
