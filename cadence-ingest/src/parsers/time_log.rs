//! Plain-text time-tracker logs.
//!
//! One entry per line:
//!   2026-03-02 07:00-07:45 Yoga [health] 4
//!   2026-03-02 14:00-15:30 Taxes [admin] 1 !
//!
//! The `[category]` is optional. A 0-5 score is only read after it, so a
//! title may end in a number (`Read chapter 3`); use `[]` for a scored entry
//! without a category. A trailing `!` marks an entry that was started but
//! not completed. An end time earlier than the start rolls over to the next
//! day. Blank lines and `#` comments are ignored.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use regex::Regex;

use cadence_core::time::parse_hhmm;
use cadence_core::UserActivity;

use crate::types::{ActivitySource, ImportReport};

const NEUTRAL_SCORE: f64 = 2.5;

/// Parse a time-tracker log into activities.
pub fn parse_time_log(text: &str) -> Result<ImportReport> {
    let line_re = Regex::new(concat!(
        r"^\s*(?P<date>\d{4}-\d{2}-\d{2})\s+",
        r"(?P<start>\d{1,2}:\d{2})\s*-\s*(?P<end>\d{1,2}:\d{2})\s+",
        r"(?P<title>.+?)",
        r"(?:\s+\[(?P<category>[^\]]*)\](?:\s+(?P<score>\d+(?:\.\d+)?))?)?",
        r"\s*(?P<missed>!)?\s*$"
    ))?;

    let mut report = ImportReport::new(ActivitySource::TimeLog);

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(caps) = line_re.captures(line) else {
            tracing::debug!(line = idx + 1, "ingest: unrecognized time log line");
            report.skipped += 1;
            continue;
        };

        let parsed = (|| {
            let date = NaiveDate::parse_from_str(&caps["date"], "%Y-%m-%d").ok()?;
            let start = date.and_time(parse_hhmm(&caps["start"])?);
            let mut end = date.and_time(parse_hhmm(&caps["end"])?);
            if end < start {
                end += Duration::days(1);
            }
            (end > start).then_some((start, end))
        })();

        let Some((start, end)) = parsed else {
            tracing::debug!(line = idx + 1, "ingest: invalid date or time in time log");
            report.skipped += 1;
            continue;
        };

        let score = caps
            .name("score")
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(NEUTRAL_SCORE);
        let category = caps.name("category").map(|m| m.as_str().trim()).unwrap_or("");

        let mut activity = UserActivity::new(caps["title"].trim(), category, start, end, score);
        if caps.name("missed").is_some() {
            activity = activity.not_completed();
        }
        report.activities.push(activity);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_time_log_basic() {
        let text = r#"
# week 10
2026-03-02 07:00-07:45 Yoga [health] 4
2026-03-02 09:00 - 09:30 Email triage [admin]
2026-03-02 14:00-15:30 Taxes [admin] 1 !
2026-03-03 18:00-18:40 Run [] 5
2026-03-04 20:00-20:30 Read chapter 3
"#;
        let report = parse_time_log(text).unwrap();
        assert_eq!(report.source, ActivitySource::TimeLog);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.activities.len(), 5);

        let yoga = &report.activities[0];
        assert_eq!(yoga.title, "Yoga");
        assert_eq!(yoga.category, "health");
        assert_eq!((yoga.start, yoga.end), (at(2, 7, 0), at(2, 7, 45)));
        assert_eq!(yoga.productivity, 4.0);
        assert!(yoga.completed);

        let email = &report.activities[1];
        assert_eq!(email.title, "Email triage");
        assert_eq!(email.productivity, 2.5);

        let taxes = &report.activities[2];
        assert_eq!(taxes.productivity, 1.0);
        assert!(!taxes.completed);

        let run = &report.activities[3];
        assert_eq!(run.title, "Run");
        assert_eq!(run.category, "");
        assert_eq!(run.productivity, 5.0);

        let reading = &report.activities[4];
        assert_eq!(reading.title, "Read chapter 3");
        assert_eq!(reading.productivity, 2.5);
    }

    #[test]
    fn end_before_start_rolls_to_next_day() {
        let report = parse_time_log("2026-03-02 23:30-00:15 Reading [learning] 3").unwrap();
        let a = &report.activities[0];
        assert_eq!(a.end, at(3, 0, 15));
        assert_eq!(a.duration_minutes(), 45);
    }

    #[test]
    fn garbage_lines_are_counted_and_skipped() {
        let text = "\
went for a walk
2026-02-30 07:00-07:45 Yoga
2026-03-02 25:00-26:00 Nope
2026-03-02 08:00-08:00 Zero
2026-03-02 10:00-11:00 Kept [work]
";
        let report = parse_time_log(text).unwrap();
        assert_eq!(report.skipped, 4);
        assert_eq!(report.activities.len(), 1);
        assert_eq!(report.activities[0].title, "Kept");
    }
}
