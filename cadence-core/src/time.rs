//! Time utilities: timezone-aware "now", wall-clock parsing, bucket indexes.

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

/// Parse a local timestamp like "2026-02-20 23:59" in an IANA tz like "America/Chicago",
/// returning UTC.
pub fn parse_local_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let ndt = parse_local(local)?;
    local_to_utc(ndt, tz)
}

/// "YYYY-MM-DD HH:MM" as a naive local timestamp.
pub fn parse_local(local: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(local.trim(), "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))
}

/// Pin a naive local timestamp to `tz`, returning UTC.
pub fn local_to_utc(ndt: NaiveDateTime, tz: &str) -> Result<DateTime<Utc>> {
    let tz = parse_tz(tz)?;
    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {ndt} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Wall-clock time in `tz` for the given UTC instant.
pub fn local_wall_clock(now_utc: DateTime<Utc>, tz: &str) -> Result<NaiveDateTime> {
    let tz = parse_tz(tz)?;
    Ok(now_utc.with_timezone(&tz).naive_local())
}

fn parse_tz(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

fn hhmm_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([01]?\d|2[0-3]):([0-5]\d)\s*$").expect("static HH:MM pattern")
    })
}

/// Parse "HH:MM" (24h). Returns `None` for anything malformed.
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let caps = hhmm_re().captures(s)?;
    let h: u32 = caps[1].parse().ok()?;
    let m: u32 = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

/// 0 = Monday ... 6 = Sunday.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// `date` at `hour:00`, or `None` if the hour is out of range.
pub fn at_hour(date: NaiveDate, hour: u32) -> Option<NaiveDateTime> {
    date.and_hms_opt(hour, 0, 0)
}

pub fn weekday_name(idx: u32) -> &'static str {
    match idx {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chicago_local() {
        // Feb is CST (UTC-6)
        let utc = parse_local_to_utc("2026-02-20 23:59", "America/Chicago").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-02-21T05:59:00+00:00");
    }

    #[test]
    fn test_wall_clock_roundtrip() {
        let utc = Utc.with_ymd_and_hms(2026, 2, 21, 15, 30, 0).unwrap();
        let local = local_wall_clock(utc, "America/Chicago").unwrap();
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2026-02-21 09:30");
        assert!(local_wall_clock(utc, "Mars/Olympus").is_err());
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("07:05"), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(parse_hhmm(" 9:30 "), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:7"), None);
        assert_eq!(parse_hhmm("noon"), None);
    }

    #[test]
    fn test_weekday_index_monday_first() {
        // 2026-03-02 is a Monday
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()), 0);
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()), 6);
    }
}
