use anyhow::Result;
use cadence_core::time::local_to_utc;
use cadence_core::{ItemKind, Schedule};
use chrono::{DateTime, Utc};

pub struct CalendarEvent {
    pub uid: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

/// One event per schedule item, pinned to the user's timezone.
pub fn schedule_to_events(schedule: &Schedule, tz: &str) -> Result<Vec<CalendarEvent>> {
    let day = schedule.date.format("%Y%m%d");
    schedule
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let description = match &item.kind {
                ItemKind::Task { task_id } => format!("TaskId: {task_id}\n"),
                ItemKind::Break => "Break\n".to_string(),
                ItemKind::Meal => "Meal\n".to_string(),
            };
            Ok(CalendarEvent {
                uid: format!("cadence-{day}-{i}@cadence"),
                start_utc: local_to_utc(item.start, tz)?,
                end_utc: local_to_utc(item.end, tz)?,
                summary: item.title.clone(),
                description,
            })
        })
        .collect()
}

/// Emit a minimal ICS calendar containing VEVENT blocks.
///
/// DTSTART/DTEND are UTC. UIDs are stable per date and item position.
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Cadence//EN\n");

    for e in events {
        let dtstart = e.start_utc.format("%Y%m%dT%H%M%SZ");
        let dtend = e.end_utc.format("%Y%m%dT%H%M%SZ");

        s.push_str("BEGIN:VEVENT\n");
        s.push_str(&format!("UID:{}\n", e.uid));
        s.push_str(&format!("DTSTART:{}\n", dtstart));
        s.push_str(&format!("DTEND:{}\n", dtend));
        s.push_str(&format!("SUMMARY:{}\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\n");
    }

    s.push_str("END:VCALENDAR\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::ScheduleItem;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn schedule_exports_as_utc_events() {
        let mut s = Schedule::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        s.items.push(ScheduleItem::task("t1", "Write report, draft 2", at(9, 0), at(10, 0)));
        s.items.push(ScheduleItem::rest("Break", at(10, 0), at(10, 15)));

        let events = schedule_to_events(&s, "America/Chicago").unwrap();
        let ics = events_to_ics(&events);

        // March 2 is still CST (UTC-6)
        assert!(ics.contains("DTSTART:20260302T150000Z"));
        assert!(ics.contains("DTEND:20260302T161500Z"));
        assert!(ics.contains("SUMMARY:Write report\\, draft 2"));
        assert!(ics.contains("DESCRIPTION:TaskId: t1\\n"));
        assert!(ics.contains("UID:cadence-20260302-1@cadence"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
    }

    #[test]
    fn bad_timezone_is_an_error() {
        let mut s = Schedule::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        s.items.push(ScheduleItem::meal("Lunch", at(12, 30), at(13, 30)));
        assert!(schedule_to_events(&s, "Nowhere/Special").is_err());
    }
}
