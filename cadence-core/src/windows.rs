//! Work-window construction: the day's hours minus meals and busy slots.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::context::BusySlot;
use crate::preferences::{DayHours, UserPreferences};
use crate::schedule::ScheduleItem;
use crate::time::at_hour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// The fixed reservations and free sub-windows for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayFrame {
    pub work: Option<Interval>,
    pub meals: Vec<ScheduleItem>,
    pub windows: Vec<Interval>,
}

impl DayFrame {
    pub fn build(date: NaiveDate, prefs: &UserPreferences, busy: &[BusySlot]) -> Self {
        let hours = prefs.hours_for(date);
        let work = work_interval(date, hours);
        let meals = meal_items(date, hours, prefs);

        let mut reserved: Vec<Interval> = meals.iter().map(|m| Interval::new(m.start, m.end)).collect();
        reserved.extend(busy.iter().map(|b| Interval::new(b.start, b.end)));

        let windows = match work {
            Some(w) => subtract(w, &mut reserved),
            None => Vec::new(),
        };
        Self { work, meals, windows }
    }

    /// Minutes available for tasks after reservations.
    pub fn free_minutes(&self) -> i64 {
        self.windows.iter().map(Interval::minutes).sum()
    }
}

fn work_interval(date: NaiveDate, hours: DayHours) -> Option<Interval> {
    let start = at_hour(date, hours.start_hour)?;
    let end = if hours.end_hour >= 24 {
        date.succ_opt()?.and_hms_opt(0, 0, 0)?
    } else {
        at_hour(date, hours.end_hour)?
    };
    (end > start).then(|| Interval::new(start, end))
}

fn slot(date: NaiveDate, h: u32, m: u32, minutes: i64) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = date.and_time(NaiveTime::from_hms_opt(h, m, 0)?);
    Some((start, start + chrono::Duration::minutes(minutes)))
}

/// Breakfast 08:00 (30 min) when the day starts by 09:00, lunch 12:30 (60 min),
/// dinner 19:00 (60 min) when work runs until at least 19:00.
pub fn meal_items(date: NaiveDate, hours: DayHours, prefs: &UserPreferences) -> Vec<ScheduleItem> {
    let mut meals = Vec::new();
    if prefs.include_breakfast && hours.start_hour <= 9 {
        if let Some((s, e)) = slot(date, 8, 0, 30) {
            meals.push(ScheduleItem::meal("Breakfast", s, e));
        }
    }
    if prefs.include_lunch {
        if let Some((s, e)) = slot(date, 12, 30, 60) {
            meals.push(ScheduleItem::meal("Lunch", s, e));
        }
    }
    if prefs.include_dinner && hours.end_hour >= 19 {
        if let Some((s, e)) = slot(date, 19, 0, 60) {
            meals.push(ScheduleItem::meal("Dinner", s, e));
        }
    }
    meals
}

/// `work` minus every reserved interval, in order.
pub fn subtract(work: Interval, reserved: &mut [Interval]) -> Vec<Interval> {
    reserved.sort_by_key(|r| (r.start, r.end));
    let mut out = Vec::new();
    let mut cursor = work.start;
    for r in reserved.iter() {
        if r.end <= cursor {
            continue;
        }
        if r.start >= work.end {
            break;
        }
        if r.start > cursor {
            out.push(Interval::new(cursor, r.start.min(work.end)));
        }
        cursor = cursor.max(r.end);
    }
    if cursor < work.end {
        out.push(Interval::new(cursor, work.end));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        date().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn no_meals_single_window() {
        let prefs = UserPreferences::default().without_meals();
        let frame = DayFrame::build(date(), &prefs, &[]);
        assert!(frame.meals.is_empty());
        assert_eq!(frame.windows, vec![Interval::new(at(9, 0), at(17, 0))]);
        assert_eq!(frame.free_minutes(), 480);
    }

    #[test]
    fn meals_split_the_day() {
        let mut prefs = UserPreferences::default();
        prefs.work_hours = DayHours::new(8, 20);
        let frame = DayFrame::build(date(), &prefs, &[]);
        let titles: Vec<&str> = frame.meals.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Breakfast", "Lunch", "Dinner"]);
        assert_eq!(
            frame.windows,
            vec![
                Interval::new(at(8, 30), at(12, 30)),
                Interval::new(at(13, 30), at(19, 0)),
            ]
        );
        assert_eq!(frame.free_minutes(), 12 * 60 - 30 - 60 - 60);
    }

    #[test]
    fn late_start_skips_breakfast_and_early_end_skips_dinner() {
        let mut prefs = UserPreferences::default();
        prefs.work_hours = DayHours::new(10, 18);
        let frame = DayFrame::build(date(), &prefs, &[]);
        let titles: Vec<&str> = frame.meals.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Lunch"]);
    }

    #[test]
    fn busy_slots_are_carved_out() {
        let prefs = UserPreferences::default().without_meals();
        let busy = vec![BusySlot {
            title: "Standup".into(),
            start: at(9, 30),
            end: at(10, 0),
        }];
        let frame = DayFrame::build(date(), &prefs, &busy);
        assert_eq!(
            frame.windows,
            vec![
                Interval::new(at(9, 0), at(9, 30)),
                Interval::new(at(10, 0), at(17, 0)),
            ]
        );
    }

    #[test]
    fn overlapping_reservations_merge() {
        let work = Interval::new(at(9, 0), at(12, 0));
        let mut reserved = vec![
            Interval::new(at(10, 0), at(11, 0)),
            Interval::new(at(8, 0), at(9, 15)),
            Interval::new(at(10, 30), at(11, 30)),
        ];
        assert_eq!(
            subtract(work, &mut reserved),
            vec![
                Interval::new(at(9, 15), at(10, 0)),
                Interval::new(at(11, 30), at(12, 0)),
            ]
        );
    }

    #[test]
    fn empty_work_day_has_no_windows() {
        let mut prefs = UserPreferences::default().without_meals();
        prefs.work_hours = DayHours::new(9, 9);
        let frame = DayFrame::build(date(), &prefs, &[]);
        assert!(frame.work.is_none());
        assert!(frame.windows.is_empty());
    }
}
