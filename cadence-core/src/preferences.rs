//! User preferences consumed read-only by the scheduler.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::time::weekday_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl DayHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self { start_hour, end_hour }
    }

    /// Clamp to 0..=24 and make sure end is not before start.
    pub fn sanitized(self) -> Self {
        let start = self.start_hour.min(24);
        let end = self.end_hour.min(24).max(start);
        Self::new(start, end)
    }

    pub fn minutes(&self) -> i64 {
        let s = self.sanitized();
        (s.end_hour as i64 - s.start_hour as i64) * 60
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub work_hours: DayHours,
    /// Per-weekday overrides keyed by 0 = Monday ... 6 = Sunday.
    pub day_overrides: BTreeMap<u32, DayHours>,
    /// Weekday indexes counted as work days.
    pub work_days: Vec<u32>,

    pub include_breakfast: bool,
    pub include_lunch: bool,
    pub include_dinner: bool,

    pub breaks_enabled: bool,
    /// Short break minutes.
    pub break_minutes: i64,
    pub long_break_minutes: i64,
    pub sessions_before_long_break: u32,

    pub preferred_categories: Vec<String>,
    pub location: Option<String>,
    pub timezone: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            work_hours: DayHours::new(9, 17),
            day_overrides: BTreeMap::new(),
            work_days: vec![0, 1, 2, 3, 4],
            include_breakfast: true,
            include_lunch: true,
            include_dinner: true,
            breaks_enabled: true,
            break_minutes: 15,
            long_break_minutes: 30,
            sessions_before_long_break: 4,
            preferred_categories: Vec::new(),
            location: None,
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl UserPreferences {
    /// Work hours for `date`, honouring the weekday override.
    pub fn hours_for(&self, date: NaiveDate) -> DayHours {
        self.day_overrides
            .get(&weekday_index(date))
            .copied()
            .unwrap_or(self.work_hours)
            .sanitized()
    }

    pub fn is_work_day(&self, date: NaiveDate) -> bool {
        self.work_days.contains(&weekday_index(date))
    }

    pub fn prefers_category(&self, category: &str) -> bool {
        !category.is_empty()
            && self
                .preferred_categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
    }

    pub fn without_meals(mut self) -> Self {
        self.include_breakfast = false;
        self.include_lunch = false;
        self.include_dinner = false;
        self
    }

    pub fn without_breaks(mut self) -> Self {
        self.breaks_enabled = false;
        self
    }
}
