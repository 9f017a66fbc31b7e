//! Completed activity records: the only training signal for the habit,
//! performance and pattern models.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::task::Task;

pub const MAX_PRODUCTIVITY: f64 = 5.0;

/// An immutable record of something the user did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// 0-5 self-reported (or inferred) productivity.
    pub productivity: f64,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

impl UserActivity {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        productivity: f64,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            start,
            end,
            productivity: clamp_productivity(productivity),
            completed: true,
        }
    }

    /// Build the record for a finished task.
    ///
    /// Without an actual duration the estimate is used; an unestimated task
    /// gets a zero-length record, which the models skip for duration stats.
    pub fn from_task(task: &Task, finished_at: NaiveDateTime, productivity: f64) -> Self {
        let minutes = task
            .actual_duration
            .filter(|m| *m > 0)
            .or_else(|| task.estimate().map(|m| m as i32))
            .unwrap_or(0);
        let start = finished_at - chrono::Duration::minutes(minutes as i64);
        Self::new(task.title.clone(), task.category.clone(), start, finished_at, productivity)
    }

    pub fn not_completed(mut self) -> Self {
        self.completed = false;
        self
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn start_hour(&self) -> u32 {
        self.start.hour()
    }

    /// Productivity mapped onto 0..=1.
    pub fn normalized_productivity(&self) -> f64 {
        clamp_productivity(self.productivity) / MAX_PRODUCTIVITY
    }
}

pub fn clamp_productivity(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, MAX_PRODUCTIVITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn productivity_is_clamped_and_normalized() {
        let a = UserActivity::new("Run", "health", at(7, 0), at(7, 30), 9.0);
        assert_eq!(a.productivity, 5.0);
        assert_eq!(a.normalized_productivity(), 1.0);
        assert_eq!(a.duration_minutes(), 30);
        assert_eq!(a.start_hour(), 7);
    }

    #[test]
    fn from_task_prefers_actual_duration() {
        let mut t = Task::new("t1", "Write report").with_duration(60);
        t.actual_duration = Some(90);
        let a = UserActivity::from_task(&t, at(12, 0), 4.0);
        assert_eq!(a.start, at(10, 30));
        assert_eq!(a.duration_minutes(), 90);

        t.actual_duration = None;
        let b = UserActivity::from_task(&t, at(12, 0), 4.0);
        assert_eq!(b.duration_minutes(), 60);
    }
}
