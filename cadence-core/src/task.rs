//! Task model consumed and produced by the day scheduler.
//!
//! The authoritative copy of a task lives in a [`crate::store::TaskStore`];
//! the scheduler only reads tasks and hands back explicit updates.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

/// Core task type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-form category ("work", "health", ...).
    #[serde(default)]
    pub category: String,

    /// 1-5, 5 highest.
    pub priority: u8,

    /// 1-5 difficulty.
    pub difficulty: u8,

    /// Minutes. Anything <= 0 means "unestimated".
    #[serde(default)]
    pub estimated_duration: i32,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,

    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    /// Minutes actually spent, set on completion.
    #[serde(default)]
    pub actual_duration: Option<i32>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            priority: 3,
            difficulty: 3,
            estimated_duration: 0,
            due_date: None,
            scheduled_date: None,
            completed: false,
            completed_at: None,
            actual_duration: None,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
        self
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty.clamp(1, 5);
        self
    }

    pub fn with_duration(mut self, minutes: i32) -> Self {
        self.estimated_duration = minutes;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_scheduled(mut self, date: NaiveDate) -> Self {
        self.scheduled_date = Some(date);
        self
    }

    /// Estimated minutes, or `None` when the task is unestimated.
    pub fn estimate(&self) -> Option<i64> {
        (self.estimated_duration > 0).then_some(self.estimated_duration as i64)
    }

    /// Signed whole days from `day` until the due date (negative when overdue).
    pub fn days_until_due(&self, day: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - day).num_days())
    }

    pub fn is_overdue(&self, day: NaiveDate) -> bool {
        self.days_until_due(day).is_some_and(|d| d < 0)
    }

    /// Mark the task done, recording when and how long it actually took.
    pub fn complete(&mut self, at: NaiveDateTime, actual_minutes: Option<i32>) {
        self.completed = true;
        self.completed_at = Some(at);
        self.actual_duration = actual_minutes.filter(|m| *m > 0);
    }
}
