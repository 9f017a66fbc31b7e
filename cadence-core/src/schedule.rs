//! Daily schedule produced by the scheduler.
//!
//! serde-ready for the stores and the CLI's JSON/ICS export.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Total task minutes above which a day counts as overloaded.
pub const OVERLOAD_MINUTES: i64 = 480;

/// What a schedule slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemKind {
    Task { task_id: String },
    Break,
    Meal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    #[serde(flatten)]
    pub kind: ItemKind,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub completed: bool,
}

impl ScheduleItem {
    pub fn task(
        task_id: impl Into<String>,
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            kind: ItemKind::Task { task_id: task_id.into() },
            title: title.into(),
            start,
            end,
            completed: false,
        }
    }

    pub fn rest(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            kind: ItemKind::Break,
            title: title.into(),
            start,
            end,
            completed: false,
        }
    }

    pub fn meal(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            kind: ItemKind::Meal,
            title: title.into(),
            start,
            end,
            completed: false,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn task_id(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Task { task_id } => Some(task_id),
            ItemKind::Break | ItemKind::Meal => None,
        }
    }

    pub fn is_task(&self) -> bool {
        matches!(self.kind, ItemKind::Task { .. })
    }

    pub fn overlaps(&self, other: &ScheduleItem) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// An ordered, non-overlapping agenda for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: NaiveDate,
    pub items: Vec<ScheduleItem>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub completed: bool,
    /// 0-100.
    #[serde(default)]
    pub productivity_score: f64,
}

impl Schedule {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            items: Vec::new(),
            approved: false,
            completed: false,
            productivity_score: 0.0,
        }
    }

    pub fn set_productivity_score(&mut self, score: f64) {
        self.productivity_score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) };
    }

    pub fn sort_items(&mut self) {
        self.items.sort_by_key(|i| (i.start, i.end));
    }

    pub fn task_minutes(&self) -> i64 {
        self.items
            .iter()
            .filter(|i| i.is_task())
            .map(ScheduleItem::duration_minutes)
            .sum()
    }

    pub fn is_overloaded(&self) -> bool {
        self.task_minutes() > OVERLOAD_MINUTES
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.items.iter().filter_map(ScheduleItem::task_id).collect()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &ScheduleItem> {
        self.items.iter().filter(|i| i.is_task())
    }

    pub fn approve(&mut self) {
        self.approved = true;
    }

    /// Mark one item done. The schedule itself completes once every item is.
    ///
    /// Returns the task id when the item was a task so the caller can feed
    /// it back into the habit models.
    pub fn complete_item(&mut self, index: usize) -> Option<String> {
        let item = self.items.get_mut(index)?;
        item.completed = true;
        let task_id = item.task_id().map(str::to_string);
        self.completed = self.items.iter().all(|i| i.completed);
        task_id
    }

    /// Fraction of task items done, 0 when there are none.
    pub fn completion_rate(&self) -> f64 {
        let total = self.tasks().count();
        if total == 0 {
            return 0.0;
        }
        let done = self.tasks().filter(|i| i.completed).count();
        done as f64 / total as f64
    }

    /// Ordering + non-overlap invariants.
    pub fn validate(&self) -> Result<(), String> {
        for (idx, item) in self.items.iter().enumerate() {
            if item.end <= item.start {
                return Err(format!("items[{idx}]: end must be after start"));
            }
            if item.title.trim().is_empty() {
                return Err(format!("items[{idx}]: title must be non-empty"));
            }
        }
        for (idx, pair) in self.items.windows(2).enumerate() {
            if pair[1].start < pair[0].start {
                return Err(format!("items[{}]: not sorted by start", idx + 1));
            }
            if pair[0].overlaps(&pair[1]) {
                return Err(format!("items[{}] overlaps items[{}]", idx, idx + 1));
            }
        }
        Ok(())
    }
}
