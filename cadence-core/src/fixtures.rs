//! Demo data for `cadence demo` and tests. The RNG is always injected.

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::task::Task;

const TITLES: &[(&str, &str)] = &[
    ("Write report", "work"),
    ("Email triage", "admin"),
    ("Code review", "work"),
    ("Run", "exercise"),
    ("Groceries", "errands"),
    ("Read paper", "learning"),
    ("Plan sprint", "work"),
    ("Pay bills", "admin"),
    ("Practice guitar", "hobby"),
    ("Yoga", "health"),
];

const DURATIONS: &[i32] = &[15, 25, 30, 45, 60, 90];

/// `count` open tasks around `date`: random priority, difficulty, duration and
/// an optional due date within the next week.
pub fn demo_tasks<R: Rng>(rng: &mut R, date: NaiveDate, count: usize) -> Vec<Task> {
    (0..count)
        .map(|i| {
            let (title, category) = TITLES[i % TITLES.len()];
            let duration = DURATIONS.choose(rng).copied().unwrap_or(30);
            let mut task = Task::new(format!("demo-{:02}", i + 1), title)
                .with_category(category)
                .with_priority(rng.gen_range(1..=5))
                .with_difficulty(rng.gen_range(1..=5))
                .with_duration(duration);
            if rng.gen_bool(0.5) {
                task = task.with_due(date + Duration::days(rng.gen_range(-1..=7)));
            }
            task
        })
        .collect()
}
