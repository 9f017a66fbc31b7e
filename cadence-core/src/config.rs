//! Tunable scheduling constants.
//!
//! Defaults reproduce the stock heuristics; everything can be overridden from
//! the CLI's `config.toml`.

use serde::{Deserialize, Serialize};

use crate::preferences::UserPreferences;

/// Weights for the greedy placement score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub priority: f64,
    pub difficulty: f64,
    /// Due within 1 day (including overdue).
    pub due_within_1_day: f64,
    pub due_within_3_days: f64,
    pub due_within_7_days: f64,
    pub preferred_category: f64,
    /// Neutral seed for the habit model's productivity buckets.
    pub neutral_seed: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            priority: 2.0,
            difficulty: 1.0,
            due_within_1_day: 5.0,
            due_within_3_days: 3.0,
            due_within_7_days: 1.0,
            preferred_category: 1.0,
            neutral_seed: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minutes used when neither the task nor the models give a duration.
    pub default_task_minutes: i64,
    /// Smallest slot worth placing a truncated task into.
    pub min_block_minutes: i64,
    /// Break cadence for the default front door.
    pub break_every: u32,
    pub break_minutes: i64,
    /// Urgent-only mode on non-work days keeps priority >= this.
    pub urgent_priority: u8,
    /// Any-day relevance: priority >= this is always kept.
    pub important_priority: u8,
    /// Priority >= this with a due date inside `soon_days` is kept.
    pub soon_priority: u8,
    pub soon_days: i64,
    /// Categories that suffer on bad-weather days.
    pub outdoor_categories: Vec<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_task_minutes: 60,
            min_block_minutes: 15,
            break_every: 3,
            break_minutes: 15,
            urgent_priority: 4,
            important_priority: 4,
            soon_priority: 3,
            soon_days: 3,
            outdoor_categories: vec![
                "outdoor".to_string(),
                "exercise".to_string(),
                "errands".to_string(),
            ],
        }
    }
}

/// How breaks are interleaved with placed tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BreakPolicy {
    Off,
    /// A fixed break after every `every`-th placed task.
    EveryNth { every: u32, minutes: i64 },
    /// A short break after each task, a long one every `sessions_before_long` tasks.
    Sessions {
        short_minutes: i64,
        long_minutes: i64,
        sessions_before_long: u32,
    },
}

impl BreakPolicy {
    /// Cadence used by the plain `generate_schedule` front door.
    pub fn every_nth(prefs: &UserPreferences, cfg: &SchedulerConfig) -> Self {
        if !prefs.breaks_enabled || cfg.break_every == 0 || cfg.break_minutes <= 0 {
            return BreakPolicy::Off;
        }
        BreakPolicy::EveryNth {
            every: cfg.break_every,
            minutes: cfg.break_minutes,
        }
    }

    /// Session cadence used by the intelligent front door.
    pub fn sessions(prefs: &UserPreferences) -> Self {
        if !prefs.breaks_enabled || prefs.break_minutes <= 0 {
            return BreakPolicy::Off;
        }
        BreakPolicy::Sessions {
            short_minutes: prefs.break_minutes,
            long_minutes: prefs.long_break_minutes.max(prefs.break_minutes),
            sessions_before_long: prefs.sessions_before_long_break,
        }
    }

    /// Break minutes owed after the `placed`-th task (1-based), if any.
    ///
    /// `tasks_remain` is false once nothing is left to schedule.
    pub fn break_after(&self, placed: u32, tasks_remain: bool) -> Option<(i64, bool)> {
        if !tasks_remain || placed == 0 {
            return None;
        }
        match *self {
            BreakPolicy::Off => None,
            BreakPolicy::EveryNth { every, minutes } => {
                (every > 0 && placed % every == 0).then_some((minutes, false))
            }
            BreakPolicy::Sessions {
                short_minutes,
                long_minutes,
                sessions_before_long,
            } => {
                if sessions_before_long > 0 && placed % sessions_before_long == 0 {
                    Some((long_minutes, true))
                } else {
                    Some((short_minutes, false))
                }
            }
        }
    }
}
