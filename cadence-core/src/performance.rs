//! Performance model: how well each category goes in each part of the day.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::activity::{clamp_productivity, UserActivity};
use crate::stats::{arg_max, RunningMean};

pub const DEFAULT_AVERAGE_MINUTES: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    /// 05:00-12:00
    Morning,
    /// 12:00-18:00
    Afternoon,
    /// 18:00-22:00
    Evening,
    /// 22:00-05:00
    Night,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 4] = [
        DayPeriod::Morning,
        DayPeriod::Afternoon,
        DayPeriod::Evening,
        DayPeriod::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            18..=21 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }

    pub fn contains_hour(self, hour: u32) -> bool {
        Self::from_hour(hour) == self
    }

    fn index(self) -> usize {
        match self {
            DayPeriod::Morning => 0,
            DayPeriod::Afternoon => 1,
            DayPeriod::Evening => 2,
            DayPeriod::Night => 3,
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
            DayPeriod::Night => "night",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// category -> mean score per period (Morning, Afternoon, Evening, Night).
    pub categories: BTreeMap<String, [RunningMean; 4]>,
    pub title_durations: BTreeMap<String, RunningMean>,
}

#[derive(Debug, Default)]
pub struct PerformanceModel {
    state: RwLock<PerformanceSnapshot>,
}

impl PerformanceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: PerformanceSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, PerformanceSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PerformanceSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one observation. `score` is on the 0-5 scale.
    pub fn record(
        &self,
        title: &str,
        category: &str,
        start: NaiveDateTime,
        duration_minutes: i64,
        score: f64,
    ) {
        let mut st = self.write();
        apply(&mut st, title, category, start, duration_minutes, score);
    }

    pub fn record_activity(&self, activity: &UserActivity) {
        self.record(
            &activity.title,
            &activity.category,
            activity.start,
            activity.duration_minutes(),
            activity.productivity,
        );
    }

    /// Reset and replay `history`.
    pub fn rebuild(&self, history: &[UserActivity]) {
        let mut fresh = PerformanceSnapshot::default();
        for a in history {
            apply(
                &mut fresh,
                &a.title,
                &a.category,
                a.start,
                a.duration_minutes(),
                a.productivity,
            );
        }
        *self.write() = fresh;
    }

    /// Period with the best mean score for `category`; Morning when unknown.
    pub fn best_period(&self, category: &str) -> DayPeriod {
        let st = self.read();
        let Some(periods) = st.categories.get(category.trim()) else {
            return DayPeriod::Morning;
        };
        let means: Vec<f64> = periods.iter().map(|m| m.value().unwrap_or(0.0)).collect();
        arg_max(&means)
            .map(|i| DayPeriod::ALL[i])
            .unwrap_or(DayPeriod::Morning)
    }

    pub fn period_score(&self, category: &str, period: DayPeriod) -> Option<f64> {
        self.read()
            .categories
            .get(category.trim())
            .and_then(|p| p[period.index()].value())
    }

    pub fn learned_duration(&self, title: &str) -> Option<f64> {
        self.read()
            .title_durations
            .get(title.trim())
            .and_then(RunningMean::value)
    }

    /// Mean minutes across every observation of `title`; 60 when none.
    pub fn average_duration(&self, title: &str) -> f64 {
        self.learned_duration(title).unwrap_or(DEFAULT_AVERAGE_MINUTES)
    }
}

fn apply(
    st: &mut PerformanceSnapshot,
    title: &str,
    category: &str,
    start: NaiveDateTime,
    duration_minutes: i64,
    score: f64,
) {
    let period = DayPeriod::from_hour(start.hour());
    let periods = st
        .categories
        .entry(category.trim().to_string())
        .or_insert([RunningMean::default(); 4]);
    periods[period.index()].push(clamp_productivity(score));

    if duration_minutes > 0 {
        st.title_durations
            .entry(title.trim().to_string())
            .or_default()
            .push(duration_minutes as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn period_boundaries() {
        assert_eq!(DayPeriod::from_hour(4), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(5), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(12), DayPeriod::Afternoon);
        assert_eq!(DayPeriod::from_hour(18), DayPeriod::Evening);
        assert_eq!(DayPeriod::from_hour(22), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(0), DayPeriod::Night);
    }

    #[test]
    fn best_period_defaults_to_morning() {
        let m = PerformanceModel::new();
        assert_eq!(m.best_period("writing"), DayPeriod::Morning);
    }

    #[test]
    fn best_period_tracks_mean_score() {
        let m = PerformanceModel::new();
        m.record("Draft", "writing", at(9), 60, 2.0);
        m.record("Draft", "writing", at(20), 60, 5.0);
        m.record("Edit", "writing", at(21), 30, 4.0);
        m.record("Edit", "writing", at(14), 30, 4.0);
        assert_eq!(m.best_period("writing"), DayPeriod::Evening);
        assert_eq!(m.period_score("writing", DayPeriod::Evening), Some(4.5));
        assert_eq!(m.period_score("writing", DayPeriod::Night), None);
    }

    #[test]
    fn average_duration_ignores_category() {
        let m = PerformanceModel::new();
        assert_eq!(m.average_duration("Draft"), 60.0);
        m.record("Draft", "writing", at(9), 40, 3.0);
        m.record("Draft", "work", at(10), 80, 3.0);
        m.record("Draft", "work", at(11), -5, 3.0);
        assert_eq!(m.average_duration("Draft"), 60.0);
        assert_eq!(m.learned_duration("Draft"), Some(60.0));
        m.record("Draft", "work", at(11), 90, 3.0);
        assert!((m.average_duration("Draft") - 70.0).abs() < 1e-9);
    }

    #[test]
    fn rebuild_replaces_state() {
        let m = PerformanceModel::new();
        m.record("Old", "x", at(9), 10, 1.0);
        let start = at(15);
        let history = vec![UserActivity::new(
            "New",
            "y",
            start,
            start + chrono::Duration::minutes(25),
            4.0,
        )];
        m.rebuild(&history);
        assert_eq!(m.learned_duration("Old"), None);
        assert_eq!(m.learned_duration("New"), Some(25.0));
        assert_eq!(m.best_period("y"), DayPeriod::Afternoon);
    }
}
