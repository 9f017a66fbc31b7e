//! Habit model: running productivity statistics learned from completed activity.
//!
//! Everything here is a frequency count or an unweighted running mean. The
//! whole state sits behind one `RwLock` so a background ingester and a
//! schedule generation can share an `Arc<HabitModel>`: writers are
//! serialized, readers never observe a half-applied update.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::activity::UserActivity;
use crate::stats::{arg_max, majority, RunningMean};

/// Neutral productivity seed on the normalized 0..=1 scale.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Serializable state of a [`HabitModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSnapshot {
    pub seed: f64,
    pub hour_scores: [RunningMean; 24],
    /// 0 = Monday ... 6 = Sunday.
    pub day_scores: [RunningMean; 7],
    pub title_durations: BTreeMap<String, RunningMean>,
    pub category_durations: BTreeMap<String, RunningMean>,
    pub completions: BTreeMap<String, u32>,
    pub postponements: BTreeMap<String, u32>,
    pub category_completions: BTreeMap<String, u32>,
    pub title_hours: BTreeMap<String, [u32; 24]>,
    pub title_days: BTreeMap<String, [u32; 7]>,
}

impl HabitSnapshot {
    pub fn seeded(seed: f64) -> Self {
        Self {
            seed,
            hour_scores: [RunningMean::seeded(seed); 24],
            day_scores: [RunningMean::seeded(seed); 7],
            title_durations: BTreeMap::new(),
            category_durations: BTreeMap::new(),
            completions: BTreeMap::new(),
            postponements: BTreeMap::new(),
            category_completions: BTreeMap::new(),
            title_hours: BTreeMap::new(),
            title_days: BTreeMap::new(),
        }
    }
}

impl Default for HabitSnapshot {
    fn default() -> Self {
        Self::seeded(NEUTRAL_SCORE)
    }
}

#[derive(Debug, Default)]
pub struct HabitModel {
    state: RwLock<HabitSnapshot>,
}

fn key(s: &str) -> String {
    s.trim().to_string()
}

impl HabitModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: f64) -> Self {
        Self::from_snapshot(HabitSnapshot::seeded(seed))
    }

    pub fn from_snapshot(snapshot: HabitSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> HabitSnapshot {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, HabitSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HabitSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold one activity into the hour/day scores and the duration means.
    pub fn record_activity(&self, activity: &UserActivity) {
        let mut st = self.write();
        apply_activity(&mut st, activity);
    }

    pub fn record_completion(&self, title: &str, category: &str, when: NaiveDateTime) {
        let mut st = self.write();
        apply_completion(&mut st, title, category, when);
    }

    /// Change the neutral seed. Buckets that already hold observations keep them.
    pub fn reseed(&self, seed: f64) {
        let mut guard = self.write();
        let st = &mut *guard;
        st.seed = seed;
        for m in st.hour_scores.iter_mut().chain(st.day_scores.iter_mut()) {
            if m.count == 0 {
                m.mean = seed;
            }
        }
    }

    pub fn record_postponement(&self, title: &str) {
        let mut st = self.write();
        *st.postponements.entry(key(title)).or_default() += 1;
        tracing::debug!(title, "habit: postponement recorded");
    }

    /// Rebuild every statistic from `history`.
    ///
    /// The state is reset first, so analyzing the same history twice leaves
    /// the model unchanged. Postponements never appear in activity history
    /// and are carried over.
    pub fn analyze(&self, history: &[UserActivity]) {
        let mut st = self.write();
        let seed = st.seed;
        let mut fresh = HabitSnapshot::seeded(seed);
        fresh.postponements = std::mem::take(&mut st.postponements);
        for a in history {
            apply_activity(&mut fresh, a);
            if a.completed {
                apply_completion(&mut fresh, &a.title, &a.category, a.start);
            }
        }
        *st = fresh;
        tracing::debug!(activities = history.len(), "habit: history analyzed");
    }

    pub fn hour_score(&self, hour: u32) -> f64 {
        let st = self.read();
        st.hour_scores
            .get(hour as usize)
            .map(|m| m.mean)
            .unwrap_or(st.seed)
    }

    pub fn day_score(&self, day: u32) -> f64 {
        let st = self.read();
        st.day_scores
            .get(day as usize)
            .map(|m| m.mean)
            .unwrap_or(st.seed)
    }

    /// Hour (0-23) with the best running score; ties go to the earliest hour.
    pub fn most_productive_hour(&self) -> u32 {
        let st = self.read();
        let means: Vec<f64> = st.hour_scores.iter().map(|m| m.mean).collect();
        arg_max(&means).unwrap_or(0) as u32
    }

    /// Weekday (0 = Monday) with the best running score; ties go to the earliest day.
    pub fn most_productive_day(&self) -> u32 {
        let st = self.read();
        let means: Vec<f64> = st.day_scores.iter().map(|m| m.mean).collect();
        arg_max(&means).unwrap_or(0) as u32
    }

    /// Mean observed minutes for this exact title.
    pub fn learned_duration(&self, title: &str) -> Option<f64> {
        self.read()
            .title_durations
            .get(&key(title))
            .and_then(RunningMean::value)
    }

    /// Title average, then category average, then `default_minutes`.
    pub fn predict_duration(&self, title: &str, category: &str, default_minutes: f64) -> f64 {
        let st = self.read();
        st.title_durations
            .get(&key(title))
            .and_then(RunningMean::value)
            .or_else(|| {
                st.category_durations
                    .get(&key(category))
                    .and_then(RunningMean::value)
            })
            .unwrap_or(default_minutes)
    }

    /// completions / (completions + postponements); `None` when nothing was observed.
    pub fn task_success_rate(&self, title: &str) -> Option<f64> {
        let st = self.read();
        let k = key(title);
        let done = st.completions.get(&k).copied().unwrap_or(0);
        let postponed = st.postponements.get(&k).copied().unwrap_or(0);
        let total = done + postponed;
        (total > 0).then(|| done as f64 / total as f64)
    }

    pub fn completions(&self, title: &str) -> u32 {
        self.read().completions.get(&key(title)).copied().unwrap_or(0)
    }

    pub fn postponements(&self, title: &str) -> u32 {
        self.read().postponements.get(&key(title)).copied().unwrap_or(0)
    }

    pub fn completions_in_category(&self, category: &str) -> u32 {
        self.read()
            .category_completions
            .get(&key(category))
            .copied()
            .unwrap_or(0)
    }

    pub fn preferred_hour(&self, title: &str) -> Option<u32> {
        let st = self.read();
        let hist = st.title_hours.get(&key(title))?;
        majority(hist).map(|(h, _)| h as u32)
    }

    pub fn preferred_day(&self, title: &str) -> Option<u32> {
        let st = self.read();
        let hist = st.title_days.get(&key(title))?;
        majority(hist).map(|(d, _)| d as u32)
    }
}

fn apply_activity(st: &mut HabitSnapshot, a: &UserActivity) {
    let score = a.normalized_productivity();
    st.hour_scores[a.start.hour() as usize].push(score);
    st.day_scores[a.start.weekday().num_days_from_monday() as usize].push(score);

    let minutes = a.duration_minutes();
    if minutes > 0 {
        st.title_durations
            .entry(key(&a.title))
            .or_default()
            .push(minutes as f64);
        if !a.category.trim().is_empty() {
            st.category_durations
                .entry(key(&a.category))
                .or_default()
                .push(minutes as f64);
        }
    } else {
        tracing::debug!(title = %a.title, minutes, "habit: skipping non-positive duration");
    }
}

fn apply_completion(st: &mut HabitSnapshot, title: &str, category: &str, when: NaiveDateTime) {
    let k = key(title);
    *st.completions.entry(k.clone()).or_default() += 1;
    if !category.trim().is_empty() {
        *st.category_completions.entry(key(category)).or_default() += 1;
    }
    st.title_hours.entry(k.clone()).or_insert([0; 24])[when.hour() as usize] += 1;
    st.title_days.entry(k).or_insert([0; 7])[when.weekday().num_days_from_monday() as usize] += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn activity(title: &str, cat: &str, d: u32, h: u32, minutes: i64, score: f64) -> UserActivity {
        let start = at(d, h, 0);
        UserActivity::new(title, cat, start, start + chrono::Duration::minutes(minutes), score)
    }

    #[test]
    fn reseed_only_moves_unobserved_buckets() {
        let model = HabitModel::new();
        model.record_activity(&activity("Deep work", "work", 2, 10, 60, 5.0));
        model.reseed(0.2);
        assert_eq!(model.hour_score(9), 0.2);
        assert_eq!(model.hour_score(10), 1.0);

        // later resets start from the new seed
        model.analyze(&[]);
        assert_eq!(model.hour_score(10), 0.2);
    }

    #[test]
    fn scores_start_neutral_and_follow_observations() {
        let model = HabitModel::new();
        assert_eq!(model.hour_score(10), NEUTRAL_SCORE);
        // all buckets tied at the seed: lowest hour wins
        assert_eq!(model.most_productive_hour(), 0);

        model.record_activity(&activity("Deep work", "work", 2, 10, 60, 5.0));
        model.record_activity(&activity("Deep work", "work", 3, 10, 60, 4.0));
        assert!((model.hour_score(10) - 0.9).abs() < 1e-9);
        assert_eq!(model.most_productive_hour(), 10);
        // 2026-03-02 Monday, 03 Tuesday: Monday scored 1.0
        assert_eq!(model.most_productive_day(), 0);
    }

    #[test]
    fn predict_duration_falls_back_title_category_default() {
        let model = HabitModel::new();
        model.record_activity(&activity("Report", "work", 2, 9, 50, 3.0));
        model.record_activity(&activity("Report", "work", 3, 9, 70, 3.0));
        model.record_activity(&activity("Email", "work", 3, 11, 30, 3.0));

        assert_eq!(model.predict_duration("Report", "work", 25.0), 60.0);
        // no "Slides" yet: category mean of 50, 70, 30
        assert_eq!(model.predict_duration("Slides", "work", 25.0), 50.0);
        assert_eq!(model.predict_duration("Slides", "home", 25.0), 25.0);
    }

    #[test]
    fn zero_length_activity_does_not_poison_durations() {
        let model = HabitModel::new();
        model.record_activity(&activity("Call", "", 2, 9, 0, 3.0));
        assert_eq!(model.learned_duration("Call"), None);
        assert_eq!(model.predict_duration("Call", "", 45.0), 45.0);
    }

    #[test]
    fn success_rate_is_unknown_without_data() {
        let model = HabitModel::new();
        assert_eq!(model.task_success_rate("Gym"), None);

        model.record_completion("Gym", "health", at(2, 18, 0));
        model.record_completion("Gym", "health", at(4, 18, 0));
        model.record_completion("Gym", "health", at(6, 18, 0));
        model.record_postponement("Gym");
        assert_eq!(model.task_success_rate("Gym"), Some(0.75));
        assert_eq!(model.completions_in_category("health"), 3);
    }

    #[test]
    fn preferred_buckets_use_majority() {
        let model = HabitModel::new();
        assert_eq!(model.preferred_hour("Gym"), None);
        model.record_completion("Gym", "health", at(2, 18, 0));
        model.record_completion("Gym", "health", at(3, 7, 0));
        model.record_completion("Gym", "health", at(9, 18, 30));
        assert_eq!(model.preferred_hour("Gym"), Some(18));
        // two Mondays (2nd, 9th) vs one Tuesday
        assert_eq!(model.preferred_day("Gym"), Some(0));
    }

    #[test]
    fn analyze_is_idempotent() {
        let history = vec![
            activity("Yoga", "health", 2, 7, 45, 4.0),
            activity("Yoga", "health", 3, 7, 40, 5.0),
            activity("Report", "work", 3, 10, 90, 2.0).not_completed(),
        ];
        let model = HabitModel::new();
        model.record_postponement("Stale");
        model.analyze(&history);
        let first = model.snapshot();
        model.analyze(&history);
        assert_eq!(model.snapshot(), first);
        assert_eq!(model.postponements("Stale"), 1);
        assert_eq!(model.completions("Report"), 0);
        assert_eq!(model.completions("Yoga"), 2);
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let model = HabitModel::new();
        model.record_activity(&activity("Yoga", "health", 2, 7, 45, 4.0));
        let json = serde_json::to_string(&model.snapshot()).unwrap();
        let back = HabitModel::from_snapshot(serde_json::from_str(&json).unwrap());
        assert_eq!(back.snapshot(), model.snapshot());
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let model = Arc::new(HabitModel::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&model);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        m.record_activity(&activity("Focus", "work", 2, 9, 30, 5.0));
                        m.record_postponement("Focus");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = model.snapshot();
        assert_eq!(snap.hour_scores[9].count, 800);
        assert_eq!(model.postponements("Focus"), 800);
        assert_eq!(model.learned_duration("Focus"), Some(30.0));
    }
}
