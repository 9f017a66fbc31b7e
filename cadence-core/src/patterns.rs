//! Recurring-task recognition by majority vote over time buckets.
//!
//! For each title with enough history we bucket occurrences by hour of day,
//! weekday and day of month. A bucket holding at least half of the
//! occurrences becomes a pattern, with confidence = bucket share.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::activity::UserActivity;
use crate::stats::majority;
use crate::time::{at_hour, weekday_index, weekday_name};

/// Fewer occurrences than this are not analyzed.
pub const MIN_OCCURRENCES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Daily,
    Weekly,
    Monthly,
}

impl PatternKind {
    /// Higher is more specific; used to break confidence ties.
    fn specificity(self) -> u8 {
        match self {
            PatternKind::Daily => 0,
            PatternKind::Weekly => 1,
            PatternKind::Monthly => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPattern {
    pub title: String,
    pub kind: PatternKind,
    /// Majority hour of day across all occurrences.
    pub hour: u32,
    /// 0 = Monday, set for weekly patterns.
    pub day_of_week: Option<u32>,
    /// 1-31, set for monthly patterns.
    pub day_of_month: Option<u32>,
    /// Share of occurrences in the majority bucket, 0..=1.
    pub confidence: f64,
    pub occurrences: usize,
}

impl TaskPattern {
    /// Next time this pattern fires strictly after `reference`.
    pub fn next_after(&self, reference: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = reference.date();
        match self.kind {
            PatternKind::Daily => {
                let slot = at_hour(today, self.hour)?;
                if slot > reference {
                    Some(slot)
                } else {
                    at_hour(today + Duration::days(1), self.hour)
                }
            }
            PatternKind::Weekly => {
                let target = self.day_of_week?;
                let current = weekday_index(today);
                let mut ahead = (target + 7 - current) % 7;
                if ahead == 0 {
                    ahead = 7;
                }
                at_hour(today + Duration::days(ahead as i64), self.hour)
            }
            PatternKind::Monthly => {
                let dom = self.day_of_month?;
                let (y, m) = if today.month() == 12 {
                    (today.year() + 1, 1)
                } else {
                    (today.year(), today.month() + 1)
                };
                let day = clamp_day_of_month(y, m, dom)?;
                at_hour(day, self.hour)
            }
        }
    }
}

impl fmt::Display for TaskPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = (self.confidence * 100.0).round();
        match self.kind {
            PatternKind::Daily => write!(f, "Daily at {:02}:00", self.hour)?,
            PatternKind::Weekly => write!(
                f,
                "Weekly on {} at {:02}:00",
                weekday_name(self.day_of_week.unwrap_or(0)),
                self.hour
            )?,
            PatternKind::Monthly => write!(
                f,
                "Monthly on day {} at {:02}:00",
                self.day_of_month.unwrap_or(1),
                self.hour
            )?,
        }
        write!(f, " ({pct}% confidence)")
    }
}

fn clamp_day_of_month(year: i32, month: u32, dom: u32) -> Option<NaiveDate> {
    (1..=dom.max(1))
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

/// Detect every qualifying pattern for one title's occurrence times.
pub fn detect_patterns(title: &str, occurrences: &[NaiveDateTime]) -> Vec<TaskPattern> {
    let total = occurrences.len();
    if total < MIN_OCCURRENCES {
        return Vec::new();
    }

    let mut hours = [0u32; 24];
    let mut weekdays = [0u32; 7];
    let mut month_days = [0u32; 32];
    for t in occurrences {
        hours[t.hour() as usize] += 1;
        weekdays[weekday_index(t.date()) as usize] += 1;
        month_days[t.day() as usize] += 1;
    }

    let Some((hour, hour_count)) = majority(&hours) else {
        return Vec::new();
    };
    let hour = hour as u32;
    let qualifies = |count: u32| count as usize * 2 >= total;
    let pattern = |kind, count: u32| TaskPattern {
        title: title.to_string(),
        kind,
        hour,
        day_of_week: None,
        day_of_month: None,
        confidence: count as f64 / total as f64,
        occurrences: total,
    };

    let mut out = Vec::new();
    if qualifies(hour_count) {
        out.push(pattern(PatternKind::Daily, hour_count));
    }
    if let Some((dow, count)) = majority(&weekdays).filter(|(_, c)| qualifies(*c)) {
        out.push(TaskPattern {
            day_of_week: Some(dow as u32),
            ..pattern(PatternKind::Weekly, count)
        });
    }
    if let Some((dom, count)) = majority(&month_days).filter(|(_, c)| qualifies(*c)) {
        out.push(TaskPattern {
            day_of_month: Some(dom as u32),
            ..pattern(PatternKind::Monthly, count)
        });
    }
    out
}

/// Highest confidence wins; ties go to the more specific kind.
pub fn best_of(patterns: &[TaskPattern]) -> Option<&TaskPattern> {
    patterns.iter().max_by(|a, b| {
        a.confidence
            .total_cmp(&b.confidence)
            .then_with(|| a.kind.specificity().cmp(&b.kind.specificity()))
    })
}

#[derive(Debug, Default)]
pub struct PatternRecognizer {
    patterns: RwLock<BTreeMap<String, Vec<TaskPattern>>>,
}

impl PatternRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regenerate the pattern table from the full history.
    ///
    /// Returns every pattern found.
    pub fn analyze(&self, history: &[UserActivity]) -> Vec<TaskPattern> {
        let mut by_title: BTreeMap<String, Vec<NaiveDateTime>> = BTreeMap::new();
        for a in history {
            by_title
                .entry(a.title.trim().to_string())
                .or_default()
                .push(a.start);
        }

        let mut table = BTreeMap::new();
        let mut found = Vec::new();
        for (title, times) in by_title {
            let patterns = detect_patterns(&title, &times);
            if patterns.is_empty() {
                continue;
            }
            tracing::debug!(title = %title, count = patterns.len(), "patterns: recurring task detected");
            found.extend(patterns.iter().cloned());
            table.insert(title, patterns);
        }

        *self.patterns.write().unwrap_or_else(PoisonError::into_inner) = table;
        found
    }

    pub fn patterns_for(&self, title: &str) -> Vec<TaskPattern> {
        self.patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(title.trim())
            .cloned()
            .unwrap_or_default()
    }

    pub fn all_patterns(&self) -> Vec<TaskPattern> {
        self.patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn best_pattern(&self, title: &str) -> Option<TaskPattern> {
        best_of(&self.patterns_for(title)).cloned()
    }

    pub fn has_recurring_pattern(&self, title: &str) -> bool {
        !self.patterns_for(title).is_empty()
    }

    pub fn pattern_description(&self, title: &str) -> Option<String> {
        self.best_pattern(title).map(|p| p.to_string())
    }

    pub fn predict_next_occurrence(
        &self,
        title: &str,
        reference: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        self.best_pattern(title)?.next_after(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn yoga(times: &[NaiveDateTime]) -> Vec<UserActivity> {
        times
            .iter()
            .map(|t| UserActivity::new("Yoga", "health", *t, *t + Duration::minutes(45), 4.0))
            .collect()
    }

    #[test]
    fn three_morning_sessions_make_a_daily_pattern() {
        let r = PatternRecognizer::new();
        r.analyze(&yoga(&[at(2026, 3, 2, 7), at(2026, 3, 3, 7), at(2026, 3, 4, 7)]));

        assert!(r.has_recurring_pattern("Yoga"));
        let best = r.best_pattern("Yoga").unwrap();
        assert_eq!(best.kind, PatternKind::Daily);
        assert_eq!(best.hour, 7);
        assert_eq!(best.confidence, 1.0);
        assert_eq!(
            r.pattern_description("Yoga").as_deref(),
            Some("Daily at 07:00 (100% confidence)")
        );
    }

    #[test]
    fn fewer_than_three_occurrences_is_insufficient() {
        let r = PatternRecognizer::new();
        r.analyze(&yoga(&[at(2026, 3, 2, 7), at(2026, 3, 3, 7)]));
        assert!(!r.has_recurring_pattern("Yoga"));
        assert_eq!(r.predict_next_occurrence("Yoga", at(2026, 3, 4, 0)), None);
    }

    #[test]
    fn majority_must_cover_half() {
        // hours 7, 8, 9, 7: 7 holds 2 of 4 = 50% -> accepted
        let p = detect_patterns(
            "x",
            &[at(2026, 3, 2, 7), at(2026, 3, 3, 8), at(2026, 3, 4, 9), at(2026, 3, 5, 7)],
        );
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].confidence, 0.5);

        // hours 7, 8, 9: no majority
        let p = detect_patterns("x", &[at(2026, 3, 2, 7), at(2026, 3, 3, 8), at(2026, 3, 4, 9)]);
        assert!(p.is_empty());
    }

    #[test]
    fn weekly_beats_daily_on_tie() {
        // three Mondays at 18:00
        let times = [at(2026, 3, 2, 18), at(2026, 3, 9, 18), at(2026, 3, 16, 18)];
        let p = detect_patterns("Gym", &times);
        assert_eq!(p.len(), 2);
        let best = best_of(&p).unwrap();
        assert_eq!(best.kind, PatternKind::Weekly);
        assert_eq!(best.day_of_week, Some(0));
        assert_eq!(best.to_string(), "Weekly on Monday at 18:00 (100% confidence)");
    }

    #[test]
    fn daily_next_occurrence() {
        let p = best_of(&detect_patterns(
            "Yoga",
            &[at(2026, 3, 2, 7), at(2026, 3, 3, 7), at(2026, 3, 4, 7)],
        ))
        .cloned()
        .unwrap();
        // before the slot: same day
        assert_eq!(p.next_after(at(2026, 3, 5, 6)), Some(at(2026, 3, 5, 7)));
        // exactly at the slot: strictly after means tomorrow
        assert_eq!(p.next_after(at(2026, 3, 5, 7)), Some(at(2026, 3, 6, 7)));
    }

    #[test]
    fn weekly_next_occurrence_skips_today() {
        let p = TaskPattern {
            title: "Gym".into(),
            kind: PatternKind::Weekly,
            hour: 18,
            day_of_week: Some(0),
            day_of_month: None,
            confidence: 1.0,
            occurrences: 3,
        };
        // Monday morning -> next Monday
        assert_eq!(p.next_after(at(2026, 3, 2, 6)), Some(at(2026, 3, 9, 18)));
        // Wednesday -> following Monday
        assert_eq!(p.next_after(at(2026, 3, 4, 12)), Some(at(2026, 3, 9, 18)));
    }

    #[test]
    fn monthly_next_occurrence_clamps_short_months() {
        let p = TaskPattern {
            title: "Rent".into(),
            kind: PatternKind::Monthly,
            hour: 9,
            day_of_week: None,
            day_of_month: Some(31),
            confidence: 1.0,
            occurrences: 3,
        };
        assert_eq!(p.next_after(at(2026, 1, 31, 12)), Some(at(2026, 2, 28, 9)));
        assert_eq!(p.next_after(at(2026, 12, 5, 12)), Some(at(2027, 1, 31, 9)));
    }

    #[test]
    fn reanalysis_replaces_previous_table() {
        let r = PatternRecognizer::new();
        r.analyze(&yoga(&[at(2026, 3, 2, 7), at(2026, 3, 3, 7), at(2026, 3, 4, 7)]));
        assert!(r.has_recurring_pattern("Yoga"));
        r.analyze(&[]);
        assert!(!r.has_recurring_pattern("Yoga"));
        assert!(r.all_patterns().is_empty());
    }
}
