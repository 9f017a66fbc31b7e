//! Day scheduler: relevance filter, priority ordering, greedy slot filling.
//!
//! Algorithm (deterministic, single pass):
//! 1) drop tasks that are not relevant for the target date
//! 2) apply learned boosts / weather penalties, resolve durations
//! 3) order by priority DESC, due date ASC (undated last)
//! 4) carve the work window into sub-windows around meals and busy slots
//! 5) per sub-window, repeatedly place the best-scoring task that fits,
//!    truncating the best one into the tail when nothing fits fully
//! 6) interleave breaks according to the [`BreakPolicy`]

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::cmp::Reverse;

use crate::config::{BreakPolicy, SchedulerConfig, ScoringWeights};
use crate::context::ContextSnapshot;
use crate::error::{Result, SchedulerError};
use crate::habit::HabitModel;
use crate::performance::PerformanceModel;
use crate::preferences::UserPreferences;
use crate::schedule::{Schedule, ScheduleItem};
use crate::task::{Task, MAX_PRIORITY, MIN_PRIORITY};
use crate::windows::DayFrame;

/// Which front door produced the request; decides the break cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanMode {
    /// Fixed break after every Nth task.
    #[default]
    Standard,
    /// Short break after each task, long break every Nth session.
    Intelligent,
}

#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    pub date: NaiveDate,
    pub tasks: &'a [Task],
    pub preferences: Option<&'a UserPreferences>,
    /// Wall clock used for the learned-period boost.
    pub now: NaiveDateTime,
    pub mode: PlanMode,
    pub context: Option<&'a ContextSnapshot>,
}

impl<'a> PlanRequest<'a> {
    pub fn new(
        date: NaiveDate,
        tasks: &'a [Task],
        preferences: Option<&'a UserPreferences>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            date,
            tasks,
            preferences,
            now,
            mode: PlanMode::Standard,
            context: None,
        }
    }

    pub fn with_mode(mut self, mode: PlanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_context(mut self, context: &'a ContextSnapshot) -> Self {
        self.context = Some(context);
        self
    }
}

/// A task ready for placement.
#[derive(Debug, Clone)]
struct Candidate<'t> {
    task: &'t Task,
    priority: u8,
    minutes: i64,
    score: f64,
}

pub struct Scheduler<'m> {
    habits: &'m HabitModel,
    performance: &'m PerformanceModel,
    weights: &'m ScoringWeights,
    config: &'m SchedulerConfig,
}

impl<'m> Scheduler<'m> {
    pub fn new(
        habits: &'m HabitModel,
        performance: &'m PerformanceModel,
        weights: &'m ScoringWeights,
        config: &'m SchedulerConfig,
    ) -> Self {
        Self {
            habits,
            performance,
            weights,
            config,
        }
    }

    pub fn generate(&self, req: &PlanRequest<'_>) -> Result<Schedule> {
        let prefs = req.preferences.ok_or(SchedulerError::MissingPreferences)?;
        let fallback_ctx = ContextSnapshot::default();
        let ctx = req.context.unwrap_or(&fallback_ctx);

        let mut schedule = Schedule::new(req.date);
        let frame = DayFrame::build(req.date, prefs, &ctx.busy);
        schedule.items.extend(frame.meals.iter().cloned());

        let mut remaining = self.candidates(req, prefs, ctx);
        let policy = match req.mode {
            PlanMode::Standard => BreakPolicy::every_nth(prefs, self.config),
            PlanMode::Intelligent => BreakPolicy::sessions(prefs),
        };
        tracing::debug!(
            date = %req.date,
            candidates = remaining.len(),
            windows = frame.windows.len(),
            ?policy,
            "scheduler: planning day"
        );

        let mut placed: u32 = 0;
        // a break is only emitted once another task follows it
        let mut pending_break: Option<ScheduleItem> = None;
        for window in &frame.windows {
            let mut cursor = window.start;
            while !remaining.is_empty() {
                let left = (window.end - cursor).num_minutes();
                let Some(idx) = self.pick(&remaining, left) else {
                    break;
                };
                let c = remaining.remove(idx);
                let minutes = c.minutes.min(left);
                if minutes < c.minutes {
                    tracing::debug!(task = %c.task.id, wanted = c.minutes, got = minutes, "scheduler: truncated to window");
                }
                schedule.items.extend(pending_break.take());
                let end = cursor + Duration::minutes(minutes);
                schedule
                    .items
                    .push(ScheduleItem::task(c.task.id.clone(), c.task.title.clone(), cursor, end));
                cursor = end;
                placed += 1;

                if let Some((break_minutes, long)) = policy.break_after(placed, !remaining.is_empty()) {
                    if break_minutes <= (window.end - cursor).num_minutes() {
                        let end = cursor + Duration::minutes(break_minutes);
                        let title = if long { "Long break" } else { "Break" };
                        pending_break = Some(ScheduleItem::rest(title, cursor, end));
                        cursor = end;
                    }
                }
            }
        }
        if let Some(dropped) = pending_break {
            tracing::debug!(start = %dropped.start, "scheduler: trailing break dropped");
        }

        if !remaining.is_empty() {
            tracing::debug!(unplaced = remaining.len(), "scheduler: tasks left without a slot");
        }

        schedule.sort_items();
        schedule.set_productivity_score(self.productivity_score(&schedule));
        tracing::info!(
            date = %req.date,
            items = schedule.items.len(),
            task_minutes = schedule.task_minutes(),
            overloaded = schedule.is_overloaded(),
            "scheduler: schedule generated"
        );
        Ok(schedule)
    }

    /// Filter, boost, size, score and order the input tasks.
    fn candidates<'t>(
        &self,
        req: &PlanRequest<'t>,
        prefs: &UserPreferences,
        ctx: &ContextSnapshot,
    ) -> Vec<Candidate<'t>> {
        let mut out: Vec<Candidate<'t>> = req
            .tasks
            .iter()
            .filter(|t| self.is_relevant(t, req.date, prefs))
            .map(|task| {
                let priority = self.adjusted_priority(task, req.now, ctx);
                let minutes = self.resolve_minutes(task);
                let score = self.score(task, priority, req.date, prefs);
                Candidate {
                    task,
                    priority,
                    minutes,
                    score,
                }
            })
            .collect();

        out.sort_by_key(|c| (Reverse(c.priority), c.task.due_date.is_none(), c.task.due_date));
        out
    }

    /// Relevance for `date`. Completed tasks never are.
    pub fn is_relevant(&self, task: &Task, date: NaiveDate, prefs: &UserPreferences) -> bool {
        if task.completed {
            return false;
        }
        if !prefs.is_work_day(date) {
            return task.priority >= self.config.urgent_priority;
        }
        if task.priority >= self.config.important_priority {
            return true;
        }
        if task.scheduled_date == Some(date) {
            return true;
        }
        match task.days_until_due(date) {
            // overdue or due today
            Some(d) if d <= 0 => true,
            Some(d) => task.priority >= self.config.soon_priority && d <= self.config.soon_days,
            None => true,
        }
    }

    /// Learned-period boost and bad-weather penalty, clamped to 1..=5.
    fn adjusted_priority(&self, task: &Task, now: NaiveDateTime, ctx: &ContextSnapshot) -> u8 {
        let mut priority = task.priority.clamp(MIN_PRIORITY, MAX_PRIORITY);

        let best = self.performance.best_period(&task.category);
        let learned = self.performance.period_score(&task.category, best).is_some();
        if learned && best.contains_hour(now.hour()) {
            priority = (priority + 1).min(MAX_PRIORITY);
        }

        let outdoor = self
            .config
            .outdoor_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(task.category.trim()));
        if outdoor && ctx.bad_weather() {
            priority = priority.saturating_sub(1).max(MIN_PRIORITY);
        }
        priority
    }

    /// Estimate, then learned title average, then habit prediction, then default.
    pub fn resolve_minutes(&self, task: &Task) -> i64 {
        let default = self.config.default_task_minutes.max(1);
        let minutes = task.estimate().unwrap_or_else(|| {
            self.performance
                .learned_duration(&task.title)
                .unwrap_or_else(|| {
                    self.habits
                        .predict_duration(&task.title, &task.category, default as f64)
                })
                .round() as i64
        });
        if minutes > 0 { minutes } else { default }
    }

    fn score(&self, task: &Task, priority: u8, date: NaiveDate, prefs: &UserPreferences) -> f64 {
        let w = self.weights;
        let mut score = priority as f64 * w.priority - task.difficulty as f64 * w.difficulty;
        score += match task.days_until_due(date) {
            Some(d) if d <= 1 => w.due_within_1_day,
            Some(d) if d <= 3 => w.due_within_3_days,
            Some(d) if d <= 7 => w.due_within_7_days,
            _ => 0.0,
        };
        if prefs.prefers_category(&task.category) {
            score += w.preferred_category;
        }
        score
    }

    /// Best full fit; otherwise the best candidate truncated, if the gap is worth it.
    fn pick(&self, remaining: &[Candidate<'_>], left: i64) -> Option<usize> {
        if left <= 0 {
            return None;
        }
        best_index(remaining, |c| c.minutes <= left).or_else(|| {
            if left >= self.config.min_block_minutes {
                best_index(remaining, |_| true)
            } else {
                None
            }
        })
    }

    /// Minute-weighted habit score at each task's start hour, as 0-100.
    fn productivity_score(&self, schedule: &Schedule) -> f64 {
        let (weighted, minutes) = schedule.tasks().fold((0.0, 0i64), |(acc, total), item| {
            let m = item.duration_minutes();
            (acc + self.habits.hour_score(item.start.hour()) * m as f64, total + m)
        });
        if minutes == 0 {
            return 0.0;
        }
        weighted / minutes as f64 * 100.0
    }
}

/// Highest score among candidates passing `fits`; ties keep the earlier one.
fn best_index(remaining: &[Candidate<'_>], fits: impl Fn(&Candidate<'_>) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in remaining.iter().enumerate() {
        if !fits(c) {
            continue;
        }
        match best {
            Some((_, s)) if c.score <= s => {}
            _ => best = Some((i, c.score)),
        }
    }
    best.map(|(i, _)| i)
}
