//! Scheduler kernel: the single front door over models, stores and providers.
//!
//! The kernel owns `Arc` handles to the learning models so they can be shared
//! with a background ingester. Task mutations that follow from planning are
//! returned as explicit [`TaskUpdate`]s; the caller decides when to apply them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::activity::UserActivity;
use crate::config::{SchedulerConfig, ScoringWeights};
use crate::context::{CalendarProvider, ContextSnapshot, LocationProvider, WeatherProvider};
use crate::error::{Result, SchedulerError};
use crate::habit::HabitModel;
use crate::patterns::{PatternRecognizer, TaskPattern};
use crate::performance::PerformanceModel;
use crate::preferences::UserPreferences;
use crate::schedule::Schedule;
use crate::scheduler::{PlanMode, PlanRequest, Scheduler};
use crate::store::{ActivityStore, PreferencesStore, TaskFilter, TaskStore};
use crate::task::Task;

/// A change to a stored task that planning asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub task_id: String,
    /// New scheduled date; `None` clears it.
    pub scheduled_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub schedule: Schedule,
    pub task_updates: Vec<TaskUpdate>,
}

pub struct SchedulerKernel {
    habits: Arc<HabitModel>,
    performance: Arc<PerformanceModel>,
    patterns: Arc<PatternRecognizer>,
    tasks: Arc<dyn TaskStore>,
    preferences: Arc<dyn PreferencesStore>,
    activities: Arc<dyn ActivityStore>,
    weather: Option<Arc<dyn WeatherProvider>>,
    calendar: Option<Arc<dyn CalendarProvider>>,
    location: Option<Arc<dyn LocationProvider>>,
    weights: ScoringWeights,
    config: SchedulerConfig,
}

impl SchedulerKernel {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        preferences: Arc<dyn PreferencesStore>,
        activities: Arc<dyn ActivityStore>,
    ) -> Self {
        let weights = ScoringWeights::default();
        Self {
            habits: Arc::new(HabitModel::with_seed(weights.neutral_seed)),
            performance: Arc::new(PerformanceModel::new()),
            patterns: Arc::new(PatternRecognizer::new()),
            tasks,
            preferences,
            activities,
            weather: None,
            calendar: None,
            location: None,
            weights,
            config: SchedulerConfig::default(),
        }
    }

    pub fn with_models(
        mut self,
        habits: Arc<HabitModel>,
        performance: Arc<PerformanceModel>,
        patterns: Arc<PatternRecognizer>,
    ) -> Self {
        self.habits = habits;
        self.performance = performance;
        self.patterns = patterns;
        self
    }

    pub fn with_weather(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(provider);
        self
    }

    pub fn with_calendar(mut self, provider: Arc<dyn CalendarProvider>) -> Self {
        self.calendar = Some(provider);
        self
    }

    pub fn with_location(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.location = Some(provider);
        self
    }

    /// Replace the scoring weights. The habit model takes the new neutral seed.
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.habits.reseed(weights.neutral_seed);
        self.weights = weights;
        self
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn habits(&self) -> &Arc<HabitModel> {
        &self.habits
    }

    pub fn performance(&self) -> &Arc<PerformanceModel> {
        &self.performance
    }

    pub fn patterns(&self) -> &Arc<PatternRecognizer> {
        &self.patterns
    }

    /// Plan `tasks` with the fixed every-Nth break cadence.
    pub fn generate_schedule(&self, date: NaiveDate, tasks: &[Task], now: NaiveDateTime) -> Result<Schedule> {
        self.generate(date, tasks, now, PlanMode::Standard)
    }

    /// Plan `tasks` with session breaks.
    pub fn generate_intelligent(&self, date: NaiveDate, tasks: &[Task], now: NaiveDateTime) -> Result<Schedule> {
        self.generate(date, tasks, now, PlanMode::Intelligent)
    }

    fn generate(&self, date: NaiveDate, tasks: &[Task], now: NaiveDateTime, mode: PlanMode) -> Result<Schedule> {
        let prefs = self.preferences.get()?.ok_or(SchedulerError::MissingPreferences)?;
        let context = self.context_for(date, &prefs);
        let scheduler = Scheduler::new(&self.habits, &self.performance, &self.weights, &self.config);
        let req = PlanRequest::new(date, tasks, Some(&prefs), now)
            .with_mode(mode)
            .with_context(&context);
        scheduler.generate(&req)
    }

    fn context_for(&self, date: NaiveDate, prefs: &UserPreferences) -> ContextSnapshot {
        ContextSnapshot::gather(
            date,
            prefs.location.as_deref(),
            self.weather.as_deref(),
            self.calendar.as_deref(),
            self.location.as_deref(),
        )
    }

    /// Plan the stored open tasks for `date` with session breaks.
    pub fn plan_day(&self, date: NaiveDate, now: NaiveDateTime) -> Result<PlanOutcome> {
        self.plan(date, now, PlanMode::Intelligent)
    }

    /// Plan the stored open tasks for `date`.
    ///
    /// Placed tasks get `date` as their scheduled date; tasks that were
    /// scheduled for `date` but did not make it are unscheduled.
    pub fn plan(&self, date: NaiveDate, now: NaiveDateTime, mode: PlanMode) -> Result<PlanOutcome> {
        let tasks = self.tasks.list(&TaskFilter::open())?;
        let schedule = self.generate(date, &tasks, now, mode)?;
        let placed = schedule.task_ids();

        let mut task_updates = Vec::new();
        for task in &tasks {
            let is_placed = placed.contains(&task.id.as_str());
            if is_placed && task.scheduled_date != Some(date) {
                task_updates.push(TaskUpdate {
                    task_id: task.id.clone(),
                    scheduled_date: Some(date),
                });
            } else if !is_placed && task.scheduled_date == Some(date) {
                task_updates.push(TaskUpdate {
                    task_id: task.id.clone(),
                    scheduled_date: None,
                });
            }
        }
        tracing::info!(date = %date, updates = task_updates.len(), "kernel: day planned");
        Ok(PlanOutcome {
            schedule,
            task_updates,
        })
    }

    /// Write planned updates back to the task store. Returns how many applied.
    pub fn apply_updates(&self, updates: &[TaskUpdate]) -> Result<usize> {
        let mut applied = 0;
        for update in updates {
            let Some(mut task) = self.tasks.get(&update.task_id)? else {
                tracing::warn!(task_id = %update.task_id, "kernel: update for unknown task skipped");
                continue;
            };
            task.scheduled_date = update.scheduled_date;
            self.tasks.update(task)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Mark a task done and feed the observation back into every model.
    ///
    /// `score` is the 0-5 productivity rating.
    pub fn record_completion(
        &self,
        task_id: &str,
        when: NaiveDateTime,
        actual_minutes: Option<i32>,
        score: f64,
    ) -> Result<Task> {
        let mut task = self.find(task_id)?;
        task.complete(when, actual_minutes);

        let activity = UserActivity::from_task(&task, when, score);
        self.habits.record_activity(&activity);
        self.habits.record_completion(&task.title, &task.category, activity.start);
        self.performance.record_activity(&activity);
        self.activities.append(activity)?;
        self.tasks.update(task.clone())?;

        tracing::info!(task_id, title = %task.title, "kernel: completion recorded");
        Ok(task)
    }

    /// Count a postponement and drop the task's scheduled date.
    pub fn record_postponement(&self, task_id: &str) -> Result<Task> {
        let mut task = self.find(task_id)?;
        self.habits.record_postponement(&task.title);
        task.scheduled_date = None;
        self.tasks.update(task.clone())?;
        Ok(task)
    }

    fn find(&self, task_id: &str) -> Result<Task> {
        self.tasks
            .get(task_id)?
            .ok_or_else(|| SchedulerError::TaskNotFound(task_id.to_string()))
    }

    /// Rebuild every model from the stored history. Returns the patterns found.
    pub fn analyze_history(&self) -> Result<Vec<TaskPattern>> {
        let history = self.activities.list_all()?;
        Ok(self.analyze_activities(&history))
    }

    /// Re-detect recurring tasks without touching the other models.
    pub fn refresh_patterns(&self) -> Result<Vec<TaskPattern>> {
        let history = self.activities.list_all()?;
        Ok(self.patterns.analyze(&history))
    }

    pub fn analyze_activities(&self, history: &[UserActivity]) -> Vec<TaskPattern> {
        self.habits.analyze(history);
        self.performance.rebuild(history);
        let patterns = self.patterns.analyze(history);
        tracing::info!(activities = history.len(), patterns = patterns.len(), "kernel: history analyzed");
        patterns
    }

    /// Learned minutes for a title: title average, then category average, then the default.
    pub fn predict_duration(&self, title: &str, category: &str) -> f64 {
        self.performance.learned_duration(title).unwrap_or_else(|| {
            self.habits
                .predict_duration(title, category, self.config.default_task_minutes as f64)
        })
    }
}
