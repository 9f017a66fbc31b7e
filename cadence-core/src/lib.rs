//! cadence-core: learning models and the day scheduler for Cadence

pub mod activity;
pub mod config;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod habit;
pub mod kernel;
pub mod patterns;
pub mod performance;
pub mod preferences;
pub mod schedule;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod task;
pub mod time;
pub mod windows;

pub use activity::UserActivity;
pub use config::{BreakPolicy, SchedulerConfig, ScoringWeights};
pub use context::{
    BusySlot, CalendarProvider, ContextSnapshot, ExternalEvent, LocationProvider, WeatherKind,
    WeatherProvider,
};
pub use error::SchedulerError;
pub use habit::{HabitModel, HabitSnapshot};
pub use kernel::{PlanOutcome, SchedulerKernel, TaskUpdate};
pub use patterns::{PatternKind, PatternRecognizer, TaskPattern};
pub use performance::{DayPeriod, PerformanceModel, PerformanceSnapshot};
pub use preferences::{DayHours, UserPreferences};
pub use schedule::{ItemKind, Schedule, ScheduleItem};
pub use scheduler::{PlanMode, PlanRequest, Scheduler};
pub use store::{
    ActivityStore, MemoryActivityStore, MemoryPreferencesStore, MemoryTaskStore, PreferencesStore,
    TaskFilter, TaskStore,
};
pub use task::Task;
