//! On-disk state under `~/.cadence` (or `$CADENCE_HOME`).
//!
//!   config.toml        scheduler/weights/logging
//!   preferences.json   UserPreferences
//!   tasks.json         every task, completed included
//!   activities.jsonl   append-only activity history
//!   models.json        habit + performance snapshots
//!   schedules/<date>.json

use anyhow::{Context, Result};
use cadence_core::store::{ActivityStore, PreferencesStore, TaskFilter, TaskStore};
use cadence_core::{
    HabitModel, HabitSnapshot, PerformanceModel, PerformanceSnapshot, Schedule, Task, UserActivity,
    UserPreferences,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn cadence_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CADENCE_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cadence"))
}

pub fn ensure_cadence_home() -> Result<PathBuf> {
    let dir = cadence_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn preferences_path(home: &Path) -> PathBuf {
    home.join("preferences.json")
}

pub fn write_preferences(home: &Path, prefs: &UserPreferences) -> Result<()> {
    write_json(&preferences_path(home), prefs)
}

pub struct JsonPreferencesStore {
    path: PathBuf,
}

impl JsonPreferencesStore {
    pub fn new(home: &Path) -> Self {
        Self {
            path: preferences_path(home),
        }
    }
}

impl PreferencesStore for JsonPreferencesStore {
    fn get(&self) -> Result<Option<UserPreferences>> {
        read_json(&self.path)
    }
}

/// All tasks in one JSON array, rewritten on every update.
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(home: &Path) -> Self {
        Self {
            path: home.join("tasks.json"),
        }
    }

    fn load(&self) -> Result<Vec<Task>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Next free `t<N>` id.
    pub fn next_id(&self) -> Result<String> {
        let max = self
            .load()?
            .iter()
            .filter_map(|t| t.id.strip_prefix('t')?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(format!("t{}", max + 1))
    }
}

impl TaskStore for JsonTaskStore {
    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        Ok(self.load()?.into_iter().filter(|t| filter.matches(t)).collect())
    }

    fn get(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.load()?.into_iter().find(|t| t.id == id))
    }

    fn update(&self, task: Task) -> Result<()> {
        let mut tasks = self.load()?;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => tasks.push(task),
        }
        write_json(&self.path, &tasks)
    }
}

/// One JSON activity per line.
pub struct JsonlActivityStore {
    path: PathBuf,
}

impl JsonlActivityStore {
    pub fn new(home: &Path) -> Self {
        Self {
            path: home.join("activities.jsonl"),
        }
    }

    pub fn append_all(&self, activities: &[UserActivity]) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        for a in activities {
            let line = serde_json::to_string(a)?;
            writeln!(file, "{line}").with_context(|| format!("write {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl ActivityStore for JsonlActivityStore {
    fn append(&self, activity: UserActivity) -> Result<()> {
        self.append_all(std::slice::from_ref(&activity))
    }

    fn list_by_title(&self, title: &str) -> Result<Vec<UserActivity>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|a| a.title.trim() == title.trim())
            .collect())
    }

    fn list_all(&self) -> Result<Vec<UserActivity>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let mut out = Vec::new();
        for (idx, line) in s.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(a) => out.push(a),
                Err(e) => tracing::warn!(line = idx + 1, error = %e, "state: skipping corrupt activity line"),
            }
        }
        Ok(out)
    }
}

/// Persisted learning state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub habits: HabitSnapshot,
    pub performance: PerformanceSnapshot,
}

impl ModelSnapshot {
    pub fn capture(habits: &HabitModel, performance: &PerformanceModel) -> Self {
        Self {
            habits: habits.snapshot(),
            performance: performance.snapshot(),
        }
    }

    pub fn into_models(self) -> (HabitModel, PerformanceModel) {
        (
            HabitModel::from_snapshot(self.habits),
            PerformanceModel::from_snapshot(self.performance),
        )
    }
}

pub fn models_path(home: &Path) -> PathBuf {
    home.join("models.json")
}

/// Saved snapshot, or fresh models seeded at `seed`.
pub fn read_models(home: &Path, seed: f64) -> Result<ModelSnapshot> {
    Ok(read_json(&models_path(home))?.unwrap_or_else(|| ModelSnapshot {
        habits: HabitSnapshot::seeded(seed),
        performance: PerformanceSnapshot::default(),
    }))
}

pub fn write_models(home: &Path, snapshot: &ModelSnapshot) -> Result<()> {
    write_json(&models_path(home), snapshot)
}

pub fn schedule_path(home: &Path, schedule: &Schedule) -> PathBuf {
    home.join("schedules")
        .join(format!("{}.json", schedule.date.format("%Y-%m-%d")))
}

pub fn write_schedule(home: &Path, schedule: &Schedule) -> Result<PathBuf> {
    let path = schedule_path(home, schedule);
    write_json(&path, schedule)?;
    Ok(path)
}
