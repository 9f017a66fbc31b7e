//! Collaborator interfaces for tasks, preferences and activity history.
//!
//! The kernel only talks to these traits. In-memory implementations back the
//! tests; the CLI provides JSON-file implementations.

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::activity::UserActivity;
use crate::preferences::UserPreferences;
use crate::task::Task;

/// Selection passed to [`TaskStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub include_completed: bool,
    pub category: Option<String>,
}

impl TaskFilter {
    /// Every task that is still open.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            include_completed: true,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if task.completed && !self.include_completed {
            return false;
        }
        match &self.category {
            Some(c) => task.category.eq_ignore_ascii_case(c),
            None => true,
        }
    }
}

pub trait TaskStore: Send + Sync {
    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>>;
    fn get(&self, id: &str) -> Result<Option<Task>>;
    /// Insert or replace by id.
    fn update(&self, task: Task) -> Result<()>;
}

pub trait PreferencesStore: Send + Sync {
    fn get(&self) -> Result<Option<UserPreferences>>;
}

pub trait ActivityStore: Send + Sync {
    fn append(&self, activity: UserActivity) -> Result<()>;
    fn list_by_title(&self, title: &str) -> Result<Vec<UserActivity>>;
    fn list_all(&self) -> Result<Vec<UserActivity>>;
}

/// Tasks keyed by id, listed in id order.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<BTreeMap<String, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let map = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            tasks: RwLock::new(map),
        }
    }
}

impl TaskStore for MemoryTaskStore {
    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tasks.values().filter(|t| filter.matches(t)).cloned().collect())
    }

    fn get(&self, id: &str) -> Result<Option<Task>> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tasks.get(id).cloned())
    }

    fn update(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        tasks.insert(task.id.clone(), task);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferencesStore {
    prefs: RwLock<Option<UserPreferences>>,
}

impl MemoryPreferencesStore {
    pub fn new(prefs: Option<UserPreferences>) -> Self {
        Self {
            prefs: RwLock::new(prefs),
        }
    }

    pub fn set(&self, prefs: UserPreferences) {
        *self.prefs.write().unwrap_or_else(PoisonError::into_inner) = Some(prefs);
    }
}

impl PreferencesStore for MemoryPreferencesStore {
    fn get(&self) -> Result<Option<UserPreferences>> {
        Ok(self.prefs.read().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

/// Append-only history in insertion order.
#[derive(Debug, Default)]
pub struct MemoryActivityStore {
    log: RwLock<Vec<UserActivity>>,
}

impl MemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: Vec<UserActivity>) -> Self {
        Self {
            log: RwLock::new(history),
        }
    }
}

impl ActivityStore for MemoryActivityStore {
    fn append(&self, activity: UserActivity) -> Result<()> {
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(activity);
        Ok(())
    }

    fn list_by_title(&self, title: &str) -> Result<Vec<UserActivity>> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        Ok(log
            .iter()
            .filter(|a| a.title.trim() == title.trim())
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<UserActivity>> {
        Ok(self.log.read().unwrap_or_else(PoisonError::into_inner).clone())
    }
}
