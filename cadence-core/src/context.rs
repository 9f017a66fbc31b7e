//! Advisory context providers (weather, calendar, location).
//!
//! Real adapters live outside the core. Every provider failure degrades to
//! "no constraint from this source"; nothing here can fail a schedule.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::time::parse_hhmm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Clear,
    Cloudy,
    Rain,
    Storm,
    Snow,
}

impl WeatherKind {
    pub fn is_bad(self) -> bool {
        matches!(self, WeatherKind::Rain | WeatherKind::Storm | WeatherKind::Snow)
    }
}

/// A calendar entry as delivered by an external feed ("HH:MM" local times).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEvent {
    pub title: String,
    pub start: String,
    pub end: String,
}

impl ExternalEvent {
    pub fn new(title: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// Concrete busy interval on `date`; `None` when the feed sent garbage.
    pub fn resolve(&self, date: NaiveDate) -> Option<BusySlot> {
        let start = date.and_time(parse_hhmm(&self.start)?);
        let end = date.and_time(parse_hhmm(&self.end)?);
        (end > start).then(|| BusySlot {
            title: self.title.clone(),
            start,
            end,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusySlot {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

pub trait WeatherProvider: Send + Sync {
    fn forecast(&self, date: NaiveDate, location: &str) -> Result<WeatherKind>;
}

pub trait CalendarProvider: Send + Sync {
    fn events(&self, date: NaiveDate) -> Result<Vec<ExternalEvent>>;
}

pub trait LocationProvider: Send + Sync {
    fn location(&self) -> Result<String>;
}

/// Fixed forecast, handy for tests and offline use.
#[derive(Debug, Clone, Copy)]
pub struct FixedWeather(pub WeatherKind);

impl WeatherProvider for FixedWeather {
    fn forecast(&self, _date: NaiveDate, _location: &str) -> Result<WeatherKind> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCalendar(pub Vec<ExternalEvent>);

impl CalendarProvider for StaticCalendar {
    fn events(&self, _date: NaiveDate) -> Result<Vec<ExternalEvent>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct FixedLocation(pub String);

impl LocationProvider for FixedLocation {
    fn location(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// What the providers told us about one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub location: Option<String>,
    pub weather: Option<WeatherKind>,
    pub busy: Vec<BusySlot>,
}

impl ContextSnapshot {
    pub fn bad_weather(&self) -> bool {
        self.weather.is_some_and(WeatherKind::is_bad)
    }

    /// Query every available provider, swallowing failures.
    ///
    /// `fallback_location` (usually from preferences) is used when no
    /// location provider answers.
    pub fn gather(
        date: NaiveDate,
        fallback_location: Option<&str>,
        weather: Option<&dyn WeatherProvider>,
        calendar: Option<&dyn CalendarProvider>,
        location: Option<&dyn LocationProvider>,
    ) -> Self {
        let location = match location.map(|p| p.location()) {
            Some(Ok(loc)) if !loc.trim().is_empty() => Some(loc),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "context: location unavailable");
                fallback_location.map(str::to_string)
            }
            _ => fallback_location.map(str::to_string),
        };

        let weather = match (weather, location.as_deref()) {
            (Some(p), Some(loc)) => match p.forecast(date, loc) {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "context: weather unavailable");
                    None
                }
            },
            _ => None,
        };

        let busy = match calendar.map(|p| p.events(date)) {
            Some(Ok(events)) => events
                .iter()
                .filter_map(|e| {
                    let slot = e.resolve(date);
                    if slot.is_none() {
                        tracing::debug!(title = %e.title, start = %e.start, end = %e.end, "context: dropping malformed calendar event");
                    }
                    slot
                })
                .collect(),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "context: calendar unavailable");
                Vec::new()
            }
            None => Vec::new(),
        };

        Self {
            location,
            weather,
            busy,
        }
    }
}
