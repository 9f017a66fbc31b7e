use cadence_core::UserActivity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySource {
    /// `title,category,start,end,score,completed` export.
    Csv,
    /// Plain-text time-tracker log.
    TimeLog,
}

/// Normalized output of activity parsers (source-agnostic)
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub source: ActivitySource,
    pub activities: Vec<UserActivity>,
    /// Rows/lines that looked like data but could not be parsed.
    pub skipped: usize,
}

impl ImportReport {
    pub fn new(source: ActivitySource) -> Self {
        Self {
            source,
            activities: Vec::new(),
            skipped: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}
