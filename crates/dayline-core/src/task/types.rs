//! Task types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time::time_to_minutes;

/// Palette offered for new tasks. The first entry is the default
pub const DEFAULT_COLORS: [&str; 8] = [
    "#FECACA", "#f7db92", "#a2d0f2", "#f5aed6", "#94ed91", "#d9c4c1", "#D8B4FE", "#6EE7B7",
];

/// Category markers. The empty string means "no emoji"
pub const EMOJI_SET: [&str; 8] = ["", "💼", "🎓", "🏋️", "🎻", "🍎", "🈯️", "💃"];

pub const DEFAULT_START: &str = "09:00";
pub const DEFAULT_END: &str = "10:00";

/// A persisted task owned by one user.
///
/// A record is either pinned to `date`, or `weekly` with a `weekly_day` token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub start: String,
    pub end: String,
    pub color: String,
    pub done: bool,
    pub emoji: Option<String>,
    pub date: Option<NaiveDate>,
    pub weekly: bool,
    pub weekly_day: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn start_minutes(&self) -> Option<u32> {
        time_to_minutes(&self.start)
    }

    pub fn end_minutes(&self) -> Option<u32> {
        time_to_minutes(&self.end)
    }

    /// Title for display, empty when unset
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// Fields for a task about to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: Option<String>,
    pub start: String,
    pub end: String,
    pub color: String,
    pub done: bool,
    pub emoji: Option<String>,
    pub date: Option<NaiveDate>,
    pub weekly: bool,
    pub weekly_day: Option<String>,
}

impl NewTask {
    /// A one-off task on `date` with the form defaults
    pub fn on(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
            color: DEFAULT_COLORS[0].to_string(),
            done: false,
            emoji: None,
            date: Some(date),
            weekly: false,
            weekly_day: None,
        }
    }

    /// A weekly template on the given weekday token
    pub fn weekly(weekday: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            date: None,
            weekly: true,
            weekly_day: Some(weekday.into()),
            ..Self::on(NaiveDate::MIN, title)
        }
    }

    pub fn with_times(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }
}

/// Partial update of a task.
///
/// `None` keeps the stored value. For nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<Option<String>>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub color: Option<String>,
    pub done: Option<bool>,
    pub emoji: Option<Option<String>>,
    pub date: Option<Option<NaiveDate>>,
    pub weekly: Option<bool>,
    pub weekly_day: Option<Option<String>>,
}

impl TaskPatch {
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the supplied fields over `record`.
    ///
    /// Turning `weekly` on in the same patch always clears `date`, and turning it
    /// off drops the weekday rule. A date supplied without `weekly` pins a
    /// weekly task to that date.
    pub fn apply(&self, record: &mut TaskRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(start) = &self.start {
            record.start = start.clone();
        }
        if let Some(end) = &self.end {
            record.end = end.clone();
        }
        if let Some(color) = &self.color {
            record.color = color.clone();
        }
        if let Some(done) = self.done {
            record.done = done;
        }
        if let Some(emoji) = &self.emoji {
            record.emoji = emoji.clone();
        }
        if let Some(weekly_day) = &self.weekly_day {
            record.weekly_day = weekly_day.clone();
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        match self.weekly {
            None if matches!(self.date, Some(Some(_))) => {
                record.weekly = false;
                record.weekly_day = None;
            }
            Some(true) => {
                record.weekly = true;
                record.date = None;
            }
            Some(false) => {
                record.weekly = false;
                record.weekly_day = None;
            }
            None => {}
        }
    }
}
