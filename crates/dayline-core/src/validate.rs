//! Entry validation
//!
//! Raw task input from the API or the terminal client is checked here before
//! anything is stored or planned. Times that reach the planner are always
//! valid `HH:MM` strings.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::error::ValidationError;
use crate::task::{DEFAULT_COLORS, DEFAULT_START, NewTask, TaskPatch, TaskRecord};
use crate::time::{add_one_hour, parse_weekday_token, time_to_minutes, weekday_token};

/// Parse a `YYYY-MM-DD` date. Other shapes such as `2025-9-1` are rejected
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(ValidationError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

fn check_time(raw: &str) -> Result<u32, ValidationError> {
    time_to_minutes(raw).ok_or_else(|| ValidationError::InvalidTime(raw.to_string()))
}

fn normalize_weekday(raw: &str) -> Result<String, ValidationError> {
    parse_weekday_token(raw)
        .map(|day| weekday_token(day).to_string())
        .ok_or_else(|| ValidationError::InvalidWeekday(raw.to_string()))
}

/// Check a complete record before it is written
pub fn check_record(record: &TaskRecord) -> Result<(), ValidationError> {
    if record.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(ValidationError::MissingTitle);
    }

    let start = check_time(&record.start)?;
    let end = check_time(&record.end)?;
    if end <= start {
        return Err(ValidationError::EndNotAfterStart);
    }

    if record.weekly {
        if record.date.is_some() {
            return Err(ValidationError::DatedWeekly);
        }
        match record.weekly_day.as_deref() {
            Some(day) if parse_weekday_token(day).is_some() => {}
            other => {
                return Err(ValidationError::InvalidWeekday(
                    other.unwrap_or_default().to_string(),
                ));
            }
        }
    } else if record.date.is_none() {
        return Err(ValidationError::InvalidDate(String::new()));
    }

    Ok(())
}

/// Task creation input as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub color: Option<String>,
    pub done: Option<bool>,
    pub emoji: Option<String>,
    pub date: Option<String>,
    pub weekly: Option<bool>,
    pub weekly_day: Option<String>,
}

impl TaskDraft {
    /// Validate the draft and fill in form defaults.
    ///
    /// A missing start defaults to 09:00 and a missing end to one hour after
    /// the start.
    pub fn into_new_task(self) -> Result<NewTask, ValidationError> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingTitle)?;

        let start = self.start.unwrap_or_else(|| DEFAULT_START.to_string());
        let start_min = check_time(&start)?;
        let end = match self.end {
            Some(end) => end,
            None => add_one_hour(&start).ok_or_else(|| ValidationError::InvalidTime(start.clone()))?,
        };
        let end_min = check_time(&end)?;
        if end_min <= start_min {
            return Err(ValidationError::EndNotAfterStart);
        }

        let weekly = self.weekly.unwrap_or(false);
        let (date, weekly_day) = if weekly {
            let day = self.weekly_day.unwrap_or_default();
            (None, Some(normalize_weekday(&day)?))
        } else {
            let raw = self.date.unwrap_or_default();
            (Some(parse_date(&raw)?), None)
        };

        Ok(NewTask {
            title: Some(title),
            start,
            end,
            color: self
                .color
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_COLORS[0].to_string()),
            done: self.done.unwrap_or(false),
            emoji: self.emoji.filter(|e| !e.is_empty()),
            date,
            weekly,
            weekly_day,
        })
    }
}

/// Partial task update as submitted by a client.
///
/// For `title`, `emoji`, `date` and `weeklyDay` an explicit `null` clears the
/// field while an absent key keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDraft {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub title: Option<Option<String>>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub color: Option<String>,
    pub done: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub emoji: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub date: Option<Option<String>>,
    pub weekly: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub weekly_day: Option<Option<String>>,
}

impl PatchDraft {
    /// Check the supplied fields on their own.
    ///
    /// Rules spanning several fields (end after start, a date or weekday being
    /// present) are checked against the merged record when it is saved.
    pub fn into_patch(self) -> Result<TaskPatch, ValidationError> {
        if let Some(start) = &self.start {
            check_time(start)?;
        }
        if let Some(end) = &self.end {
            check_time(end)?;
        }

        let date = match self.date {
            Some(Some(raw)) => Some(Some(parse_date(&raw)?)),
            Some(None) => Some(None),
            None => None,
        };
        let weekly_day = match self.weekly_day {
            Some(Some(raw)) => Some(Some(normalize_weekday(&raw)?)),
            Some(None) => Some(None),
            None => None,
        };

        Ok(TaskPatch {
            title: self.title.map(|t| t.filter(|s| !s.trim().is_empty())),
            start: self.start,
            end: self.end,
            color: self.color,
            done: self.done,
            emoji: self.emoji.map(|e| e.filter(|s| !s.is_empty())),
            date,
            weekly: self.weekly,
            weekly_day,
        })
    }
}

/// Distinguish an explicit `null` from an absent key
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn draft() -> TaskDraft {
        TaskDraft {
            title: Some("Piano".to_string()),
            start: Some("17:00".to_string()),
            end: Some("18:00".to_string()),
            date: Some("2025-09-20".to_string()),
            ..TaskDraft::default()
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-09-20"), Ok(NaiveDate::from_ymd_opt(2025, 9, 20).unwrap()));
        assert!(parse_date("2025-9-20").is_err());
        assert!(parse_date("20-09-2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_draft_into_new_task() {
        let task = draft().into_new_task().unwrap();
        assert_eq!(task.title.as_deref(), Some("Piano"));
        assert_eq!(task.date, NaiveDate::from_ymd_opt(2025, 9, 20));
        assert_eq!(task.color, DEFAULT_COLORS[0]);
        assert!(!task.weekly);
    }

    #[test]
    fn test_draft_defaults_times() {
        let task = TaskDraft {
            start: None,
            end: None,
            ..draft()
        }
        .into_new_task()
        .unwrap();
        assert_eq!((task.start.as_str(), task.end.as_str()), ("09:00", "10:00"));

        let task = TaskDraft {
            start: Some("13:15".to_string()),
            end: None,
            ..draft()
        }
        .into_new_task()
        .unwrap();
        assert_eq!(task.end, "14:15");
    }

    #[test]
    fn test_draft_rejections() {
        let missing_title = TaskDraft { title: Some("  ".to_string()), ..draft() };
        assert_eq!(missing_title.into_new_task(), Err(ValidationError::MissingTitle));

        let bad_date = TaskDraft { date: Some("20.09.2025".to_string()), ..draft() };
        assert!(matches!(bad_date.into_new_task(), Err(ValidationError::InvalidDate(_))));

        let bad_time = TaskDraft { start: Some("7pm".to_string()), ..draft() };
        assert!(matches!(bad_time.into_new_task(), Err(ValidationError::InvalidTime(_))));

        let backwards = TaskDraft { end: Some("16:59".to_string()), ..draft() };
        assert_eq!(backwards.into_new_task(), Err(ValidationError::EndNotAfterStart));

        let equal = TaskDraft { end: Some("17:00".to_string()), ..draft() };
        assert_eq!(equal.into_new_task(), Err(ValidationError::EndNotAfterStart));

        // 23:30 + 1h wraps to 00:30, which is before the start
        let wraps = TaskDraft { start: Some("23:30".to_string()), end: None, ..draft() };
        assert_eq!(wraps.into_new_task(), Err(ValidationError::EndNotAfterStart));
    }

    #[test]
    fn test_weekly_draft_normalizes_weekday() {
        let task = TaskDraft {
            weekly: Some(true),
            weekly_day: Some("SAT".to_string()),
            ..draft()
        }
        .into_new_task()
        .unwrap();
        assert_eq!(task.date, None);
        assert_eq!(task.weekly_day.as_deref(), Some("sat"));

        let unknown = TaskDraft {
            weekly: Some(true),
            weekly_day: Some("Суббота".to_string()),
            ..draft()
        };
        assert!(matches!(unknown.into_new_task(), Err(ValidationError::InvalidWeekday(_))));
    }

    #[test]
    fn test_patch_draft_null_vs_absent() {
        let patch: PatchDraft = serde_json::from_str(r#"{"emoji": null, "done": true}"#).unwrap();
        let patch = patch.into_patch().unwrap();
        assert_eq!(patch.emoji, Some(None));
        assert_eq!(patch.title, None);
        assert_eq!(patch.done, Some(true));
    }

    #[test]
    fn test_patch_draft_checks_fields() {
        let patch: PatchDraft =
            serde_json::from_str(r#"{"date": "2025-10-01", "weeklyDay": "Wed"}"#).unwrap();
        let patch = patch.into_patch().unwrap();
        assert_eq!(patch.date, Some(NaiveDate::from_ymd_opt(2025, 10, 1)));
        assert_eq!(patch.weekly_day, Some(Some("wed".to_string())));

        let patch: PatchDraft = serde_json::from_str(r#"{"start": "25:00"}"#).unwrap();
        assert!(matches!(patch.into_patch(), Err(ValidationError::InvalidTime(_))));
    }

    #[test]
    fn test_check_record() {
        let now = Utc::now();
        let mut record = TaskRecord {
            id: "t".to_string(),
            user_id: "u".to_string(),
            title: Some("Run".to_string()),
            start: "07:00".to_string(),
            end: "07:45".to_string(),
            color: DEFAULT_COLORS[1].to_string(),
            done: false,
            emoji: None,
            date: None,
            weekly: true,
            weekly_day: Some("sun".to_string()),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(check_record(&record), Ok(()));

        record.date = NaiveDate::from_ymd_opt(2025, 9, 21);
        assert_eq!(check_record(&record), Err(ValidationError::DatedWeekly));
        record.date = None;

        record.weekly_day = None;
        assert!(matches!(check_record(&record), Err(ValidationError::InvalidWeekday(_))));

        record.weekly = false;
        assert!(matches!(check_record(&record), Err(ValidationError::InvalidDate(_))));

        record.date = NaiveDate::from_ymd_opt(2025, 9, 21);
        record.title = None;
        assert_eq!(check_record(&record), Err(ValidationError::MissingTitle));
    }
}
