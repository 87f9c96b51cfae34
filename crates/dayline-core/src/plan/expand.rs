//! Recurrence expansion

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::task::TaskRecord;
use crate::time::parse_weekday_token;

/// One appearance of a task on a concrete date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Occurrence<'a> {
    pub date: NaiveDate,
    pub task: &'a TaskRecord,
}

/// Occurrences per date, each list ordered by start time
pub type DayBuckets<'a> = BTreeMap<NaiveDate, Vec<Occurrence<'a>>>;

/// Expand `records` into per-date occurrence lists.
///
/// Dated records land on their date whatever the window. Weekly templates
/// land on every matching weekday from `window_start` through
/// `window_start + window_len_days`, both ends inclusive.
///
/// Malformed records (no date and not weekly, or weekly without a known
/// weekday token) are skipped. Within a day, occurrences are stably sorted
/// by start minutes and unparseable starts go last.
pub fn expand(records: &[TaskRecord], window_start: NaiveDate, window_len_days: u32) -> DayBuckets<'_> {
    let mut buckets: DayBuckets<'_> = BTreeMap::new();

    for task in records {
        if let Some(date) = task.date {
            buckets.entry(date).or_default().push(Occurrence { date, task });
        } else if task.weekly {
            let Some(weekday) = task.weekly_day.as_deref().and_then(parse_weekday_token) else {
                warn!(
                    "Skipping weekly task {} with unknown weekday {:?}",
                    task.id, task.weekly_day
                );
                continue;
            };

            for offset in 0..=u64::from(window_len_days) {
                let Some(date) = window_start.checked_add_days(Days::new(offset)) else {
                    break;
                };
                if date.weekday() == weekday {
                    buckets.entry(date).or_default().push(Occurrence { date, task });
                }
            }
        } else {
            warn!("Skipping task {} with neither a date nor a weekly rule", task.id);
        }
    }

    for occurrences in buckets.values_mut() {
        occurrences.sort_by_key(|o| o.task.start_minutes().unwrap_or(u32::MAX));
    }

    buckets
}
