//! Day list paging
//!
//! The agenda starts at today and grows in batches up to a fixed horizon.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::CalendarConfig;
use crate::plan::{Occurrence, Timeline, TimelineLayout, expand, project};
use crate::task::TaskRecord;
use crate::time::date_weekday_token;

/// How many days of the list are loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agenda {
    loaded: u32,
    batch: u32,
    max_days: u32,
}

impl Agenda {
    /// A list holding the first batch
    pub fn new(batch: u32, max_days: u32) -> Self {
        let batch = batch.max(1);
        Self {
            loaded: batch.min(max_days),
            batch,
            max_days,
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.load_batch, config.max_days_ahead)
    }

    /// Days currently in the list, counted from today
    pub fn loaded(&self) -> u32 {
        self.loaded
    }

    pub fn has_more(&self) -> bool {
        self.loaded < self.max_days
    }

    /// Load the next batch, clamped to the horizon.
    ///
    /// Returns the offsets of the newly added days. Empty once the limit is
    /// reached.
    pub fn load_more(&mut self) -> std::ops::Range<u32> {
        let from = self.loaded;
        self.loaded = (self.loaded + self.batch).min(self.max_days);
        from..self.loaded
    }
}

/// One listed day with its laid-out occurrences
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaDay<'a> {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub is_today: bool,
    pub timeline: Timeline<'a>,
}

/// A run of consecutive days starting `offset` days after today
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaPage<'a> {
    pub offset: u32,
    pub days: Vec<AgendaDay<'a>>,
    pub has_more: bool,
}

/// Build the page `[offset, offset + count)` of the day list.
///
/// Weekly tasks are expanded over the window starting today, so the page
/// matches what the full list shows for those days. `count` of zero means one
/// batch. Offsets past the horizon give an empty page.
pub fn agenda_page<'a>(
    records: &'a [TaskRecord],
    clock: &dyn Clock,
    config: &CalendarConfig,
    offset: u32,
    count: u32,
) -> AgendaPage<'a> {
    let today = clock.today();
    let max_days = config.max_days_ahead;
    let count = if count == 0 { config.load_batch } else { count };
    let end = offset.saturating_add(count).min(max_days);

    let buckets = expand(records, today, config.window_days);
    let layout = TimelineLayout::from(config);

    let days = (offset..end)
        .filter_map(|i| today.checked_add_days(Days::new(u64::from(i))))
        .map(|date| {
            let occurrences: &[Occurrence<'a>] =
                buckets.get(&date).map(Vec::as_slice).unwrap_or_default();
            AgendaDay {
                date,
                weekday: date_weekday_token(date),
                is_today: date == today,
                timeline: project(occurrences, clock.now_on(date), &layout),
            }
        })
        .collect();

    AgendaPage {
        offset,
        days,
        has_more: end < max_days,
    }
}

/// Lay out a single date.
///
/// The expansion window starts at today, or at `date` itself when viewing a
/// past day.
pub fn day_view<'a>(
    records: &'a [TaskRecord],
    date: NaiveDate,
    clock: &dyn Clock,
    config: &CalendarConfig,
) -> AgendaDay<'a> {
    let today = clock.today();
    let window_start = today.min(date);
    let buckets = expand(records, window_start, config.window_days);
    let occurrences: &[Occurrence<'a>] = buckets.get(&date).map(Vec::as_slice).unwrap_or_default();

    AgendaDay {
        date,
        weekday: date_weekday_token(date),
        is_today: date == today,
        timeline: project(occurrences, clock.now_on(date), &TimelineLayout::from(config)),
    }
}
