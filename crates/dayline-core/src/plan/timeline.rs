//! Timeline projection

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

use crate::config::CalendarConfig;
use crate::plan::{DEFAULT_END_HOUR, DEFAULT_START_HOUR, HOUR_HEIGHT, MIN_EVENT_HEIGHT, Occurrence};

/// Scale of the hour timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineLayout {
    pub hour_height: f64,
    pub min_event_height: f64,
    pub default_start_hour: u32,
    pub default_end_hour: u32,
}

impl Default for TimelineLayout {
    fn default() -> Self {
        Self {
            hour_height: HOUR_HEIGHT,
            min_event_height: MIN_EVENT_HEIGHT,
            default_start_hour: DEFAULT_START_HOUR,
            default_end_hour: DEFAULT_END_HOUR,
        }
    }
}

impl From<&CalendarConfig> for TimelineLayout {
    fn from(config: &CalendarConfig) -> Self {
        Self {
            hour_height: config.hour_height,
            min_event_height: config.min_event_height,
            default_start_hour: config.default_start_hour,
            default_end_hour: config.default_end_hour,
        }
    }
}

/// An occurrence placed on the timeline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem<'a> {
    #[serde(flatten)]
    pub occurrence: Occurrence<'a>,
    pub top: f64,
    pub height: f64,
}

/// Geometry of one day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline<'a> {
    pub start_hour: u32,
    pub end_hour: u32,
    pub hour_height: f64,
    pub total_height: f64,
    /// Hour labels, `start_hour..=end_hour`
    pub hours: Vec<u32>,
    pub items: Vec<TimelineItem<'a>>,
    pub now_offset: Option<f64>,
}

impl Timeline<'_> {
    /// Vertical offset of `minutes` since midnight
    pub fn offset_of(&self, minutes: u32) -> f64 {
        offset(minutes, self.start_hour, self.hour_height)
    }

    /// Recompute the now marker for a new time of day
    pub fn refresh_now(&mut self, now: Option<NaiveTime>) {
        self.now_offset =
            now.and_then(|t| marker_offset(t, self.start_hour, self.end_hour, self.hour_height));
    }
}

fn offset(minutes: u32, start_hour: u32, hour_height: f64) -> f64 {
    (f64::from(minutes) - f64::from(start_hour * 60)) / 60.0 * hour_height
}

/// Offset of the "now" marker, absent outside `[start_hour, end_hour]`
pub fn marker_offset(now: NaiveTime, start_hour: u32, end_hour: u32, hour_height: f64) -> Option<f64> {
    let minutes = now.hour() * 60 + now.minute();
    (start_hour * 60..=end_hour * 60)
        .contains(&minutes)
        .then(|| offset(minutes, start_hour, hour_height))
}

/// Lay out one day's occurrences.
///
/// The visible range opens an hour before the earliest start and closes at
/// the hour boundary after the latest end, clamped to `[0, 24]`. A day with
/// no parseable times shows the default range.
///
/// `now` is the current time of day and should only be passed when the day
/// being projected is today. Occurrences with unparseable times keep their
/// place in `items` with NaN geometry.
pub fn project<'a>(
    occurrences: &[Occurrence<'a>],
    now: Option<NaiveTime>,
    layout: &TimelineLayout,
) -> Timeline<'a> {
    let min_start = occurrences.iter().filter_map(|o| o.task.start_minutes()).min();
    let max_end = occurrences.iter().filter_map(|o| o.task.end_minutes()).max();

    let (start_hour, end_hour) = match (min_start, max_end) {
        (Some(min_start), Some(max_end)) => (
            (min_start / 60).saturating_sub(1),
            max_end.div_ceil(60).min(24),
        ),
        _ => (layout.default_start_hour, layout.default_end_hour),
    };
    let hour_height = layout.hour_height;

    let items = occurrences
        .iter()
        .map(|o| {
            let (top, height) = match (o.task.start_minutes(), o.task.end_minutes()) {
                (Some(start), Some(end)) => (
                    offset(start, start_hour, hour_height),
                    ((f64::from(end) - f64::from(start)) / 60.0 * hour_height)
                        .max(layout.min_event_height),
                ),
                _ => (f64::NAN, f64::NAN),
            };
            TimelineItem {
                occurrence: *o,
                top,
                height,
            }
        })
        .collect();

    Timeline {
        start_hour,
        end_hour,
        hour_height,
        total_height: f64::from(end_hour.saturating_sub(start_hour) + 1) * hour_height,
        hours: (start_hour..=end_hour).collect(),
        items,
        now_offset: now.and_then(|t| marker_offset(t, start_hour, end_hour, hour_height)),
    }
}

/// Lay out `date` with the clock's time when `date` is today
pub fn project_on<'a>(
    date: NaiveDate,
    occurrences: &[Occurrence<'a>],
    clock: &dyn crate::Clock,
    layout: &TimelineLayout,
) -> Timeline<'a> {
    project(occurrences, clock.now_on(date), layout)
}
