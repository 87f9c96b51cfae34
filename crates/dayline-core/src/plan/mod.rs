//! Planner
//!
//! Turns stored task records into per-day occurrence lists and lays each day
//! out on an hour timeline:
//!
//! records -> [`expand`] -> day buckets -> [`project`] -> timeline geometry
//!
//! Both steps are pure. [`NowTicker`] keeps the live "now" marker of an open
//! day view current, and [`Agenda`] pages through the days ahead.

mod agenda;
mod expand;
mod ticker;
mod timeline;

pub use agenda::{Agenda, AgendaDay, AgendaPage, agenda_page, day_view};
pub use expand::{DayBuckets, Occurrence, expand};
pub use ticker::{NowTicker, TickerHandle};
pub use timeline::{Timeline, TimelineItem, TimelineLayout, marker_offset, project, project_on};

/// Days past the window start over which weekly templates are materialized
pub const RECURRENCE_WINDOW_DAYS: u32 = 56;

/// Pixel height of one timeline hour
pub const HOUR_HEIGHT: f64 = 60.0;

/// Smallest rendered height of an occurrence
pub const MIN_EVENT_HEIGHT: f64 = 40.0;

/// Hour range of a day without occurrences
pub const DEFAULT_START_HOUR: u32 = 6;
pub const DEFAULT_END_HOUR: u32 = 22;

/// How far ahead of today the agenda may page
pub const MAX_DAYS_AHEAD: u32 = 365;

/// Days added per agenda page
pub const LOAD_BATCH: u32 = 30;

/// Period of the now-marker refresh, in seconds
pub const NOW_TICK_SECS: u64 = 60;
