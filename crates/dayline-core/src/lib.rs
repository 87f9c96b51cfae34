//! dayline-core: Dayline core library
//!
//! Task records and their SQLite persistence, user accounts and bearer tokens,
//! entry validation, and the planner that expands weekly templates into
//! concrete occurrences and lays each day out on an hour timeline.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod plan;
pub mod settings;
pub mod snapshot;
pub mod task;
pub mod time;
pub mod validate;

pub use auth::{AuthService, Identity, LoginGrant, TokenIssuer, User, UserProfile, UserStore};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AuthConfig, CalendarConfig, Config, DatabaseConfig, ServerConfig};
pub use error::{Error, Result, ValidationError};
pub use plan::{
    Agenda, AgendaDay, AgendaPage, DayBuckets, NowTicker, Occurrence, TickerHandle, Timeline,
    TimelineItem, TimelineLayout, agenda_page, day_view, expand, project,
};
pub use settings::Settings;
pub use snapshot::TaskSnapshot;
pub use task::{NewTask, TaskPatch, TaskRecord, TaskStore};
pub use validate::{PatchDraft, TaskDraft};
