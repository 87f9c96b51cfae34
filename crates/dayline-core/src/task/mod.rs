//! Task records and their persistence

mod store;
mod types;

pub use store::TaskStore;
pub use types::{DEFAULT_COLORS, DEFAULT_END, DEFAULT_START, EMOJI_SET, NewTask, TaskPatch, TaskRecord};
