//! taskgate-state — shared scheduling settings for tasks and task-groups.
//!
//! The dispatch side (see `taskgate-sched`) runs inside a restricted
//! scheduler callback: it may not block, allocate, or take locks. The
//! control plane writes settings from ordinary tokio tasks. `SettingsStore`
//! bridges the two: a fixed-capacity table of single-word atomic records
//! that readers probe lock-free while writers serialize on a mutex.
//!
//! Two independent store instances exist at runtime — one keyed by task id,
//! one by task-group id. The store itself does not know which namespace it
//! holds.

pub mod error;
pub mod store;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::SettingsStore;
pub use types::{GroupId, TaskId, TaskSetting, PRIORITY_MAX};
