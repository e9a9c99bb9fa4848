//! taskgate-plan — timed stop/run plans for tasks and task-groups.
//!
//! A *plan* is a declarative sequence of phases (`2s,3r` = stop for two
//! seconds, then run for three) applied to one entity over time. Each
//! installed plan is driven by one background tokio task that writes the
//! entity's setting at every phase boundary; a registry guarantees at most
//! one live driver per entity, replacing or cancelling predecessors
//! atomically.
//!
//! Plans never outlive their terminal write: whether a driver completes
//! normally or is cancelled mid-phase, the last act on the settings store
//! clears the stop flag, so no entity can stay parked. Plans touch only
//! the stop flag; a priority set directly survives them.

pub mod error;
pub mod parser;
pub mod registry;
pub mod runner;

pub use error::{PlanError, PlanResult};
pub use parser::{Plan, PlanPhase, MAX_STOP_SECS};
pub use registry::{PlanInfo, PlanRegistry};
