//! Domain types shared between the dispatch policies and the control plane.

use serde::Serialize;

use crate::error::{StateError, StateResult};

/// OS-level task (thread) identifier.
pub type TaskId = i32;

/// OS-level task-group (process) identifier.
///
/// Shares the numeric range with [`TaskId`] but is an independent
/// namespace: group 42 and task 42 are unrelated.
pub type GroupId = i32;

/// Largest representable priority (settings pack into 31 bits, see the
/// store's slot encoding).
pub const PRIORITY_MAX: u32 = (1 << 31) - 1;

/// Scheduling setting for one task or task-group.
///
/// `stop` blocks the entity from being dispatched; `priority` is its
/// lottery weight (1 is the lowest). Priority is strictly positive by
/// construction — a zero would be indistinguishable from "stopped" on the
/// dispatch side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskSetting {
    stop: bool,
    priority: u32,
}

impl TaskSetting {
    /// Build a validated setting.
    pub fn new(stop: bool, priority: u32) -> StateResult<Self> {
        if priority == 0 || priority > PRIORITY_MAX {
            return Err(StateError::InvalidPriority { got: priority });
        }
        Ok(Self { stop, priority })
    }

    /// Setting with the given stop flag and the default (lowest) priority.
    pub fn stopped(stop: bool) -> Self {
        Self { stop, priority: 1 }
    }

    pub fn stop(&self) -> bool {
        self.stop
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Replace the stop flag, keeping the priority.
    pub fn with_stop(self, stop: bool) -> Self {
        Self { stop, ..self }
    }

    /// Replace the priority, keeping the stop flag.
    pub fn with_priority(self, priority: u32) -> StateResult<Self> {
        Self::new(self.stop, priority)
    }
}

impl Default for TaskSetting {
    /// The resolved value for an id absent from a store: eligible, lowest
    /// weight.
    fn default() -> Self {
        Self {
            stop: false,
            priority: 1,
        }
    }
}
