//! Settings resolution across the task-level and group-level stores.

use taskgate_state::{GroupId, SettingsStore, TaskId, TaskSetting};

/// Read-only view over both settings stores, as seen from the dispatch
/// context. Every lookup is a lock-free store probe.
#[derive(Clone, Copy)]
pub struct SettingsView<'a> {
    tasks: &'a SettingsStore,
    groups: &'a SettingsStore,
}

impl<'a> SettingsView<'a> {
    pub fn new(tasks: &'a SettingsStore, groups: &'a SettingsStore) -> Self {
        Self { tasks, groups }
    }

    /// FIFO admission: a task is blocked if *either* its own setting or
    /// its group's setting says stop.
    pub fn should_stop(&self, task_id: TaskId, group_id: GroupId) -> bool {
        self.tasks.get(task_id).is_some_and(|s| s.stop())
            || self.groups.get(group_id).is_some_and(|s| s.stop())
    }

    /// Lottery resolution: the task-level setting wins, the group-level
    /// setting is the fallback, default otherwise.
    pub fn resolve(&self, task_id: TaskId, group_id: GroupId) -> TaskSetting {
        self.tasks
            .get(task_id)
            .or_else(|| self.groups.get(group_id))
            .unwrap_or_default()
    }
}
