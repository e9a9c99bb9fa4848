//! FIFO dispatch policy with stop control.

use crate::queue::{Dispatch, DispatchQueue};
use crate::resolve::SettingsView;

/// First-fit policy: the oldest queued task that is neither stopped nor
/// affinity-blocked for the requesting CPU is dispatched.
#[derive(Debug, Default)]
pub struct FifoPolicy;

impl FifoPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Pick work for `cpu`, or `None` if no queued task may run there.
    ///
    /// Skipped tasks stay queued in place; a single bounded scan, no
    /// allocation.
    pub fn dispatch(
        &self,
        queue: &mut DispatchQueue,
        cpu: u32,
        view: &SettingsView<'_>,
    ) -> Option<Dispatch> {
        let index = queue.iter().position(|task| {
            !view.should_stop(task.task_id, task.group_id) && task.cpus.allows(cpu)
        })?;
        let task = queue.take(index)?;
        Some(Dispatch {
            task,
            cpu,
            preempt: true,
        })
    }
}
