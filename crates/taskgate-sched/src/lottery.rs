//! Lottery dispatch policy: priority-weighted random selection.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::queue::{Dispatch, DispatchQueue, QueuedTask};
use crate::resolve::SettingsView;

/// Weighted-random policy. Each dispatch request draws a ticket uniformly
/// over the summed priorities of all non-stopped queued tasks, so a task's
/// selection probability is proportional to its priority.
#[derive(Debug)]
pub struct LotteryPolicy {
    rng: SmallRng,
}

impl LotteryPolicy {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic draws, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn weight(task: &QueuedTask, view: &SettingsView<'_>) -> u64 {
        let setting = view.resolve(task.task_id, task.group_id);
        if setting.stop() {
            0
        } else {
            u64::from(setting.priority())
        }
    }

    /// Pick work for `cpu` by lottery, or `None` if no eligible ticket
    /// exists.
    ///
    /// Two bounded passes over the queue: one to sum effective weights,
    /// one to walk the drawn ticket down. When the drawn task fails the
    /// affinity test the walk continues from the decremented remainder
    /// instead of re-drawing, so the whole decision stays a single pass
    /// plus its continuation.
    pub fn dispatch(
        &mut self,
        queue: &mut DispatchQueue,
        cpu: u32,
        view: &SettingsView<'_>,
    ) -> Option<Dispatch> {
        let total: u64 = queue.iter().map(|t| Self::weight(t, view)).sum();
        if total == 0 {
            return None;
        }

        let mut remaining = self.rng.gen_range(0..total) as i64;
        let mut winner = None;
        for (index, task) in queue.iter().enumerate() {
            let weight = Self::weight(task, view);
            remaining -= weight as i64;
            if remaining <= 0 && weight > 0 && task.cpus.allows(cpu) {
                winner = Some(index);
                break;
            }
        }

        let task = queue.take(winner?)?;
        Some(Dispatch {
            task,
            cpu,
            preempt: true,
        })
    }
}

impl Default for LotteryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
