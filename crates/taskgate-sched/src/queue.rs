//! Shared dispatch queue and CPU affinity primitives.

use serde::Serialize;
use taskgate_state::{GroupId, TaskId};

use std::collections::VecDeque;

/// Base time-slice budget in nanoseconds, divided by the queue length at
/// enqueue time to approximate round-robin fairness under load.
pub const BASE_SLICE_NS: u64 = 5_000_000;

/// Affinity mask over CPUs 0..64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuSet(pub u64);

impl CpuSet {
    /// Every CPU permitted.
    pub const ALL: CpuSet = CpuSet(u64::MAX);

    /// Mask admitting only `cpu`.
    pub fn single(cpu: u32) -> Self {
        CpuSet(1u64 << cpu)
    }

    /// Mask admitting the listed CPUs.
    pub fn of(cpus: &[u32]) -> Self {
        CpuSet(cpus.iter().fold(0, |mask, &cpu| mask | (1u64 << cpu)))
    }

    /// Whether this mask admits `cpu`.
    pub fn allows(&self, cpu: u32) -> bool {
        cpu < 64 && self.0 & (1u64 << cpu) != 0
    }
}

/// One runnable task waiting in the shared queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueuedTask {
    pub task_id: TaskId,
    pub group_id: GroupId,
    pub cpus: CpuSet,
    /// Time slice granted at enqueue time, in nanoseconds.
    pub slice_ns: u64,
}

/// A dispatch decision: `task` runs on `cpu` for its granted slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub task: QueuedTask,
    pub cpu: u32,
    /// Dispatches preempt whatever currently runs on the target CPU.
    pub preempt: bool,
}

/// The shared first-in-first-out ready queue.
///
/// Conceptually one global queue per scheduling domain. Backing storage is
/// pre-sized so steady-state enqueues do not allocate.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tasks: VecDeque<QueuedTask>,
}

impl Default for DispatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::with_capacity(1024),
        }
    }

    /// Add a runnable task at the tail, granting it a slice of
    /// `BASE_SLICE_NS / queue length` (an empty queue counts as length 1).
    pub fn enqueue(&mut self, task_id: TaskId, group_id: GroupId, cpus: CpuSet) {
        let queued = self.tasks.len().max(1) as u64;
        self.tasks.push_back(QueuedTask {
            task_id,
            group_id,
            cpus,
            slice_ns: BASE_SLICE_NS / queued,
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Queue contents in FIFO order (head first).
    pub fn iter(&self) -> impl Iterator<Item = &QueuedTask> {
        self.tasks.iter()
    }

    /// Remove the task at `index`, preserving the order of the rest.
    pub(crate) fn take(&mut self, index: usize) -> Option<QueuedTask> {
        self.tasks.remove(index)
    }
}
