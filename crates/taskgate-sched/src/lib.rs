//! taskgate-sched — per-CPU dispatch decisions over a shared ready queue.
//!
//! Models the restricted scheduler-callback side of taskgate. The host
//! scheduler core invokes two hooks per CPU: *enqueue* (a task became
//! runnable) and *dispatch* (a CPU wants work). Both run in a context that
//! must not block, allocate, or loop unboundedly, so every decision here
//! is a pure scan over the queue plus lock-free reads of the settings
//! stores.
//!
//! Two policies share the queue and admission structure:
//!
//! - [`FifoPolicy`] — first task in queue order that is neither stopped
//!   nor affinity-blocked wins.
//! - [`LotteryPolicy`] — weighted-random selection; a task's chance is
//!   proportional to its priority among non-stopped tasks.
//!
//! Stopped tasks are never dequeued; they stay in place and are retried on
//! every pass until their setting flips back.

pub mod fifo;
pub mod lottery;
pub mod queue;
pub mod resolve;

pub use fifo::FifoPolicy;
pub use lottery::LotteryPolicy;
pub use queue::{CpuSet, Dispatch, DispatchQueue, QueuedTask, BASE_SLICE_NS};
pub use resolve::SettingsView;
