//! The background driver for one installed plan.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::watch;
use tracing::trace;

use crate::parser::Plan;
use crate::registry::PlanRegistry;

/// Registry-side record of a live plan driver.
///
/// The driver itself is a detached tokio task; this handle carries what
/// the control plane may observe (serialized plan, start time) and the
/// cancellation signal. The generation number ties the driver to the
/// registry slot it was installed into: a driver acts only while its
/// generation is still the registered one.
pub(crate) struct RunnerSlot {
    pub generation: u64,
    pub text: String,
    pub started_at: SystemTime,
    pub cancel: watch::Sender<bool>,
}

/// Drive `plan` for entity `id`.
///
/// The first phase's setting was already written by `set_plan`, so the
/// loop starts by sleeping out phase zero and writes settings only at the
/// boundaries that follow. Every write goes through the registry, which
/// refuses it if this driver has been superseded. Cancellation cleanup
/// (clearing the stop flag, slot removal) is done by the cancelling side
/// at signal time; a woken driver just exits.
pub(crate) async fn drive(
    registry: Arc<PlanRegistry>,
    id: i32,
    generation: u64,
    plan: Plan,
    mut cancel: watch::Receiver<bool>,
) {
    for (index, phase) in plan.phases().iter().enumerate() {
        if index > 0 && !registry.apply_phase(id, generation, phase.stopping) {
            trace!(id, generation, "plan driver superseded, exiting");
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(phase.duration) => {}
            _ = cancel.changed() => {
                trace!(id, generation, "plan driver cancelled mid-phase");
                return;
            }
        }
    }
    registry.complete(id, generation);
}
