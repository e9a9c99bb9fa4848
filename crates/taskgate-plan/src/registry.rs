//! PlanRegistry — at most one live plan driver per entity.
//!
//! One registry instance exists per namespace (tasks, task-groups), each
//! bound to that namespace's settings store. A single mutex guards the
//! read-slot / install / remove sequence *and* every settings write a
//! driver makes, so replacement is atomic: after `set_plan` returns, the
//! superseded driver can never write again (its generation no longer
//! matches), and exactly one driver owns the entity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use taskgate_state::SettingsStore;

use crate::error::PlanResult;
use crate::parser::Plan;
use crate::runner::{drive, RunnerSlot};

/// Observable snapshot of one registered plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanInfo {
    pub id: i32,
    /// The plan serialized back to its textual form.
    pub plan: String,
    /// Unix timestamp (seconds) when the plan was installed.
    pub started_at: u64,
}

struct Inner {
    runners: HashMap<i32, RunnerSlot>,
    next_generation: u64,
}

/// Registry of live plan drivers for one entity namespace.
pub struct PlanRegistry {
    store: Arc<SettingsStore>,
    inner: Mutex<Inner>,
}

impl PlanRegistry {
    /// Create a registry writing into `store`.
    pub fn new(store: Arc<SettingsStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            inner: Mutex::new(Inner {
                runners: HashMap::new(),
                next_generation: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("plan registry poisoned")
    }

    /// Parse `text` and install it as the active plan for `id`, replacing
    /// and cancelling any previous plan.
    ///
    /// Parse or validation failure mutates nothing; the previous plan, if
    /// any, stays active. The first phase's setting is applied before this
    /// returns, so the entity's status reflects the new plan immediately.
    pub fn set_plan(self: &Arc<Self>, id: i32, text: &str) -> PlanResult<()> {
        let plan = Plan::parse(text)?;
        let first = plan.phases()[0];

        let mut inner = self.lock();
        // A failed write (store at capacity) aborts before any slot change.
        self.write_stop(id, first.stopping)?;

        let generation = inner.next_generation;
        inner.next_generation += 1;
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let slot = RunnerSlot {
            generation,
            text: plan.to_string(),
            started_at: SystemTime::now(),
            cancel: cancel_tx,
        };
        if let Some(prev) = inner.runners.insert(id, slot) {
            // Wake the old driver; its generation is stale so it exits
            // without touching the store.
            let _ = prev.cancel.send(true);
            debug!(id, superseded = prev.generation, "plan replaced");
        }
        drop(inner);

        info!(id, plan = %text, "plan installed");
        tokio::spawn(drive(Arc::clone(self), id, generation, plan, cancel_rx));
        Ok(())
    }

    /// Cancel the active plan for `id`, clearing its stop flag. Returns
    /// whether a plan was registered.
    pub fn stop_plan(&self, id: i32) -> bool {
        let mut inner = self.lock();
        let Some(slot) = inner.runners.remove(&id) else {
            return false;
        };
        let _ = slot.cancel.send(true);
        // The id is already present in the store, so this cannot hit the
        // capacity bound.
        let _ = self.write_stop(id, false);
        info!(id, "plan cancelled");
        true
    }

    /// Snapshot of the plan registered for `id`, if any.
    pub fn current_plan(&self, id: i32) -> Option<PlanInfo> {
        let inner = self.lock();
        inner.runners.get(&id).map(|slot| plan_info(id, slot))
    }

    /// Snapshot of all registered plans, ordered by id.
    pub fn current_plans(&self) -> Vec<PlanInfo> {
        let inner = self.lock();
        let mut infos: Vec<PlanInfo> = inner
            .runners
            .iter()
            .map(|(&id, slot)| plan_info(id, slot))
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Driver-side phase write: applies `stopping` for `id` only if
    /// `generation` still owns the slot.
    pub(crate) fn apply_phase(&self, id: i32, generation: u64, stopping: bool) -> bool {
        let inner = self.lock();
        let current = inner
            .runners
            .get(&id)
            .is_some_and(|slot| slot.generation == generation);
        if current {
            let _ = self.write_stop(id, stopping);
        }
        current
    }

    /// Driver-side normal completion: deregister and leave the entity
    /// running. A superseded driver's completion is a no-op.
    pub(crate) fn complete(&self, id: i32, generation: u64) {
        let mut inner = self.lock();
        let current = inner
            .runners
            .get(&id)
            .is_some_and(|slot| slot.generation == generation);
        if current {
            inner.runners.remove(&id);
            let _ = self.write_stop(id, false);
            debug!(id, "plan completed");
        }
    }

    /// Flip the stop flag for `id`, keeping its stored priority.
    ///
    /// Plans own only the stop dimension of a setting; a priority set
    /// through the control plane survives the whole plan lifecycle.
    fn write_stop(&self, id: i32, stopping: bool) -> PlanResult<()> {
        let current = self.store.get(id).unwrap_or_default();
        self.store.put(id, current.with_stop(stopping))?;
        Ok(())
    }
}

fn plan_info(id: i32, slot: &RunnerSlot) -> PlanInfo {
    PlanInfo {
        id,
        plan: slot.text.clone(),
        started_at: epoch_secs(slot.started_at),
    }
}

fn epoch_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use std::time::Duration;
    use taskgate_state::{StateError, TaskSetting};

    fn registry() -> (Arc<PlanRegistry>, Arc<SettingsStore>) {
        let store = Arc::new(SettingsStore::new());
        (PlanRegistry::new(Arc::clone(&store)), store)
    }

    fn stop_flag(store: &SettingsStore, id: i32) -> Option<bool> {
        store.get(id).map(|s| s.stop())
    }

    #[tokio::test]
    async fn invalid_plan_mutates_nothing() {
        let (registry, store) = registry();
        assert!(matches!(
            registry.set_plan(42, "bogus"),
            Err(PlanError::Grammar { .. })
        ));
        assert!(registry.current_plan(42).is_none());
        assert_eq!(store.get(42), None);
    }

    #[tokio::test]
    async fn install_applies_first_phase_immediately() {
        let (registry, store) = registry();
        registry.set_plan(42, "2s,3r").unwrap();

        // No time has passed; the stop phase is already visible.
        assert_eq!(stop_flag(&store, 42), Some(true));
        let info = registry.current_plan(42).unwrap();
        assert_eq!(info.plan, "2s,3r");
        assert_eq!(info.id, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn plan_walks_its_phases_and_deregisters() {
        let (registry, store) = registry();
        registry.set_plan(42, "2s,3r").unwrap();
        assert_eq!(stop_flag(&store, 42), Some(true));

        // Into the run phase.
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(stop_flag(&store, 42), Some(false));
        assert!(registry.current_plan(42).is_some());

        // Past the end: deregistered, left running.
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(stop_flag(&store, 42), Some(false));
        assert!(registry.current_plan(42).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_run_phase_resets_before_deregistering() {
        let (registry, store) = registry();
        registry.set_plan(7, "1s").unwrap();
        assert_eq!(stop_flag(&store, 7), Some(true));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        // Plan of a single stop phase still ends with a reset.
        assert_eq!(stop_flag(&store, 7), Some(false));
        assert!(registry.current_plan(7).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_plan_resets_promptly_mid_phase() {
        let (registry, store) = registry();
        registry.set_plan(42, "20s").unwrap();
        assert_eq!(stop_flag(&store, 42), Some(true));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(registry.stop_plan(42));

        // Reset is immediate, not deferred to the phase boundary.
        assert_eq!(stop_flag(&store, 42), Some(false));
        assert!(registry.current_plan(42).is_none());

        // The cancelled driver must not resurrect the stop flag later.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stop_flag(&store, 42), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn plan_writes_keep_the_stored_priority() {
        let (registry, store) = registry();
        store.put(42, TaskSetting::new(false, 7).unwrap()).unwrap();

        registry.set_plan(42, "1s,1r").unwrap();
        let s = store.get(42).unwrap();
        assert!(s.stop());
        assert_eq!(s.priority(), 7);

        // Phase boundary write keeps it too.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(store.get(42).unwrap().priority(), 7);

        // And so does the terminal reset on completion.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let s = store.get(42).unwrap();
        assert!(!s.stop());
        assert_eq!(s.priority(), 7);
    }

    #[tokio::test]
    async fn stop_plan_reset_keeps_the_stored_priority() {
        let (registry, store) = registry();
        store.put(7, TaskSetting::new(false, 9).unwrap()).unwrap();

        registry.set_plan(7, "20s").unwrap();
        assert!(registry.stop_plan(7));

        let s = store.get(7).unwrap();
        assert!(!s.stop());
        assert_eq!(s.priority(), 9);
    }

    #[tokio::test]
    async fn stop_plan_without_plan_reports_absence() {
        let (registry, _store) = registry();
        assert!(!registry.stop_plan(9));
    }

    #[tokio::test(start_paused = true)]
    async fn replacement_leaves_exactly_one_runner() {
        let (registry, store) = registry();
        registry.set_plan(42, "20s").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        registry.set_plan(42, "2r,1s").unwrap();
        // New plan's first phase (run) is in force.
        assert_eq!(stop_flag(&store, 42), Some(false));
        let plans = registry.current_plans();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].plan, "2r,1s");

        // The old 20s stop plan must never fire again; the new plan's
        // stop phase arrives at t+2s and finishes at t+3s.
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(stop_flag(&store, 42), Some(true));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(stop_flag(&store, 42), Some(false));
        assert!(registry.current_plan(42).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_replacement_keeps_prior_plan() {
        let (registry, store) = registry();
        registry.set_plan(42, "1s,5r").unwrap();

        assert!(matches!(
            registry.set_plan(42, "30s"),
            Err(PlanError::StopPhaseTooLong { .. })
        ));
        // Prior plan unaffected and still driving.
        assert_eq!(registry.current_plan(42).unwrap().plan, "1s,5r");
        assert_eq!(stop_flag(&store, 42), Some(true));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(stop_flag(&store, 42), Some(false));
    }

    #[tokio::test]
    async fn set_plan_surfaces_store_capacity() {
        let store = Arc::new(SettingsStore::with_capacity(1));
        let registry = PlanRegistry::new(Arc::clone(&store));
        store.put(1, TaskSetting::stopped(false)).unwrap();

        let err = registry.set_plan(2, "1r").unwrap_err();
        assert_eq!(
            err,
            PlanError::State(StateError::CapacityExceeded { capacity: 1 })
        );
        assert!(registry.current_plan(2).is_none());
    }

    #[tokio::test]
    async fn current_plans_orders_by_id() {
        let (registry, _store) = registry();
        registry.set_plan(30, "1r").unwrap();
        registry.set_plan(10, "2r").unwrap();
        registry.set_plan(20, "3r").unwrap();

        let ids: Vec<i32> = registry.current_plans().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
