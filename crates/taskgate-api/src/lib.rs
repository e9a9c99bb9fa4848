//! taskgate-api — HTTP control protocol for the taskgate scheduler.
//!
//! Plain-text request/response surface consumed by client SDKs (e.g. a
//! managed runtime mapping its threads to OS task ids). Paths and
//! parameters are the contract; every mutation is validated before any
//! state is touched.
//!
//! # Routes
//!
//! | Path | Query | Response |
//! |---|---|---|
//! | GET `/task/{id}` | — | `running` \| `stopping` \| `not found` |
//! | GET `/task/{id}` | `stopping=bool` and/or `priority=N` | `ok` |
//! | GET `/taskGroup/{id}` | same | same |
//! | GET `/task/plan/{id}` | — | serialized plan \| `no plan` |
//! | GET `/task/plan/{id}` | `plan=<text>` | `ok` or 400 + reason |
//! | GET `/task/plan/{id}` | `stoppingPlan=true` | `ok` |
//! | GET `/taskGroup/plan/{id}` | same as task plan | same |
//! | GET `/plans` | — | JSON listing of active plans |
//! | GET `/help` | — | usage text |

pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use taskgate_plan::PlanRegistry;
use taskgate_state::SettingsStore;

/// Default control port, shared with client SDKs.
pub const DEFAULT_PORT: u16 = 8087;

/// Shared state for the control handlers.
#[derive(Clone)]
pub struct ApiState {
    pub tasks: Arc<SettingsStore>,
    pub groups: Arc<SettingsStore>,
    pub task_plans: Arc<PlanRegistry>,
    pub group_plans: Arc<PlanRegistry>,
    /// Advertised in the help text.
    pub port: u16,
}

impl ApiState {
    /// Wire up fresh stores and registries (one pair per namespace).
    pub fn new(capacity: usize, port: u16) -> Self {
        let tasks = Arc::new(SettingsStore::with_capacity(capacity));
        let groups = Arc::new(SettingsStore::with_capacity(capacity));
        let task_plans = PlanRegistry::new(Arc::clone(&tasks));
        let group_plans = PlanRegistry::new(Arc::clone(&groups));
        Self {
            tasks,
            groups,
            task_plans,
            group_plans,
            port,
        }
    }
}

/// Build the control-protocol router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/task/{id}", get(handlers::task_settings))
        .route("/taskGroup/{id}", get(handlers::group_settings))
        .route("/task/plan/{id}", get(handlers::task_plan))
        .route("/taskGroup/plan/{id}", get(handlers::group_plan))
        .route("/plans", get(handlers::list_plans))
        .route("/help", get(handlers::help))
        .with_state(state)
}
