//! Control-protocol handlers.
//!
//! Responses are plain text (`running`, `stopping`, `not found`, `ok`,
//! `no plan`, a serialized plan) except `/plans`, which returns JSON.
//! Malformed ids and conflicting parameters are rejected with 400 before
//! any state mutation.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use taskgate_plan::PlanRegistry;
use taskgate_state::{SettingsStore, TaskSetting};

use crate::ApiState;

const BAD_REQUEST: &str = "Bad Request";

fn parse_id(raw: &str) -> Result<i32, (StatusCode, String)> {
    raw.parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, BAD_REQUEST.to_string()))
}

// ── Settings (stop / resume / status) ──────────────────────────

/// Query parameters for `/task/{id}` and `/taskGroup/{id}`.
///
/// No parameters = status query; either parameter present = mutation.
/// A partial mutation keeps the other field of the stored setting.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    pub stopping: Option<bool>,
    pub priority: Option<u32>,
}

fn handle_settings(
    store: &SettingsStore,
    raw_id: &str,
    query: SettingsQuery,
) -> (StatusCode, String) {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(reject) => return reject,
    };

    if query.stopping.is_none() && query.priority.is_none() {
        let response = match store.get(id) {
            Some(setting) if setting.stop() => "stopping",
            Some(_) => "running",
            None => "not found",
        };
        return (StatusCode::OK, response.to_string());
    }

    let current = store.get(id).unwrap_or_default();
    let stop = query.stopping.unwrap_or(current.stop());
    let priority = query.priority.unwrap_or(current.priority());
    let setting = match TaskSetting::new(stop, priority) {
        Ok(setting) => setting,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()),
    };
    match store.put(id, setting) {
        Ok(()) => {
            debug!(id, stop, priority, "setting updated");
            (StatusCode::OK, "ok".to_string())
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// GET /task/{id}
pub async fn task_settings(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<SettingsQuery>,
) -> impl IntoResponse {
    handle_settings(&state.tasks, &id, query)
}

/// GET /taskGroup/{id}
pub async fn group_settings(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<SettingsQuery>,
) -> impl IntoResponse {
    handle_settings(&state.groups, &id, query)
}

// ── Plans ──────────────────────────────────────────────────────

/// Query parameters for `/task/plan/{id}` and `/taskGroup/plan/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct PlanQuery {
    pub plan: Option<String>,
    #[serde(rename = "stoppingPlan")]
    pub stopping_plan: Option<bool>,
}

fn handle_plan(
    registry: &Arc<PlanRegistry>,
    raw_id: &str,
    query: PlanQuery,
) -> (StatusCode, String) {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(reject) => return reject,
    };

    match (query.plan, query.stopping_plan) {
        // Mutually exclusive parameters.
        (Some(_), Some(_)) => (StatusCode::BAD_REQUEST, BAD_REQUEST.to_string()),
        (Some(text), None) => match registry.set_plan(id, &text) {
            Ok(()) => (StatusCode::OK, "ok".to_string()),
            Err(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        },
        (None, Some(true)) => {
            registry.stop_plan(id);
            (StatusCode::OK, "ok".to_string())
        }
        (None, Some(false)) => (StatusCode::BAD_REQUEST, BAD_REQUEST.to_string()),
        (None, None) => match registry.current_plan(id) {
            Some(info) => (StatusCode::OK, info.plan),
            None => (StatusCode::OK, "no plan".to_string()),
        },
    }
}

/// GET /task/plan/{id}
pub async fn task_plan(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<PlanQuery>,
) -> impl IntoResponse {
    handle_plan(&state.task_plans, &id, query)
}

/// GET /taskGroup/plan/{id}
pub async fn group_plan(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<PlanQuery>,
) -> impl IntoResponse {
    handle_plan(&state.group_plans, &id, query)
}

/// GET /plans — all active plans across both namespaces.
pub async fn list_plans(State(state): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "tasks": state.task_plans.current_plans(),
        "taskGroups": state.group_plans.current_plans(),
    }))
}

// ── Help ───────────────────────────────────────────────────────

const SERVER_HELP: &str = "\
GET localhost:PORT/task/{id} to get the status of a task
GET localhost:PORT/task/{id}?stopping=true|false to stop or resume a task
GET localhost:PORT/task/{id}?priority=N to set a task's lottery priority
GET localhost:PORT/taskGroup/{id} to get the status of a task group (i.e. process)
GET localhost:PORT/taskGroup/{id}?stopping=true|false to stop or resume a task group
GET localhost:PORT/task/plan/{id} to get the current plan of a task
GET localhost:PORT/task/plan/{id}?plan=2s,3r to install a stop/run plan for a task
GET localhost:PORT/task/plan/{id}?stoppingPlan=true to cancel a task's plan
GET localhost:PORT/taskGroup/plan/{id} for the same operations on a task group
GET localhost:PORT/plans to list all active plans
";

/// GET /help
pub async fn help(State(state): State<ApiState>) -> impl IntoResponse {
    SERVER_HELP.replace("PORT", &state.port.to_string())
}
