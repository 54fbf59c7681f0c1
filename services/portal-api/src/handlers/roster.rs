//! Roster and break handlers

use axum::extract::State;
use axum::Json;
use portal_types::{BreakSession, Employee};
use serde::Serialize;
use tracing::instrument;

use crate::error::ApiResult;
use crate::extractors::ClientCaller;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EmployeesResponse {
    pub employees: Vec<Employee>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakSessionsResponse {
    pub break_sessions: Vec<BreakSession>,
}

/// GET /api/employees
#[instrument(skip_all, fields(user_id = %caller.user.id))]
pub async fn list_employees(
    State(state): State<AppState>,
    caller: ClientCaller,
) -> ApiResult<Json<EmployeesResponse>> {
    let member_id = caller.member_id()?;

    let employees = state
        .directory
        .employees
        .list_for_member(member_id)
        .await?
        .into_iter()
        .map(Employee::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(member_id, count = employees.len(), "Employees listed");
    Ok(Json(EmployeesResponse { employees }))
}

/// GET /api/breaks
///
/// Breaks running right now for the client's agents
#[instrument(skip_all, fields(user_id = %caller.user.id))]
pub async fn list_active_breaks(
    State(state): State<AppState>,
    caller: ClientCaller,
) -> ApiResult<Json<BreakSessionsResponse>> {
    let member_id = caller.member_id()?;

    let break_sessions = state
        .directory
        .breaks
        .active_for_member(member_id)
        .await?
        .into_iter()
        .map(BreakSession::from)
        .collect();

    Ok(Json(BreakSessionsResponse { break_sessions }))
}
