//! Attendance handlers

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use portal_db::CreateAttendance;
use portal_types::{
    calculate_hours, AttendanceFilter, AttendanceRecord, AttendanceStats, AttendanceStatus,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::extractors::ClientCaller;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceParams {
    pub date: Option<String>,
    pub status: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceListResponse {
    pub attendance: Vec<AttendanceRecord>,
    pub stats: AttendanceStats,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecordAttendanceRequest {
    pub employee_id: Option<i32>,
    pub date: Option<String>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordAttendanceResponse {
    pub attendance: AttendanceRecord,
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/attendance?date=&status=&department=
#[instrument(skip(state, caller), fields(user_id = %caller.user.id))]
pub async fn list_attendance(
    State(state): State<AppState>,
    caller: ClientCaller,
    Query(params): Query<AttendanceParams>,
) -> ApiResult<Json<AttendanceListResponse>> {
    let member_id = caller.member_id()?;
    let filter = AttendanceFilter::from_query(
        params.date.as_deref(),
        params.status.as_deref(),
        params.department.as_deref(),
    )?;

    let attendance = state
        .directory
        .attendance
        .list_for_member(member_id, &filter)
        .await?
        .into_iter()
        .map(AttendanceRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let stats = AttendanceStats::from_records(&attendance);

    Ok(Json(AttendanceListResponse {
        attendance,
        stats,
        success: true,
    }))
}

/// POST /api/attendance
#[instrument(skip(state, caller, req), fields(user_id = %caller.user.id))]
pub async fn record_attendance(
    State(state): State<AppState>,
    caller: ClientCaller,
    Json(req): Json<RecordAttendanceRequest>,
) -> ApiResult<Json<RecordAttendanceResponse>> {
    let (Some(employee_id), Some(date)) = (req.employee_id, req.date.as_deref()) else {
        return Err(ApiError::BadRequest(
            "Employee ID and date are required".to_string(),
        ));
    };
    let member_id = caller.member_id()?;

    let attendance_date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date: {date}")))?;
    let status = match req.status.as_deref() {
        Some(s) if !s.trim().is_empty() => s.parse()?,
        _ => AttendanceStatus::Present,
    };
    let total_hours = calculate_hours(req.check_in_time.as_deref(), req.check_out_time.as_deref())?;

    if !state
        .directory
        .employees
        .is_agent_of_member(employee_id, member_id)
        .await?
    {
        return Err(ApiError::BadRequest(
            "Employee does not belong to your organization".to_string(),
        ));
    }

    let row = state
        .directory
        .attendance
        .create(CreateAttendance {
            agent_user_id: employee_id,
            attendance_date,
            check_in_time: req.check_in_time,
            check_out_time: req.check_out_time,
            total_hours,
            status: status.as_str().to_string(),
            notes: req.notes,
        })
        .await?;

    tracing::info!(employee_id, %attendance_date, %status, "Attendance recorded");
    Ok(Json(RecordAttendanceResponse {
        attendance: AttendanceRecord::try_from(row)?,
        success: true,
    }))
}
