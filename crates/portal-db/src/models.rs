//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Columns whose SQL type differs between deployments (dates, times of day)
//! are cast to text in the queries.

use chrono::{DateTime, NaiveDate, Utc};
use portal_types::{
    AttendanceRecord, BreakSession, Employee, InternalUser, MemberId, Organization, Role, UserId,
};
use sqlx::FromRow;

use crate::error::DbResult;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub email: String,
    pub user_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member (client organization) row from the database
#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub id: i32,
    pub company: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub logo: Option<String>,
    pub service: Option<String>,
    pub status: Option<String>,
    pub badge_color: Option<String>,
    pub country: Option<String>,
    pub website: Option<Vec<String>>,
}

/// Agent of a member joined with personal, job and department info
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeRow {
    pub id: i32,
    pub email: String,
    pub user_type: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub profile_picture: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub employee_id: Option<String>,
    pub job_title: Option<String>,
    pub shift_period: Option<String>,
    pub shift_schedule: Option<String>,
    pub shift_time: Option<String>,
    pub work_setup: Option<String>,
    pub employment_status: Option<String>,
    pub hire_type: Option<String>,
    pub staff_source: Option<String>,
    pub start_date: Option<String>,
    pub exit_date: Option<String>,
    pub department_name: Option<String>,
    pub department_description: Option<String>,
}

/// Break session row joined with the agent's name
#[derive(Debug, Clone, FromRow)]
pub struct BreakSessionRow {
    pub id: i32,
    pub agent_user_id: i32,
    pub break_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub pause_time: Option<DateTime<Utc>>,
    pub resume_time: Option<DateTime<Utc>>,
    pub pause_used: Option<bool>,
    pub time_remaining_at_pause: Option<i32>,
    pub break_date: String,
    pub created_at: DateTime<Utc>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
}

/// Attendance row joined with the agent's name and department
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRow {
    pub id: i32,
    pub employee_id: i32,
    pub employee_name: String,
    pub employee_email: String,
    pub attendance_date: NaiveDate,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub total_hours: f64,
    pub status: String,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub notes: Option<String>,
}

// Conversion implementations from Row types to portal-types domain types
impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Parse the stored `user_type`
    pub fn role(&self) -> DbResult<Role> {
        Ok(self.user_type.parse()?)
    }

    /// Convert to the domain user
    pub fn to_internal_user(&self) -> DbResult<InternalUser> {
        Ok(InternalUser::new(self.id, self.email.clone(), self.role()?))
    }
}

impl MemberRow {
    /// Convert to domain MemberId
    pub fn member_id(&self) -> MemberId {
        MemberId(self.id)
    }
}

impl From<MemberRow> for Organization {
    fn from(row: MemberRow) -> Self {
        Self {
            id: MemberId(row.id),
            name: row.company,
            address: row.address,
            phone: row.phone,
            logo: row.logo,
            service: row.service,
            status: row.status,
            badge_color: row.badge_color,
            country: row.country,
            website: row.website.unwrap_or_default(),
        }
    }
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = crate::DbError;

    fn try_from(row: EmployeeRow) -> DbResult<Self> {
        Ok(Self {
            id: UserId(row.id),
            email: row.email,
            role: row.user_type.parse()?,
            first_name: row.first_name,
            middle_name: row.middle_name,
            last_name: row.last_name,
            nickname: row.nickname,
            profile_picture: row.profile_picture,
            phone: row.phone,
            birthday: row.birthday,
            city: row.city,
            address: row.address,
            gender: row.gender,
            employee_id: row.employee_id,
            job_title: row.job_title,
            shift_period: row.shift_period,
            shift_schedule: row.shift_schedule,
            shift_time: row.shift_time,
            work_setup: row.work_setup,
            employment_status: row.employment_status,
            hire_type: row.hire_type,
            staff_source: row.staff_source,
            start_date: row.start_date,
            exit_date: row.exit_date,
            department_name: row.department_name,
            department_description: row.department_description,
        })
    }
}

impl From<BreakSessionRow> for BreakSession {
    fn from(row: BreakSessionRow) -> Self {
        Self {
            id: row.id,
            agent_user_id: UserId(row.agent_user_id),
            break_type: row.break_type,
            start_time: row.start_time,
            end_time: row.end_time,
            duration_minutes: row.duration_minutes,
            pause_time: row.pause_time,
            resume_time: row.resume_time,
            pause_used: row.pause_used,
            time_remaining_at_pause: row.time_remaining_at_pause,
            break_date: row.break_date,
            created_at: row.created_at,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            full_name: row.full_name,
        }
    }
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = crate::DbError;

    fn try_from(row: AttendanceRow) -> DbResult<Self> {
        Ok(Self {
            id: row.id,
            employee_id: UserId(row.employee_id),
            employee_name: row.employee_name,
            employee_email: row.employee_email,
            date: row.attendance_date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            total_hours: row.total_hours,
            status: row.status.parse()?,
            department: row.department,
            job_title: row.job_title,
            notes: row.notes,
        })
    }
}
