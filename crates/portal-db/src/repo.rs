//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use portal_types::{AttendanceFilter, Organization};

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: i32) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;
}

/// Member (client organization) repository trait
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Member a user belongs to, via `clients` first and then `agents`
    async fn member_id_for_user(&self, user_id: i32) -> DbResult<Option<i32>>;

    /// Find a member by ID
    async fn find_by_id(&self, id: i32) -> DbResult<Option<MemberRow>>;

    /// Organization a user belongs to
    async fn organization_for_user(&self, user_id: i32) -> DbResult<Option<Organization>> {
        let Some(member_id) = self.member_id_for_user(user_id).await? else {
            tracing::debug!(user_id, "no member found for user");
            return Ok(None);
        };
        Ok(self.find_by_id(member_id).await?.map(Organization::from))
    }
}

/// Employee (agent roster) repository trait
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// All agents placed with a member, ordered by name then email
    async fn list_for_member(&self, member_id: i32) -> DbResult<Vec<EmployeeRow>>;

    /// Whether a user is an agent of the given member
    async fn is_agent_of_member(&self, user_id: i32, member_id: i32) -> DbResult<bool>;
}

/// Break session repository trait
#[async_trait]
pub trait BreakRepository: Send + Sync {
    /// Today's breaks without an end time for agents of a member, newest first
    async fn active_for_member(&self, member_id: i32) -> DbResult<Vec<BreakSessionRow>>;
}

/// Attendance repository trait
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Attendance of a member's agents, narrowed by the filter
    async fn list_for_member(
        &self,
        member_id: i32,
        filter: &AttendanceFilter,
    ) -> DbResult<Vec<AttendanceRow>>;

    /// Store a new attendance record
    async fn create(&self, record: CreateAttendance) -> DbResult<AttendanceRow>;
}

/// Create attendance input
#[derive(Debug, Clone)]
pub struct CreateAttendance {
    pub agent_user_id: i32,
    pub attendance_date: NaiveDate,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub total_hours: f64,
    pub status: String,
    pub notes: Option<String>,
}
