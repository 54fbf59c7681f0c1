//! In-memory directory
//!
//! A single store implementing every repository trait, for tests and for
//! running the portal without a database.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use portal_types::{AttendanceFilter, Role};

use crate::error::{DbError, DbResult};
use crate::models::*;
use crate::repo::*;

#[derive(Debug, Clone)]
struct Placement {
    member_id: i32,
    department: Option<String>,
}

/// In-memory users, organizations, roster, breaks and attendance
#[derive(Default, Clone)]
pub struct MemoryDirectory {
    users: Arc<DashMap<i32, UserRow>>,
    by_email: Arc<DashMap<String, i32>>,
    clients: Arc<DashMap<i32, i32>>,
    agents: Arc<DashMap<i32, Placement>>,
    members: Arc<DashMap<i32, MemberRow>>,
    employees: Arc<DashMap<i32, EmployeeRow>>,
    breaks: Arc<DashMap<i32, BreakSessionRow>>,
    attendance: Arc<DashMap<i32, AttendanceRow>>,
    next_attendance_id: Arc<AtomicI32>,
    email_lookups: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    latency_ms: Arc<AtomicUsize>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user with the given role
    pub fn insert_user(&self, id: i32, email: &str, role: Role) -> i32 {
        self.insert_raw_user(id, email, role.as_str())
    }

    /// Insert a user whose stored `user_type` is an arbitrary string
    pub fn insert_raw_user(&self, id: i32, email: &str, user_type: &str) -> i32 {
        let now = Utc::now();
        self.by_email.insert(email.to_string(), id);
        self.users.insert(
            id,
            UserRow {
                id,
                email: email.to_string(),
                user_type: user_type.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Remove a user and their placements
    pub fn remove_user(&self, email: &str) {
        if let Some((_, id)) = self.by_email.remove(email) {
            self.users.remove(&id);
            self.clients.remove(&id);
            self.agents.remove(&id);
            self.employees.remove(&id);
        }
    }

    /// Insert an organization
    pub fn insert_member(&self, id: i32, company: &str) {
        self.members.insert(
            id,
            MemberRow {
                id,
                company: company.to_string(),
                address: None,
                phone: None,
                logo: None,
                service: None,
                status: Some("Client".to_string()),
                badge_color: None,
                country: None,
                website: None,
            },
        );
    }

    /// Link a client user to an organization
    pub fn add_client(&self, user_id: i32, member_id: i32) {
        self.clients.insert(user_id, member_id);
    }

    /// Place an agent with an organization, registering a bare roster entry
    pub fn add_agent(&self, user_id: i32, member_id: i32, department: Option<&str>) {
        self.agents.insert(
            user_id,
            Placement {
                member_id,
                department: department.map(str::to_string),
            },
        );
        if let Some(user) = self.users.get(&user_id) {
            self.employees
                .entry(user_id)
                .or_insert_with(|| bare_employee(&user, department));
        }
    }

    /// Replace the roster entry for an agent
    pub fn add_employee(&self, row: EmployeeRow) {
        self.employees.insert(row.id, row);
    }

    pub fn insert_break(&self, row: BreakSessionRow) {
        self.breaks.insert(row.id, row);
    }

    pub fn insert_attendance(&self, row: AttendanceRow) {
        self.next_attendance_id.fetch_max(row.id, Ordering::SeqCst);
        self.attendance.insert(row.id, row);
    }

    /// Make every call fail as if the database were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call by the given duration
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as usize, Ordering::SeqCst);
    }

    /// Number of `find_by_email` calls served so far
    pub fn email_lookups(&self) -> usize {
        self.email_lookups.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> DbResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency as u64)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn member_of_agent(&self, user_id: i32) -> Option<Placement> {
        self.agents.get(&user_id).map(|p| p.value().clone())
    }

    fn display_name(&self, user_id: i32) -> (String, String) {
        let email = self
            .users
            .get(&user_id)
            .map(|u| u.email.clone())
            .unwrap_or_default();
        let name = self
            .employees
            .get(&user_id)
            .map(|e| {
                [e.first_name.as_deref(), e.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());
        (name, email)
    }
}

fn bare_employee(user: &UserRow, department: Option<&str>) -> EmployeeRow {
    EmployeeRow {
        id: user.id,
        email: user.email.clone(),
        user_type: user.user_type.clone(),
        first_name: None,
        middle_name: None,
        last_name: None,
        nickname: None,
        profile_picture: None,
        phone: None,
        birthday: None,
        city: None,
        address: None,
        gender: None,
        employee_id: None,
        job_title: None,
        shift_period: None,
        shift_schedule: None,
        shift_time: None,
        work_setup: None,
        employment_status: None,
        hire_type: None,
        staff_source: None,
        start_date: None,
        exit_date: None,
        department_name: department.map(str::to_string),
        department_description: None,
    }
}

#[async_trait]
impl UserRepository for MemoryDirectory {
    async fn find_by_id(&self, id: i32) -> DbResult<Option<UserRow>> {
        self.enter().await?;
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        self.email_lookups.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }
}

#[async_trait]
impl MemberRepository for MemoryDirectory {
    async fn member_id_for_user(&self, user_id: i32) -> DbResult<Option<i32>> {
        self.enter().await?;
        if let Some(member_id) = self.clients.get(&user_id) {
            return Ok(Some(*member_id));
        }
        Ok(self.member_of_agent(user_id).map(|p| p.member_id))
    }

    async fn find_by_id(&self, id: i32) -> DbResult<Option<MemberRow>> {
        self.enter().await?;
        Ok(self.members.get(&id).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl EmployeeRepository for MemoryDirectory {
    async fn list_for_member(&self, member_id: i32) -> DbResult<Vec<EmployeeRow>> {
        self.enter().await?;
        let mut rows: Vec<EmployeeRow> = self
            .employees
            .iter()
            .filter(|e| {
                self.member_of_agent(*e.key())
                    .is_some_and(|p| p.member_id == member_id)
            })
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            (&a.last_name, &a.first_name, &a.email).cmp(&(&b.last_name, &b.first_name, &b.email))
        });
        Ok(rows)
    }

    async fn is_agent_of_member(&self, user_id: i32, member_id: i32) -> DbResult<bool> {
        self.enter().await?;
        Ok(self
            .member_of_agent(user_id)
            .is_some_and(|p| p.member_id == member_id))
    }
}

#[async_trait]
impl BreakRepository for MemoryDirectory {
    async fn active_for_member(&self, member_id: i32) -> DbResult<Vec<BreakSessionRow>> {
        self.enter().await?;
        let today = Utc::now().date_naive().to_string();
        let mut rows: Vec<BreakSessionRow> = self
            .breaks
            .iter()
            .filter(|b| b.end_time.is_none() && b.break_date == today)
            .filter(|b| {
                self.member_of_agent(b.agent_user_id)
                    .is_some_and(|p| p.member_id == member_id)
            })
            .map(|b| b.value().clone())
            .collect();
        rows.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(rows)
    }
}

#[async_trait]
impl AttendanceRepository for MemoryDirectory {
    async fn list_for_member(
        &self,
        member_id: i32,
        filter: &AttendanceFilter,
    ) -> DbResult<Vec<AttendanceRow>> {
        self.enter().await?;
        let mut rows: Vec<AttendanceRow> = self
            .attendance
            .iter()
            .filter(|r| {
                self.member_of_agent(r.employee_id)
                    .is_some_and(|p| p.member_id == member_id)
            })
            .filter(|r| filter.date.map_or(true, |d| r.attendance_date == d))
            .filter(|r| filter.status.map_or(true, |s| r.status == s.as_str()))
            .filter(|r| {
                filter
                    .department
                    .as_deref()
                    .map_or(true, |d| r.department.as_deref() == Some(d))
            })
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            b.attendance_date
                .cmp(&a.attendance_date)
                .then_with(|| a.employee_name.cmp(&b.employee_name))
        });
        Ok(rows)
    }

    async fn create(&self, record: CreateAttendance) -> DbResult<AttendanceRow> {
        self.enter().await?;
        if !self.users.contains_key(&record.agent_user_id) {
            return Err(DbError::NotFound);
        }
        let id = self.next_attendance_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (employee_name, employee_email) = self.display_name(record.agent_user_id);
        let job_title = self
            .employees
            .get(&record.agent_user_id)
            .and_then(|e| e.job_title.clone());
        let row = AttendanceRow {
            id,
            employee_id: record.agent_user_id,
            employee_name,
            employee_email,
            attendance_date: record.attendance_date,
            check_in_time: record.check_in_time,
            check_out_time: record.check_out_time,
            total_hours: record.total_hours,
            status: record.status,
            department: self
                .member_of_agent(record.agent_user_id)
                .and_then(|p| p.department),
            job_title,
            notes: record.notes,
        };
        self.attendance.insert(id, row.clone());
        Ok(row)
    }
}
