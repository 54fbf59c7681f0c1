//! Roster and break-session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Role, UserId};

/// Agent placed with a client organization, with personal and job details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: UserId,
    pub email: String,
    #[serde(rename = "user_type")]
    pub role: Role,
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

impl Employee {
    /// "First Last", falling back to the email when no name is on file
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

/// Break taken by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakSession {
    pub id: i32,
    pub agent_user_id: UserId,
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

impl BreakSession {
    /// Break has not ended yet
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Paused and not yet resumed
    pub fn is_paused(&self) -> bool {
        self.pause_time.is_some() && self.resume_time.is_none()
    }
}
