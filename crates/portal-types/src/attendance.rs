//! Attendance records, filters and statistics

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{PortalError, UserId};

/// Daily attendance status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    Leave,
}

impl AttendanceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::HalfDay => "half-day",
            Self::Leave => "leave",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            "half-day" | "half_day" | "halfday" => Ok(Self::HalfDay),
            "leave" => Ok(Self::Leave),
            _ => Err(PortalError::InvalidAttendanceStatus(s.to_string())),
        }
    }
}

/// One agent's attendance for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i32,
    pub employee_id: UserId,
    pub employee_name: String,
    pub employee_email: String,
    pub date: NaiveDate,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub total_hours: f64,
    pub status: AttendanceStatus,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub notes: Option<String>,
}

/// Attendance entry to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttendance {
    pub employee_id: UserId,
    pub date: NaiveDate,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

impl NewAttendance {
    /// Hours worked between check-in and check-out
    pub fn total_hours(&self) -> Result<f64, PortalError> {
        calculate_hours(self.check_in_time.as_deref(), self.check_out_time.as_deref())
    }
}

/// Optional narrowing of an attendance listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub department: Option<String>,
}

impl AttendanceFilter {
    /// Build a filter from raw query parameters; empty values and `all` mean
    /// "no filter".
    pub fn from_query(
        date: Option<&str>,
        status: Option<&str>,
        department: Option<&str>,
    ) -> Result<Self, PortalError> {
        let date = selected(date)
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|_| PortalError::InvalidDate(d.to_string()))
            })
            .transpose()?;
        let status = selected(status).map(str::parse).transpose()?;
        let department = selected(department).map(str::to_string);

        Ok(Self {
            date,
            status,
            department,
        })
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.date.map_or(true, |d| record.date == d)
            && self.status.map_or(true, |s| record.status == s)
            && self
                .department
                .as_deref()
                .map_or(true, |d| record.department.as_deref() == Some(d))
    }
}

fn selected(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Counts per status over a set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub half_day: u32,
    pub leave: u32,
    /// `present / total` as a rounded percentage, 0 when there are no records
    pub present_percentage: u32,
}

impl AttendanceStats {
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total += 1;
            match record.status {
                AttendanceStatus::Present => stats.present += 1,
                AttendanceStatus::Absent => stats.absent += 1,
                AttendanceStatus::Late => stats.late += 1,
                AttendanceStatus::HalfDay => stats.half_day += 1,
                AttendanceStatus::Leave => stats.leave += 1,
            }
        }
        if stats.total > 0 {
            stats.present_percentage =
                (f64::from(stats.present) / f64::from(stats.total) * 100.0).round() as u32;
        }
        stats
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, PortalError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| PortalError::InvalidTime(value.to_string()))
}

/// Hours between two times of day, rounded to two decimals.
///
/// A missing time yields 0. A check-out earlier than the check-in is an
/// overnight shift and wraps past midnight.
pub fn calculate_hours(check_in: Option<&str>, check_out: Option<&str>) -> Result<f64, PortalError> {
    let (Some(check_in), Some(check_out)) = (check_in, check_out) else {
        return Ok(0.0);
    };
    let start = parse_time(check_in)?;
    let end = parse_time(check_out)?;

    let mut seconds = (end - start).num_seconds();
    if seconds < 0 {
        seconds += 24 * 60 * 60;
    }

    let hours = seconds as f64 / 3600.0;
    Ok((hours * 100.0).round() / 100.0)
}
