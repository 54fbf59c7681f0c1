//! PostgreSQL attendance repository implementation

use async_trait::async_trait;
use portal_types::AttendanceFilter;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::AttendanceRow;
use crate::repo::{AttendanceRepository, CreateAttendance};

/// PostgreSQL attendance repository
#[derive(Clone)]
pub struct PgAttendanceRepository {
    pool: PgPool,
}

impl PgAttendanceRepository {
    /// Create a new attendance repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn list_for_member(
        &self,
        member_id: i32,
        filter: &AttendanceFilter,
    ) -> DbResult<Vec<AttendanceRow>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT ar.id, ar.agent_user_id AS employee_id,
                   COALESCE(NULLIF(TRIM(CONCAT_WS(' ', pi.first_name, pi.last_name)), ''), u.email)
                       AS employee_name,
                   u.email AS employee_email, ar.attendance_date,
                   ar.check_in_time::text AS check_in_time,
                   ar.check_out_time::text AS check_out_time,
                   COALESCE(ar.total_hours, 0)::float8 AS total_hours,
                   ar.status, d.name AS department, ji.job_title, ar.notes
            FROM attendance_records ar
            JOIN agents a ON a.user_id = ar.agent_user_id
            JOIN users u ON u.id = ar.agent_user_id
            LEFT JOIN personal_info pi ON pi.user_id = ar.agent_user_id
            LEFT JOIN job_info ji ON ji.agent_user_id = ar.agent_user_id
            LEFT JOIN departments d ON d.id = a.department_id
            WHERE a.member_id = $1
              AND ($2::date IS NULL OR ar.attendance_date = $2)
              AND ($3::text IS NULL OR ar.status = $3)
              AND ($4::text IS NULL OR d.name = $4)
            ORDER BY ar.attendance_date DESC, employee_name
            "#,
        )
        .bind(member_id)
        .bind(filter.date)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.department.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create(&self, record: CreateAttendance) -> DbResult<AttendanceRow> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            WITH inserted AS (
                INSERT INTO attendance_records
                    (agent_user_id, attendance_date, check_in_time, check_out_time,
                     total_hours, status, notes)
                VALUES ($1, $2, $3::time, $4::time, $5, $6, $7)
                RETURNING id, agent_user_id, attendance_date, check_in_time,
                          check_out_time, total_hours, status, notes
            )
            SELECT ins.id, ins.agent_user_id AS employee_id,
                   COALESCE(NULLIF(TRIM(CONCAT_WS(' ', pi.first_name, pi.last_name)), ''), u.email)
                       AS employee_name,
                   u.email AS employee_email, ins.attendance_date,
                   ins.check_in_time::text AS check_in_time,
                   ins.check_out_time::text AS check_out_time,
                   COALESCE(ins.total_hours, 0)::float8 AS total_hours,
                   ins.status, d.name AS department, ji.job_title, ins.notes
            FROM inserted ins
            JOIN users u ON u.id = ins.agent_user_id
            LEFT JOIN agents a ON a.user_id = ins.agent_user_id
            LEFT JOIN personal_info pi ON pi.user_id = ins.agent_user_id
            LEFT JOIN job_info ji ON ji.agent_user_id = ins.agent_user_id
            LEFT JOIN departments d ON d.id = a.department_id
            "#,
        )
        .bind(record.agent_user_id)
        .bind(record.attendance_date)
        .bind(record.check_in_time)
        .bind(record.check_out_time)
        .bind(record.total_hours)
        .bind(record.status)
        .bind(record.notes)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(id = row.id, agent_user_id = row.employee_id, "attendance record created");
        Ok(row)
    }
}
