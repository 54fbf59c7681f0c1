//! PostgreSQL employee repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::EmployeeRow;
use crate::repo::EmployeeRepository;

/// PostgreSQL employee repository
#[derive(Clone)]
pub struct PgEmployeeRepository {
    pool: PgPool,
}

impl PgEmployeeRepository {
    /// Create a new employee repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for PgEmployeeRepository {
    async fn list_for_member(&self, member_id: i32) -> DbResult<Vec<EmployeeRow>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT u.id, u.email, u.user_type::text AS user_type,
                   pi.first_name, pi.middle_name, pi.last_name, pi.nickname,
                   pi.profile_picture, pi.phone, pi.birthday::text AS birthday,
                   pi.city, pi.address, pi.gender::text AS gender,
                   ji.employee_id, ji.job_title, ji.shift_period, ji.shift_schedule,
                   ji.shift_time, ji.work_setup, ji.employment_status, ji.hire_type,
                   ji.staff_source, ji.start_date::text AS start_date,
                   ji.exit_date::text AS exit_date,
                   d.name AS department_name, d.description AS department_description
            FROM agents a
            JOIN users u ON u.id = a.user_id
            LEFT JOIN personal_info pi ON pi.user_id = u.id
            LEFT JOIN job_info ji ON ji.agent_user_id = u.id
            LEFT JOIN departments d ON d.id = a.department_id
            WHERE a.member_id = $1
            ORDER BY pi.last_name NULLS LAST, pi.first_name NULLS LAST, u.email
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn is_agent_of_member(&self, user_id: i32, member_id: i32) -> DbResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM agents WHERE user_id = $1 AND member_id = $2)",
        )
        .bind(user_id)
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
