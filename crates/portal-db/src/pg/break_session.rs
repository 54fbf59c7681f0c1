//! PostgreSQL break session repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::BreakSessionRow;
use crate::repo::BreakRepository;

/// PostgreSQL break session repository
#[derive(Clone)]
pub struct PgBreakRepository {
    pool: PgPool,
}

impl PgBreakRepository {
    /// Create a new break session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BreakRepository for PgBreakRepository {
    async fn active_for_member(&self, member_id: i32) -> DbResult<Vec<BreakSessionRow>> {
        let rows = sqlx::query_as::<_, BreakSessionRow>(
            r#"
            SELECT bs.id, bs.agent_user_id, bs.break_type::text AS break_type,
                   bs.start_time, bs.end_time, bs.duration_minutes,
                   bs.pause_time, bs.resume_time, bs.pause_used,
                   bs.time_remaining_at_pause, bs.break_date::text AS break_date,
                   bs.created_at, u.email, pi.first_name, pi.last_name,
                   COALESCE(NULLIF(TRIM(CONCAT_WS(' ', pi.first_name, pi.last_name)), ''), u.email)
                       AS full_name
            FROM break_sessions bs
            JOIN agents a ON a.user_id = bs.agent_user_id
            JOIN users u ON u.id = bs.agent_user_id
            LEFT JOIN personal_info pi ON pi.user_id = bs.agent_user_id
            WHERE a.member_id = $1
              AND bs.end_time IS NULL
              AND bs.break_date = CURRENT_DATE
            ORDER BY bs.start_time DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
