//! PostgreSQL member repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::MemberRow;
use crate::repo::MemberRepository;

/// PostgreSQL member repository
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    /// Create a new member repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    async fn member_id_for_user(&self, user_id: i32) -> DbResult<Option<i32>> {
        let client = sqlx::query_scalar::<_, i32>(
            "SELECT member_id FROM clients WHERE user_id = $1 LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if client.is_some() {
            return Ok(client);
        }

        let agent = sqlx::query_scalar::<_, i32>(
            "SELECT member_id FROM agents WHERE user_id = $1 LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agent)
    }

    async fn find_by_id(&self, id: i32) -> DbResult<Option<MemberRow>> {
        let member = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, company, address, phone, logo, service, status::text AS status,
                   badge_color, country, website
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}
