//! Postgres implementation of the GroupRepository trait

use async_trait::async_trait;
use sqlx::query_scalar;

use crate::{
    domain::mail::{errors::GroupError, GroupRepository},
    infrastructure::db::postgres::PostgresDatabase,
};

#[async_trait]
impl GroupRepository for PostgresDatabase {
    #[mutants::skip]
    async fn members_of(&self, slug: &str) -> Result<Vec<String>, GroupError> {
        Ok(query_scalar::<_, String>(
            r#"
            SELECT e.email
            FROM mail_group_emails e
            JOIN mail_groups g ON g.id = e.group_id
            WHERE g.slug = $1
            ORDER BY e.id
            "#,
        )
        .bind(slug)
        .fetch_all(&self.pool)
        .await?)
    }
}
