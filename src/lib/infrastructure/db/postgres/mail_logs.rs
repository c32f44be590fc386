//! Postgres implementation of the DispatchLogger trait

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::query;

use crate::{
    domain::mail::{errors::LogError, DispatchAttempt, DispatchLogger},
    infrastructure::db::postgres::PostgresDatabase,
};

#[async_trait]
impl DispatchLogger for PostgresDatabase {
    #[mutants::skip]
    #[tracing::instrument(skip_all, level = "debug")]
    async fn store(&self, attempt: &DispatchAttempt) -> Result<(), LogError> {
        let num = i32::try_from(attempt.num)
            .map_err(|_| anyhow!("attempt number {} out of range", attempt.num))?;

        query(
            r#"
            INSERT INTO mail_logs (
                id, template_id, to_addresses, cc_addresses, bcc_addresses,
                status, is_sent, user_id, num, error_message, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.template_id)
        .bind(&attempt.to)
        .bind(&attempt.cc)
        .bind(&attempt.bcc)
        .bind(attempt.status.as_str())
        .bind(attempt.is_sent())
        .bind(attempt.user_id)
        .bind(num)
        .bind(attempt.error_message.as_deref())
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
