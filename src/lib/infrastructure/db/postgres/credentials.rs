//! Postgres implementation of the CredentialRepository trait

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{query_as, FromRow};

use crate::{
    domain::mail::{errors::CredentialError, Credential, CredentialRepository},
    infrastructure::db::postgres::PostgresDatabase,
};

#[derive(FromRow)]
struct CredentialRecord {
    host: String,
    port: i32,
    username: String,
    password: String,
    use_tls: bool,
}

impl TryFrom<CredentialRecord> for Credential {
    type Error = anyhow::Error;

    fn try_from(record: CredentialRecord) -> Result<Self, Self::Error> {
        Ok(Credential {
            port: u16::try_from(record.port)
                .map_err(|_| anyhow!("invalid port {} for {}", record.port, record.host))?,
            host: record.host,
            username: record.username,
            password: record.password,
            use_tls: record.use_tls,
        })
    }
}

#[async_trait]
impl CredentialRepository for PostgresDatabase {
    #[mutants::skip]
    async fn find_by_username_containing(
        &self,
        needle: &str,
    ) -> Result<Option<Credential>, CredentialError> {
        query_as::<_, CredentialRecord>(
            r#"
            SELECT host, port, username, password, use_tls
            FROM mail_from_email_credentials
            WHERE strpos(username, $1) > 0
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(needle)
        .fetch_optional(&self.pool)
        .await?
        .map(Credential::try_from)
        .transpose()
        .map_err(CredentialError::from)
    }
}
