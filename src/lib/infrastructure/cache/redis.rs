//! Redis backed read-through caches

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::de::DeserializeOwned;

use crate::domain::mail::{Credential, CredentialCache, ForcedBccCache};

/// Redis connection details
#[derive(Clone, Debug, Parser)]
pub struct RedisConfig {
    /// The Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1/")]
    pub redis_url: String,
}

/// Key under which a sender's credential is cached
pub fn credential_key(from_email: &str) -> String {
    format!("dbmail:credential:{}", from_email)
}

/// Key under which a template's forced BCC list is cached
pub fn bcc_key(slug: &str) -> String {
    format!("dbmail:bcc:{}", slug)
}

/// Credential and forced BCC caches stored as JSON strings.
///
/// Entries are written by whatever manages templates and credentials;
/// this type only reads them.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis
    #[mutants::skip]
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.redis_url.as_str())?;

        Ok(Self {
            connection: ConnectionManager::new(client).await?,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(key).await?;

        Ok(raw.map(|raw| serde_json::from_str(&raw)).transpose()?)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialCache for RedisCache {
    #[mutants::skip]
    async fn credential_for(&self, from_email: &str) -> Result<Option<Credential>> {
        self.get_json(&credential_key(from_email)).await
    }
}

#[async_trait]
impl ForcedBccCache for RedisCache {
    #[mutants::skip]
    async fn forced_bcc(&self, slug: &str) -> Result<Option<Vec<String>>> {
        self.get_json(&bcc_key(slug)).await
    }
}
