//! Sender credential resolution

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(test)]
use mockall::mock;

use crate::domain::mail::errors::CredentialError;

lazy_static! {
    static ref ANGLE_ADDRESS: Regex = Regex::new(r"<(\S+)>").unwrap();
    static ref DOMAIN: Regex = Regex::new(r"\S+@(\S+)").unwrap();
    static ref ANGLE_DOMAIN: Regex = Regex::new(r"\S+@(\S+)>").unwrap();
}

/// Transport connection parameters stored for a sender
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// SMTP host
    pub host: String,

    /// SMTP port
    pub port: u16,

    /// Login, also the pattern senders are matched against
    pub username: String,

    /// Password
    pub password: String,

    /// Upgrade the connection with STARTTLS
    #[serde(default)]
    pub use_tls: bool,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"********")
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

/// Stored credentials
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Returns the first credential whose username contains `needle`
    async fn find_by_username_containing(
        &self,
        needle: &str,
    ) -> Result<Option<Credential>, CredentialError>;
}

#[cfg(test)]
mock! {
    pub CredentialRepository {}

    #[async_trait]
    impl CredentialRepository for CredentialRepository {
        async fn find_by_username_containing(&self, needle: &str) -> Result<Option<Credential>, CredentialError>;
    }
}

/// Read-through cache of credentials keyed by exact sender address
#[async_trait]
pub trait CredentialCache: Send + Sync + 'static {
    /// Returns the cached credential for a sender address
    async fn credential_for(&self, from_email: &str) -> anyhow::Result<Option<Credential>>;
}

#[cfg(test)]
mock! {
    pub CredentialCache {}

    #[async_trait]
    impl CredentialCache for CredentialCache {
        async fn credential_for(&self, from_email: &str) -> anyhow::Result<Option<Credential>>;
    }
}

/// Candidate usernames for a sender, most specific first.
///
/// Accepts both `user@example.com` and `Name <user@example.com>`.
pub fn username_candidates(from_email: &str) -> Vec<String> {
    let captured = |regex: &Regex| {
        regex
            .captures(from_email)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    };

    [
        Some(from_email.to_string()),
        captured(&ANGLE_ADDRESS),
        captured(&DOMAIN),
        captured(&ANGLE_DOMAIN),
    ]
    .into_iter()
    .flatten()
    .filter(|candidate| !candidate.is_empty())
    .collect()
}

/// Finds the credential to send as a given sender
pub struct CredentialResolver {
    cache: Arc<dyn CredentialCache>,
    repo: Arc<dyn CredentialRepository>,
}

impl CredentialResolver {
    /// Creates a new credential resolver
    pub fn new(cache: Arc<dyn CredentialCache>, repo: Arc<dyn CredentialRepository>) -> Self {
        Self { cache, repo }
    }

    /// Finds a credential for the sender.
    ///
    /// The cache is consulted with the exact address first, then each
    /// [`username_candidates`] entry is tried against the repository.
    ///
    /// # Returns
    /// [`None`] when nothing matches, in which case the default transport applies.
    pub async fn find_credential(
        &self,
        from_email: &str,
    ) -> Result<Option<Credential>, CredentialError> {
        match self.cache.credential_for(from_email).await {
            Ok(Some(credential)) => {
                debug!(from_email, "credential found in cache");
                return Ok(Some(credential));
            }
            Ok(None) => {}
            Err(err) => warn!(from_email, "credential cache lookup failed: {:?}", err),
        }

        for candidate in username_candidates(from_email) {
            if let Some(credential) = self.repo.find_by_username_containing(&candidate).await? {
                debug!(from_email, candidate, "credential matched");
                return Ok(Some(credential));
            }
        }

        Ok(None)
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use testresult::TestResult;

    use super::*;

    fn credential(username: &str) -> Credential {
        Credential {
            host: "smtp.mail.ru".to_string(),
            port: 587,
            username: username.to_string(),
            password: "secret".to_string(),
            use_tls: true,
        }
    }

    fn empty_cache() -> MockCredentialCache {
        let mut cache = MockCredentialCache::new();
        cache.expect_credential_for().returning(|_| Ok(None));
        cache
    }

    fn repository_with(usernames: &[&str]) -> MockCredentialRepository {
        let stored: Vec<String> = usernames.iter().map(|u| u.to_string()).collect();

        let mut repo = MockCredentialRepository::new();
        repo.expect_find_by_username_containing()
            .returning(move |needle| {
                Ok(stored
                    .iter()
                    .find(|username| username.contains(needle))
                    .map(|username| credential(username)))
            });
        repo
    }

    #[test]
    fn test_candidates_for_plain_address() {
        assert_eq!(
            username_candidates("foo@mail.ru"),
            vec!["foo@mail.ru", "mail.ru"]
        );
    }

    #[test]
    fn test_candidates_for_named_address() {
        assert_eq!(
            username_candidates("John <foo@mail.ru>"),
            vec!["John <foo@mail.ru>", "foo@mail.ru", "mail.ru>", "mail.ru"]
        );
    }

    #[test]
    fn test_candidates_for_bare_name() {
        assert_eq!(username_candidates("postmaster"), vec!["postmaster"]);
    }

    #[tokio::test]
    async fn test_domain_credential_matches_named_sender() -> TestResult {
        let resolver = CredentialResolver::new(
            Arc::new(empty_cache()),
            Arc::new(repository_with(&["mail.ru"])),
        );

        let found = resolver.find_credential("John <foo@mail.ru>").await?;

        assert_eq!(found.map(|c| c.username), Some("mail.ru".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_domain_has_no_credential() -> TestResult {
        let resolver = CredentialResolver::new(
            Arc::new(empty_cache()),
            Arc::new(repository_with(&["mail.ru"])),
        );

        assert!(resolver.find_credential("foo@other.com").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_exact_username_wins_over_domain() -> TestResult {
        let resolver = CredentialResolver::new(
            Arc::new(empty_cache()),
            Arc::new(repository_with(&["noreply@mail.ru", "mail.ru"])),
        );

        let found = resolver.find_credential("noreply@mail.ru").await?;

        assert_eq!(found.map(|c| c.username), Some("noreply@mail.ru".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_cached_credential_skips_repository() -> TestResult {
        let mut cache = MockCredentialCache::new();
        cache
            .expect_credential_for()
            .withf(|from| from == "foo@mail.ru")
            .times(1)
            .returning(|_| Ok(Some(credential("cached"))));

        let mut repo = MockCredentialRepository::new();
        repo.expect_find_by_username_containing().times(0);

        let resolver = CredentialResolver::new(Arc::new(cache), Arc::new(repo));

        let found = resolver.find_credential("foo@mail.ru").await?;

        assert_eq!(found.map(|c| c.username), Some("cached".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_cache_failure_falls_back_to_repository() -> TestResult {
        let mut cache = MockCredentialCache::new();
        cache
            .expect_credential_for()
            .returning(|_| Err(anyhow!("cache down")));

        let resolver =
            CredentialResolver::new(Arc::new(cache), Arc::new(repository_with(&["mail.ru"])));

        assert!(resolver.find_credential("foo@mail.ru").await?.is_some());

        Ok(())
    }

    #[test]
    fn test_debug_output_hides_password() {
        let output = format!("{:?}", credential("mail.ru"));

        assert!(!output.contains("secret"));
    }
}
