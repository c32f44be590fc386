//! Recipient resolution

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::mock;

use crate::domain::mail::{addresses::AddressSpec, errors::GroupError};

/// Source of named recipient groups
#[async_trait]
pub trait GroupRepository: Send + Sync + 'static {
    /// Returns the member addresses of a group, empty for an unknown slug
    async fn members_of(&self, slug: &str) -> Result<Vec<String>, GroupError>;
}

#[cfg(test)]
mock! {
    pub GroupRepository {}

    #[async_trait]
    impl GroupRepository for GroupRepository {
        async fn members_of(&self, slug: &str) -> Result<Vec<String>, GroupError>;
    }
}

/// Read-through cache of BCC addresses forced by a template
#[async_trait]
pub trait ForcedBccCache: Send + Sync + 'static {
    /// Returns the forced BCC list for a template slug, if one is cached
    async fn forced_bcc(&self, slug: &str) -> anyhow::Result<Option<Vec<String>>>;
}

#[cfg(test)]
mock! {
    pub ForcedBccCache {}

    #[async_trait]
    impl ForcedBccCache for ForcedBccCache {
        async fn forced_bcc(&self, slug: &str) -> anyhow::Result<Option<Vec<String>>>;
    }
}

/// Flat address lists for one dispatch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recipients {
    /// Main recipients
    pub to: Vec<String>,

    /// Carbon copy, `None` when the caller gave none
    pub cc: Option<Vec<String>>,

    /// Blind carbon copy, `None` when neither the caller nor the template gave any
    pub bcc: Option<Vec<String>>,
}

impl Recipients {
    /// Builds the CC and BCC lists only, leaving the main recipients empty
    pub fn copies(cc: Option<&AddressSpec>, bcc: Option<&AddressSpec>) -> Self {
        Self {
            to: Vec::new(),
            cc: cc.map(AddressSpec::to_list),
            bcc: bcc.map(AddressSpec::to_list),
        }
    }

    /// Whether there is nobody to deliver to
    pub fn is_empty(&self) -> bool {
        self.to.is_empty()
            && self.cc.as_ref().map_or(true, Vec::is_empty)
            && self.bcc.as_ref().map_or(true, Vec::is_empty)
    }

    /// Adds forced BCC addresses, appending to a non-empty BCC list or replacing an empty one
    pub fn merge_forced_bcc(&mut self, forced: Vec<String>) {
        match self.bcc.as_mut() {
            Some(bcc) if !bcc.is_empty() => bcc.extend(forced),
            _ => self.bcc = Some(forced),
        }
    }
}

/// Turns recipient specifications into address lists
pub struct RecipientResolver {
    groups: Arc<dyn GroupRepository>,
    forced_bcc: Arc<dyn ForcedBccCache>,
}

impl RecipientResolver {
    /// Creates a new recipient resolver
    pub fn new(groups: Arc<dyn GroupRepository>, forced_bcc: Arc<dyn ForcedBccCache>) -> Self {
        Self { groups, forced_bcc }
    }

    /// Resolves the main recipients, CC and BCC for a template.
    ///
    /// # Arguments
    /// * `slug` - The template slug, used to look up forced BCC addresses.
    /// * `recipient` - Literal addresses, or comma separated group slugs.
    /// * `cc` - Literal CC addresses.
    /// * `bcc` - Literal BCC addresses.
    pub async fn resolve(
        &self,
        slug: &str,
        recipient: &AddressSpec,
        cc: Option<&AddressSpec>,
        bcc: Option<&AddressSpec>,
    ) -> Result<Recipients, GroupError> {
        let mut recipients = Recipients::copies(cc, bcc);

        recipients.to = if recipient.is_literal() {
            recipient.to_list()
        } else {
            self.group_emails(&recipient.to_string()).await?
        };

        match self.forced_bcc.forced_bcc(slug).await {
            Ok(Some(forced)) => {
                debug!(slug, count = forced.len(), "merging forced bcc");
                recipients.merge_forced_bcc(forced);
            }
            Ok(None) => {}
            Err(err) => warn!(slug, "forced bcc lookup failed: {:?}", err),
        }

        Ok(recipients)
    }

    async fn group_emails(&self, slugs: &str) -> Result<Vec<String>, GroupError> {
        let mut emails = Vec::new();

        for slug in slugs.split(',') {
            let members = self.groups.members_of(slug.trim()).await?;
            debug!(group = slug, count = members.len(), "expanded mail group");

            emails.extend(members.iter().map(|email| email.trim().to_string()));
        }

        Ok(emails)
    }
}

impl fmt::Debug for RecipientResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientResolver").finish_non_exhaustive()
    }
}
