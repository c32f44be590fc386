//! Mail templates

use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use crate::domain::mail::errors::GetTemplateError;

/// A sender identity configured on a template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailFromEmail {
    /// Display name
    pub name: Option<String>,

    /// Sender address
    pub email: String,
}

impl MailFromEmail {
    /// The value used as the `From` header
    pub fn mail_from(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} <{}>", name, self.email),
            _ => self.email.clone(),
        }
    }
}

/// A file attached to every message sent from a template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailFile {
    /// Human readable name
    pub name: String,

    /// Stored path, relative to the media root unless absolute
    pub path: PathBuf,
}

/// Locale specific overrides
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Translation {
    /// Subject override
    pub subject: Option<String>,

    /// Body override
    pub message: Option<String>,
}

/// Localizable template fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateField {
    /// The subject line
    Subject,

    /// The message body
    Message,
}

/// A stored mail template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailTemplate {
    /// Template ID
    pub id: Uuid,

    /// Unique lookup key
    pub slug: String,

    /// Default subject source
    pub subject: String,

    /// Default body source
    pub message: String,

    /// Send as HTML with a plain text alternative
    pub is_html: bool,

    /// Inactive templates are never sent
    pub is_active: bool,

    /// Configured sender identity
    pub from_email: Option<MailFromEmail>,

    /// Overrides keyed by locale code
    pub translations: BTreeMap<String, Translation>,

    /// Attached files, in order
    pub files: Vec<MailFile>,
}

impl MailTemplate {
    /// The default, unlocalized value of a field
    pub fn field(&self, field: TemplateField) -> &str {
        match field {
            TemplateField::Subject => &self.subject,
            TemplateField::Message => &self.message,
        }
    }

    /// The value of a field for a locale.
    ///
    /// Falls back to [`MailTemplate::field`] when no locale is given, the
    /// locale has no translation, or the translated value is empty.
    pub fn localized(&self, field: TemplateField, language: Option<&str>) -> &str {
        language
            .and_then(|language| self.translations.get(language))
            .and_then(|translation| match field {
                TemplateField::Subject => translation.subject.as_deref(),
                TemplateField::Message => translation.message.as_deref(),
            })
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.field(field))
    }
}

/// Template store
#[async_trait]
pub trait TemplateRepository: Send + Sync + 'static {
    /// Fetch a template by its slug
    async fn get_by_slug(&self, slug: &str) -> Result<MailTemplate, GetTemplateError>;
}

#[cfg(test)]
mock! {
    pub TemplateRepository {}

    #[async_trait]
    impl TemplateRepository for TemplateRepository {
        async fn get_by_slug(&self, slug: &str) -> Result<MailTemplate, GetTemplateError>;
    }
}
