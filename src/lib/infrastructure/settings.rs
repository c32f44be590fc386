//! Dispatch settings

use std::path::PathBuf;

use clap::Parser;

use crate::domain::mail::{ContextBuilder, DispatchConfig, Site};

/// Process-wide dispatch settings
#[derive(Clone, Debug, Parser)]
pub struct DispatchSettings {
    /// Sender used when neither the caller nor the template names one
    #[arg(long, env = "DEFAULT_FROM_EMAIL", default_value = "webmaster@localhost")]
    pub default_from_email: String,

    /// Locale used when the caller gives none
    #[arg(long, env = "LANGUAGE_CODE", default_value = "en")]
    pub language_code: String,

    /// Debug mode
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// Log every rendering context (only honoured in debug mode)
    #[arg(long, env = "DBMAIL_SHOW_CONTEXT")]
    pub show_context: bool,

    /// Base directory for relative template file paths
    #[arg(long, env = "MEDIA_ROOT")]
    pub media_root: Option<PathBuf>,

    /// The current site's ID
    #[arg(long, env = "SITE_ID", default_value = "1")]
    pub site_id: i64,

    /// The current site's domain
    #[arg(long, env = "SITE_DOMAIN", default_value = "example.com")]
    pub site_domain: String,

    /// The current site's display name
    #[arg(long, env = "SITE_NAME", default_value = "example.com")]
    pub site_name: String,
}

impl DispatchSettings {
    /// Dispatcher configuration
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            default_from_email: self.default_from_email.clone(),
            language_code: self.language_code.clone(),
            media_root: self.media_root.clone(),
        }
    }

    /// The current site
    pub fn site(&self) -> Site {
        Site {
            id: self.site_id,
            domain: self.site_domain.clone(),
            name: self.site_name.clone(),
        }
    }

    /// Context builder seeded with the current site
    pub fn context_builder(&self) -> ContextBuilder {
        ContextBuilder::new(self.site(), self.debug && self.show_context)
    }
}
