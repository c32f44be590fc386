//! Template rendering capability

#[cfg(test)]
use mockall::mock;

use crate::domain::mail::{context::Context, errors::RenderError};

/// Renders template source against a context.
///
/// The locale is passed to every call; implementations must not keep it
/// as shared state between calls.
pub trait TemplateRenderer: Send + Sync + 'static {
    /// Render `source` for `language`
    fn render(&self, source: &str, context: &Context, language: &str)
        -> Result<String, RenderError>;
}

#[cfg(test)]
mock! {
    pub TemplateRenderer {}

    impl TemplateRenderer for TemplateRenderer {
        fn render(&self, source: &str, context: &Context, language: &str) -> Result<String, RenderError>;
    }
}
