//! Handlebars template rendering

use handlebars::Handlebars;
use serde_json::Value;

use crate::domain::mail::{errors::RenderError, Context, TemplateRenderer};

/// Key under which the active locale is exposed to templates
pub const LANGUAGE_KEY: &str = "LANGUAGE_CODE";

/// Renders templates with [`handlebars`]
#[derive(Clone, Debug)]
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Creates a renderer with the default registry
    pub fn new() -> Self {
        Self {
            registry: Handlebars::new(),
        }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(
        &self,
        source: &str,
        context: &Context,
        language: &str,
    ) -> Result<String, RenderError> {
        let mut data = context.as_map().clone();
        data.insert(LANGUAGE_KEY.to_string(), Value::String(language.to_string()));

        self.registry
            .render_template(source, &data)
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}
