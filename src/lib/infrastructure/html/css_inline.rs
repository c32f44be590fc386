//! CSS inlining for HTML bodies

use tracing::warn;

use crate::domain::mail::HtmlTransformer;

/// Moves `<style>` rules into `style` attributes
#[derive(Clone, Copy, Debug, Default)]
pub struct CssInliner;

impl HtmlTransformer for CssInliner {
    fn transform(&self, html: &str) -> String {
        match css_inline::inline(html) {
            Ok(inlined) => inlined,
            Err(e) => {
                warn!("could not inline css, sending body as is: {}", e);
                html.to_string()
            }
        }
    }
}
