//! HTML helpers used when building messages

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"(?s)<!--.*?-->|<[^>]*>").unwrap();
}

/// Derives the plain text alternative of an HTML body
pub trait PlainTextExtractor: Send + Sync + 'static {
    /// Convert HTML to plain text
    fn to_plain_text(&self, html: &str) -> String;
}

/// Removes markup, keeping text content as written
#[derive(Clone, Copy, Debug, Default)]
pub struct StripTags;

impl PlainTextExtractor for StripTags {
    fn to_plain_text(&self, html: &str) -> String {
        TAG.replace_all(html, "").into_owned()
    }
}

/// Optional post-processing of HTML bodies, such as CSS inlining
pub trait HtmlTransformer: Send + Sync + 'static {
    /// Transform an HTML body, returning the input on failure
    fn transform(&self, html: &str) -> String;
}

/// Leaves HTML untouched
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl HtmlTransformer for PassThrough {
    fn transform(&self, html: &str) -> String {
        html.to_string()
    }
}
