//! Dotted path lookups such as `user.profile.name`

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};
use thiserror::Error;

/// An error parsing a dotted path
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The path is empty
    #[error("path is empty")]
    Empty,

    /// A segment is not an identifier
    #[error("invalid path segment `{0}`")]
    InvalidSegment(String),
}

/// A parsed `identifier ('.' identifier)*` path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DottedPath(Vec<String>);

impl DottedPath {
    /// The identifiers making up the path
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Walks the path through nested objects, returning [`None`] at the first missing key
    pub fn resolve<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;

        rest.iter()
            .try_fold(root.get(first)?, |value, segment| value.as_object()?.get(segment))
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();

    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl FromStr for DottedPath {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        raw.split('.')
            .map(|segment| {
                if is_identifier(segment) {
                    Ok(segment.to_string())
                } else {
                    Err(PathError::InvalidSegment(segment.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(DottedPath)
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}
