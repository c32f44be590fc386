//! Address list parsing

use std::fmt;

/// Recipient, CC or BCC input as supplied by a caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressSpec {
    /// An already split list of addresses, used verbatim
    List(Vec<String>),

    /// Comma separated addresses (or group slugs when used as the main recipient)
    Raw(String),
}

impl AddressSpec {
    /// Whether the spec names addresses rather than group slugs
    pub fn is_literal(&self) -> bool {
        match self {
            AddressSpec::List(_) => true,
            AddressSpec::Raw(raw) => raw.contains('@'),
        }
    }

    /// Parses the spec as a literal address list
    pub fn to_list(&self) -> Vec<String> {
        match self {
            AddressSpec::List(list) => list.clone(),
            AddressSpec::Raw(raw) => split_addresses(raw),
        }
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpec::List(list) => write!(f, "{}", list.join(", ")),
            AddressSpec::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<&str> for AddressSpec {
    fn from(raw: &str) -> Self {
        AddressSpec::Raw(raw.to_string())
    }
}

impl From<String> for AddressSpec {
    fn from(raw: String) -> Self {
        AddressSpec::Raw(raw)
    }
}

impl From<Vec<String>> for AddressSpec {
    fn from(list: Vec<String>) -> Self {
        AddressSpec::List(list)
    }
}

impl From<Vec<&str>> for AddressSpec {
    fn from(list: Vec<&str>) -> Self {
        AddressSpec::List(list.into_iter().map(String::from).collect())
    }
}

/// Splits a comma separated string, trimming entries and dropping empty ones
pub fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(String::from)
        .collect()
}
