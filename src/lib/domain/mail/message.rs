//! Outgoing email message

use std::path::PathBuf;

/// Message body
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageBody {
    /// A single plain text part
    Plain(String),

    /// Plain text and HTML alternatives
    Alternative {
        /// The plain text part
        plain: String,

        /// The HTML part
        html: String,
    },
}

/// Email message handed to a transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// The sender of the email
    pub from: String,

    /// The recipients of the email
    pub to: Vec<String>,

    /// Carbon copy recipients
    pub cc: Vec<String>,

    /// Blind carbon copy recipients
    pub bcc: Vec<String>,

    /// Reply-To addresses
    pub reply_to: Vec<String>,

    /// The subject of the email
    pub subject: String,

    /// The body of the email
    pub body: MessageBody,

    /// Files to attach, in order
    pub attachments: Vec<PathBuf>,

    /// Extra headers
    pub headers: Vec<(String, String)>,
}
