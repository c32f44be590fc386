//! Templated mail dispatch.
//!
//! A [`Dispatcher`] fetches a [`MailTemplate`] by slug, resolves recipients
//! (expanding groups), renders the subject and body for a locale, picks a
//! transport from the sender's stored credentials, sends the message and
//! records one [`DispatchAttempt`] per call.

mod addresses;
mod context;
mod credentials;
mod dispatcher;
mod html;
mod log;
mod message;
mod recipients;
mod renderer;
mod templates;
mod transport;

pub mod errors;

pub use addresses::{split_addresses, AddressSpec};
pub use context::{
    flatten, to_value, Context, ContextBuilder, ContextObject, DottedPath, Entity, Field,
    FieldValue, PathError, Site,
};
pub use credentials::{
    username_candidates, Credential, CredentialCache, CredentialRepository, CredentialResolver,
};
pub use dispatcher::{
    DispatchConfig, DispatchOutcome, Dispatcher, MailServices, RawContent, SendRequest,
};
pub use html::{HtmlTransformer, PassThrough, PlainTextExtractor, StripTags};
pub use log::{DispatchAttempt, DispatchLogger, DispatchStatus};
pub use message::{MessageBody, OutgoingMessage};
pub use recipients::{ForcedBccCache, GroupRepository, RecipientResolver, Recipients};
pub use renderer::TemplateRenderer;
pub use templates::{
    MailFile, MailFromEmail, MailTemplate, TemplateField, TemplateRepository, Translation,
};
pub use transport::{ConnectionFactory, MailTransport};
