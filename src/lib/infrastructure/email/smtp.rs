//! SMTP transport implementation

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use lettre::{
    message::{
        header::{ContentType, HeaderName, HeaderValue},
        Attachment, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::domain::mail::{
    errors::TransportError, ConnectionFactory, Credential, MailTransport, MessageBody,
    OutgoingMessage,
};

/// SMTP configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SMTPConfig {
    /// The SMTP host
    #[clap(long, env = "SMTP_HOST")]
    pub host: String,

    /// The SMTP port
    #[clap(long, env = "SMTP_PORT", default_value = "587")]
    pub port: u16,

    /// The SMTP username
    #[clap(long, env = "SMTP_USER", default_value = "")]
    pub username: String,

    /// The SMTP password
    #[clap(long, env = "SMTP_PASSWORD", default_value = "")]
    pub password: String,

    /// Verify the TLS certificate
    #[clap(long, env = "SMTP_VERIFY_TLS", default_value = "true")]
    pub verify_tls: bool,

    /// Enable STARTTLS (TLS upgrade on connection)
    #[clap(long, env = "SMTP_STARTTLS", default_value = "true")]
    pub starttls: bool,
}

/// SMTP transport
#[derive(Clone)]
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Create a transport from the default SMTP configuration
    pub fn new(config: &SMTPConfig) -> Result<Self, TransportError> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| TransportError::SendError(e.to_string()))?
                .tls(Tls::Opportunistic(
                    TlsParameters::builder(config.host.to_string())
                        .dangerous_accept_invalid_certs(!config.verify_tls)
                        .build()
                        .map_err(|e| TransportError::SendError(e.to_string()))?,
                ))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let builder = builder.port(config.port);

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
        };

        Ok(Self {
            transport: builder.build(),
        })
    }

    /// Create a transport authenticating with a stored credential
    pub fn with_credential(credential: &Credential) -> Result<Self, TransportError> {
        Self::new(&SMTPConfig {
            host: credential.host.clone(),
            port: credential.port,
            username: credential.username.clone(),
            password: credential.password.clone(),
            verify_tls: true,
            starttls: credential.use_tls,
        })
    }
}

impl std::fmt::Debug for SmtpMailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    #[mutants::skip]
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let email = build_message(message).await?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| TransportError::SendError(e.to_string()))?;

        debug!(code = %response.code(), "smtp accepted message");

        Ok(())
    }
}

/// Opens an SMTP transport per stored credential
#[derive(Clone, Copy, Debug, Default)]
pub struct SmtpConnectionFactory;

impl ConnectionFactory for SmtpConnectionFactory {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn MailTransport>, TransportError> {
        Ok(Arc::new(SmtpMailTransport::with_credential(credential)?))
    }
}

fn mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse()
        .map_err(|_| TransportError::InvalidAddress(address.to_string()))
}

async fn attachment(path: &std::path::Path) -> Result<SinglePart, TransportError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|source| TransportError::Attachment {
            path: path.display().to_string(),
            source,
        })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    let content_type = ContentType::parse("application/octet-stream")
        .map_err(|e| TransportError::Build(e.to_string()))?;

    Ok(Attachment::new(filename).body(content, content_type))
}

/// Converts an [`OutgoingMessage`] into a [`lettre::Message`], reading attachments from disk
pub async fn build_message(message: &OutgoingMessage) -> Result<Message, TransportError> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .subject(message.subject.clone());

    for address in &message.to {
        builder = builder.to(mailbox(address)?);
    }

    for address in &message.cc {
        builder = builder.cc(mailbox(address)?);
    }

    for address in &message.bcc {
        builder = builder.bcc(mailbox(address)?);
    }

    for address in &message.reply_to {
        builder = builder.reply_to(mailbox(address)?);
    }

    for (name, value) in &message.headers {
        let name = HeaderName::new_from_ascii(name.clone())
            .map_err(|_| TransportError::Build(format!("invalid header name `{}`", name)))?;
        builder = builder.raw_header(HeaderValue::new(name, value.clone()));
    }

    let built = if message.attachments.is_empty() {
        match &message.body {
            MessageBody::Plain(text) => builder.singlepart(SinglePart::plain(text.clone())),
            MessageBody::Alternative { plain, html } => builder.multipart(
                MultiPart::alternative_plain_html(plain.clone(), html.clone()),
            ),
        }
    } else {
        let mut mixed = match &message.body {
            MessageBody::Plain(text) => {
                MultiPart::mixed().singlepart(SinglePart::plain(text.clone()))
            }
            MessageBody::Alternative { plain, html } => MultiPart::mixed().multipart(
                MultiPart::alternative_plain_html(plain.clone(), html.clone()),
            ),
        };

        for path in &message.attachments {
            mixed = mixed.singlepart(attachment(path).await?);
        }

        builder.multipart(mixed)
    };

    built.map_err(|e| TransportError::Build(e.to_string()))
}
