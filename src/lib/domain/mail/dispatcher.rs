//! Templated mail dispatch

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::mail::{
    addresses::AddressSpec,
    context::{Context, ContextBuilder, ContextObject},
    credentials::{Credential, CredentialCache, CredentialRepository, CredentialResolver},
    errors::{DispatchError, RenderError},
    html::{HtmlTransformer, PlainTextExtractor},
    log::{DispatchAttempt, DispatchLogger, DispatchStatus},
    message::{MessageBody, OutgoingMessage},
    recipients::{ForcedBccCache, GroupRepository, RecipientResolver, Recipients},
    renderer::TemplateRenderer,
    templates::{MailTemplate, TemplateField, TemplateRepository},
    transport::{ConnectionFactory, MailTransport},
};

/// Process-wide dispatch settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Sender used when neither the caller nor the template names one
    pub default_from_email: String,

    /// Locale used for rendering when the caller gives none
    pub language_code: String,

    /// Base directory for relative template file paths
    pub media_root: Option<PathBuf>,
}

/// Subject and body supplied by the caller instead of the template's
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawContent {
    /// Subject, used verbatim
    pub subject: String,

    /// Body, passed through the HTML transformer
    pub body: String,
}

/// A request to send one templated message
#[derive(Clone)]
pub struct SendRequest {
    slug: String,
    recipient: AddressSpec,
    context: Vec<ContextObject>,
    cc: Option<AddressSpec>,
    bcc: Option<AddressSpec>,
    user: Option<Uuid>,
    language: Option<String>,
    files: Vec<PathBuf>,
    from_email: Option<String>,
    connection: Option<Arc<dyn MailTransport>>,
    headers: Vec<(String, String)>,
    reply_to: Vec<String>,
    num: u32,
    raw: Option<RawContent>,
}

impl SendRequest {
    /// Creates a request for a template and recipient spec
    pub fn new(slug: &str, recipient: impl Into<AddressSpec>) -> Self {
        Self {
            slug: slug.to_string(),
            recipient: recipient.into(),
            context: vec![],
            cc: None,
            bcc: None,
            user: None,
            language: None,
            files: vec![],
            from_email: None,
            connection: None,
            headers: vec![],
            reply_to: vec![],
            num: 1,
            raw: None,
        }
    }

    /// The template slug
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Adds a context object, merged after the ones already added
    pub fn context(mut self, object: impl Into<ContextObject>) -> Self {
        self.context.push(object.into());
        self
    }

    /// Sets the CC addresses
    pub fn cc(mut self, cc: impl Into<AddressSpec>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    /// Sets the BCC addresses
    pub fn bcc(mut self, bcc: impl Into<AddressSpec>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }

    /// Sets the acting user
    pub fn user(mut self, user: Uuid) -> Self {
        self.user = Some(user);
        self
    }

    /// Sets the locale
    pub fn language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    /// Attaches a file after the template's own files
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Overrides the sender
    pub fn from_email(mut self, from_email: &str) -> Self {
        self.from_email = Some(from_email.to_string());
        self
    }

    /// Sends through this transport regardless of stored credentials
    pub fn connection(mut self, connection: Arc<dyn MailTransport>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Adds a message header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Adds a Reply-To address
    pub fn reply_to(mut self, address: &str) -> Self {
        self.reply_to.push(address.to_string());
        self
    }

    /// Sets the attempt number recorded in the log
    pub fn attempt(mut self, num: u32) -> Self {
        self.num = num;
        self
    }

    /// Sends the given subject and body instead of rendering the template
    pub fn raw(mut self, subject: &str, body: &str) -> Self {
        self.raw = Some(RawContent {
            subject: subject.to_string(),
            body: body.to_string(),
        });
        self
    }
}

impl fmt::Debug for SendRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendRequest")
            .field("slug", &self.slug)
            .field("recipient", &self.recipient)
            .field("cc", &self.cc)
            .field("bcc", &self.bcc)
            .field("user", &self.user)
            .field("language", &self.language)
            .field("files", &self.files)
            .field("from_email", &self.from_email)
            .field("num", &self.num)
            .finish_non_exhaustive()
    }
}

/// What happened to a successful call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The message was handed to the transport
    Sent,

    /// The template is inactive, nothing was sent
    Skipped,
}

/// The collaborators a [`Dispatcher`] coordinates
#[allow(missing_debug_implementations)]
pub struct MailServices {
    /// Template store
    pub templates: Arc<dyn TemplateRepository>,

    /// Group store
    pub groups: Arc<dyn GroupRepository>,

    /// Forced BCC cache
    pub forced_bcc: Arc<dyn ForcedBccCache>,

    /// Credential cache
    pub credential_cache: Arc<dyn CredentialCache>,

    /// Credential store
    pub credentials: Arc<dyn CredentialRepository>,

    /// Template renderer
    pub renderer: Arc<dyn TemplateRenderer>,

    /// HTML to plain text conversion
    pub text: Arc<dyn PlainTextExtractor>,

    /// HTML post-processing for raw bodies
    pub html: Arc<dyn HtmlTransformer>,

    /// Default transport
    pub transport: Arc<dyn MailTransport>,

    /// Dedicated transports for stored credentials
    pub connector: Arc<dyn ConnectionFactory>,

    /// Attempt log
    pub logger: Arc<dyn DispatchLogger>,
}

/// Resolves, renders, sends and records templated messages
pub struct Dispatcher {
    config: DispatchConfig,
    context: ContextBuilder,
    templates: Arc<dyn TemplateRepository>,
    recipients: RecipientResolver,
    credentials: CredentialResolver,
    renderer: Arc<dyn TemplateRenderer>,
    text: Arc<dyn PlainTextExtractor>,
    html: Arc<dyn HtmlTransformer>,
    transport: Arc<dyn MailTransport>,
    connector: Arc<dyn ConnectionFactory>,
    logger: Arc<dyn DispatchLogger>,
}

impl Dispatcher {
    /// Creates a new dispatcher
    pub fn new(config: DispatchConfig, context: ContextBuilder, services: MailServices) -> Self {
        Self {
            config,
            context,
            templates: services.templates,
            recipients: RecipientResolver::new(services.groups, services.forced_bcc),
            credentials: CredentialResolver::new(
                services.credential_cache,
                services.credentials,
            ),
            renderer: services.renderer,
            text: services.text,
            html: services.html,
            transport: services.transport,
            connector: services.connector,
            logger: services.logger,
        }
    }

    /// Sends a templated message and records the attempt.
    ///
    /// An unknown slug fails with [`DispatchError::TemplateNotFound`] and
    /// records nothing. Every other call records exactly one
    /// [`DispatchAttempt`]; errors are returned after the record is written.
    pub async fn send(&self, request: SendRequest) -> Result<DispatchOutcome, DispatchError> {
        let template = self.templates.get_by_slug(&request.slug).await?;

        let mut recipients = Recipients::copies(request.cc.as_ref(), request.bcc.as_ref());
        let result = self.dispatch(&template, &request, &mut recipients).await;

        let (status, error_message) = match &result {
            Ok(DispatchOutcome::Sent) => (DispatchStatus::Sent, None),
            Ok(DispatchOutcome::Skipped) => (DispatchStatus::Skipped, None),
            Err(err) => (DispatchStatus::Failed, Some(err.to_string())),
        };

        let attempt = DispatchAttempt::new(
            template.id,
            &recipients,
            status,
            request.user,
            request.num,
            error_message,
        );

        if let Err(err) = self.logger.store(&attempt).await {
            error!(slug = %template.slug, "could not store dispatch attempt: {:?}", err);
        }

        result
    }

    async fn dispatch(
        &self,
        template: &MailTemplate,
        request: &SendRequest,
        recipients: &mut Recipients,
    ) -> Result<DispatchOutcome, DispatchError> {
        *recipients = self
            .recipients
            .resolve(
                &template.slug,
                &request.recipient,
                request.cc.as_ref(),
                request.bcc.as_ref(),
            )
            .await?;

        let (subject, message) = match &request.raw {
            Some(raw) => (raw.subject.clone(), self.html.transform(&raw.body)),
            None => {
                let context = self.context.build(&request.context);
                let language = request.language.as_deref();

                (
                    self.render(template, TemplateField::Subject, &context, language)?,
                    self.render(template, TemplateField::Message, &context, language)?,
                )
            }
        };

        let from_email = self.from_email(template, request);
        let credential = self.credentials.find_credential(&from_email).await?;

        if !template.is_active {
            info!(slug = %template.slug, "template is inactive, skipping dispatch");
            return Ok(DispatchOutcome::Skipped);
        }

        if recipients.is_empty() {
            info!(slug = %template.slug, "no recipients resolved, nothing to send");
            return Ok(DispatchOutcome::Sent);
        }

        let body = if template.is_html {
            MessageBody::Alternative {
                plain: self.text.to_plain_text(&message),
                html: message,
            }
        } else {
            MessageBody::Plain(message)
        };

        let message = OutgoingMessage {
            from: from_email,
            to: recipients.to.clone(),
            cc: recipients.cc.clone().unwrap_or_default(),
            bcc: recipients.bcc.clone().unwrap_or_default(),
            reply_to: request.reply_to.clone(),
            subject,
            body,
            attachments: self.attachments(template, request),
            headers: request.headers.clone(),
        };

        let transport = self.connection(request, credential.as_ref())?;
        transport.send(&message).await?;

        info!(slug = %template.slug, to = ?message.to, "mail sent");

        Ok(DispatchOutcome::Sent)
    }

    fn render(
        &self,
        template: &MailTemplate,
        field: TemplateField,
        context: &Context,
        language: Option<&str>,
    ) -> Result<String, RenderError> {
        let source = template.localized(field, language);
        let language = language.unwrap_or(&self.config.language_code);

        debug!(slug = %template.slug, ?field, language, "rendering template field");

        self.renderer.render(source, context, language)
    }

    fn from_email(&self, template: &MailTemplate, request: &SendRequest) -> String {
        match (&request.from_email, &template.from_email) {
            (Some(from_email), _) if !from_email.is_empty() => from_email.clone(),
            (_, Some(identity)) => identity.mail_from(),
            _ => self.config.default_from_email.clone(),
        }
    }

    fn connection(
        &self,
        request: &SendRequest,
        credential: Option<&Credential>,
    ) -> Result<Arc<dyn MailTransport>, DispatchError> {
        match (&request.connection, credential) {
            (Some(connection), _) => Ok(connection.clone()),
            (None, Some(credential)) => {
                debug!(username = %credential.username, "using dedicated connection");
                Ok(self.connector.connect(credential)?)
            }
            (None, None) => Ok(self.transport.clone()),
        }
    }

    fn attachments(&self, template: &MailTemplate, request: &SendRequest) -> Vec<PathBuf> {
        template
            .files
            .iter()
            .map(|file| self.media_path(&file.path))
            .chain(request.files.iter().cloned())
            .collect()
    }

    fn media_path(&self, path: &Path) -> PathBuf {
        match &self.config.media_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
