#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Sends a stored mail template from the command line

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::Parser;
use db_mailer::{
    domain::mail::{
        ConnectionFactory, DispatchOutcome, Dispatcher, HtmlTransformer, MailServices,
        MailTransport, PassThrough, SendRequest, StripTags,
    },
    infrastructure::{
        cache::redis::{RedisCache, RedisConfig},
        db::postgres::{DatabaseConnectionDetails, PostgresDatabase},
        email::{
            debug::LogTransport,
            smtp::{SMTPConfig, SmtpConnectionFactory, SmtpMailTransport},
        },
        html::css_inline::CssInliner,
        render::handlebars::HandlebarsRenderer,
        settings::DispatchSettings,
    },
};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// Template slug
    pub slug: String,

    /// Recipient addresses (comma separated) or a group slug
    pub recipient: String,

    /// Carbon copy addresses (comma separated)
    #[arg(long)]
    pub cc: Option<String>,

    /// Blind carbon copy addresses (comma separated)
    #[arg(long)]
    pub bcc: Option<String>,

    /// Locale to render for
    #[arg(long)]
    pub language: Option<String>,

    /// Extra context as a JSON object, may be repeated
    #[arg(long = "context")]
    pub contexts: Vec<String>,

    /// File to attach, may be repeated
    #[arg(long = "file")]
    pub files: Vec<PathBuf>,

    /// Sender override
    #[arg(long)]
    pub from_email: Option<String>,

    /// User the message is sent on behalf of
    #[arg(long)]
    pub user: Option<Uuid>,

    /// Attempt number recorded in the log
    #[arg(long, default_value = "1")]
    pub attempt: u32,

    /// Inline CSS in raw HTML bodies
    #[arg(long)]
    pub inline_css: bool,

    /// Log messages instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// The database connection details
    #[clap(flatten)]
    pub db: DatabaseConnectionDetails,

    /// The SMTP configuration
    #[clap(flatten)]
    pub smtp: SMTPConfig,

    /// The Redis connection details
    #[clap(flatten)]
    pub redis: RedisConfig,

    /// Dispatch settings
    #[clap(flatten)]
    pub settings: DispatchSettings,
}

fn parse_context(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("context must be a JSON object: {}", raw)),
    }
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Failed to load environment: {}", e);
    }

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let postgres = Arc::new(PostgresDatabase::new(&args.db.connection_string).await?);
    let redis = Arc::new(RedisCache::new(&args.redis).await?);

    let (transport, connector): (Arc<dyn MailTransport>, Arc<dyn ConnectionFactory>) =
        if args.dry_run {
            (Arc::new(LogTransport), Arc::new(LogTransport))
        } else {
            (
                Arc::new(SmtpMailTransport::new(&args.smtp)?),
                Arc::new(SmtpConnectionFactory),
            )
        };

    let html: Arc<dyn HtmlTransformer> = if args.inline_css {
        Arc::new(CssInliner)
    } else {
        Arc::new(PassThrough)
    };

    let dispatcher = Dispatcher::new(
        args.settings.dispatch_config(),
        args.settings.context_builder(),
        MailServices {
            templates: postgres.clone(),
            groups: postgres.clone(),
            forced_bcc: redis.clone(),
            credential_cache: redis,
            credentials: postgres.clone(),
            renderer: Arc::new(HandlebarsRenderer::new()),
            text: Arc::new(StripTags),
            html,
            transport,
            connector,
            logger: postgres,
        },
    );

    let mut request = SendRequest::new(&args.slug, args.recipient.as_str()).attempt(args.attempt);

    for raw in &args.contexts {
        request = request.context(parse_context(raw)?);
    }

    for file in args.files {
        request = request.file(file);
    }

    if let Some(cc) = &args.cc {
        request = request.cc(cc.as_str());
    }

    if let Some(bcc) = &args.bcc {
        request = request.bcc(bcc.as_str());
    }

    if let Some(language) = &args.language {
        request = request.language(language);
    }

    if let Some(from_email) = &args.from_email {
        request = request.from_email(from_email);
    }

    if let Some(user) = args.user {
        request = request.user(user);
    }

    match dispatcher.send(request).await? {
        DispatchOutcome::Sent => info!("sent `{}` to {}", args.slug, args.recipient),
        DispatchOutcome::Skipped => info!("template `{}` is inactive, nothing sent", args.slug),
    }

    Ok(())
}
