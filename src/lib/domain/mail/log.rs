//! Dispatch attempt audit records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use crate::domain::mail::{errors::LogError, recipients::Recipients};

/// Outcome of a dispatch attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Handed to the transport
    Sent,

    /// Failed while resolving, rendering or sending
    Failed,

    /// The template is inactive, nothing was sent
    Skipped,
}

impl DispatchStatus {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Sent => "sent",
            DispatchStatus::Failed => "failed",
            DispatchStatus::Skipped => "skipped",
        }
    }
}

/// One record per call to the dispatcher
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchAttempt {
    /// Record ID
    pub id: Uuid,

    /// The template used
    pub template_id: Uuid,

    /// Main recipients
    pub to: Vec<String>,

    /// Carbon copy recipients
    pub cc: Vec<String>,

    /// Blind carbon copy recipients
    pub bcc: Vec<String>,

    /// Outcome
    pub status: DispatchStatus,

    /// Acting user
    pub user_id: Option<Uuid>,

    /// Caller supplied attempt number
    pub num: u32,

    /// Error text, present only on failure
    pub error_message: Option<String>,

    /// When the attempt finished
    pub created_at: DateTime<Utc>,
}

impl DispatchAttempt {
    /// Creates a record for the given recipients and outcome
    pub fn new(
        template_id: Uuid,
        recipients: &Recipients,
        status: DispatchStatus,
        user_id: Option<Uuid>,
        num: u32,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            template_id,
            to: recipients.to.clone(),
            cc: recipients.cc.clone().unwrap_or_default(),
            bcc: recipients.bcc.clone().unwrap_or_default(),
            status,
            user_id,
            num,
            error_message,
            created_at: Utc::now(),
        }
    }

    /// Whether the message was handed to the transport
    pub fn is_sent(&self) -> bool {
        self.status == DispatchStatus::Sent
    }
}

/// Append-only store of dispatch attempts
#[async_trait]
pub trait DispatchLogger: Send + Sync + 'static {
    /// Persist an attempt
    async fn store(&self, attempt: &DispatchAttempt) -> Result<(), LogError>;
}

#[cfg(test)]
mock! {
    pub DispatchLogger {}

    #[async_trait]
    impl DispatchLogger for DispatchLogger {
        async fn store(&self, attempt: &DispatchAttempt) -> Result<(), LogError>;
    }
}
