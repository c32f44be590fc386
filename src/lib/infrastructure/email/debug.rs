//! Transport that logs messages instead of sending them

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::mail::{
    errors::TransportError, ConnectionFactory, Credential, MailTransport, MessageBody,
    OutgoingMessage,
};

/// Logs every message, sends nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let html = matches!(message.body, MessageBody::Alternative { .. });

        info!(
            from = %message.from,
            to = %message.to.join(", "),
            cc = %message.cc.join(", "),
            bcc = %message.bcc.join(", "),
            subject = %message.subject,
            html,
            attachments = message.attachments.len(),
            "not sending message, logged only"
        );

        Ok(())
    }
}

impl ConnectionFactory for LogTransport {
    fn connect(&self, _credential: &Credential) -> Result<Arc<dyn MailTransport>, TransportError> {
        Ok(Arc::new(LogTransport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_transport_never_fails() {
        let message = OutgoingMessage {
            from: "support@example.com".to_string(),
            to: vec!["ann@example.com".to_string()],
            cc: vec![],
            bcc: vec![],
            reply_to: vec![],
            subject: "Hello".to_string(),
            body: MessageBody::Plain("Hi".to_string()),
            attachments: vec![],
            headers: vec![],
        };

        assert!(LogTransport.send(&message).await.is_ok());
    }
}
