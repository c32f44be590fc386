//! Mail transport capability

use std::sync::Arc;

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

use crate::domain::mail::{credentials::Credential, errors::TransportError, message::OutgoingMessage};

/// Sends messages
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    /// Send a message
    ///
    /// # Arguments
    /// * `message` - The [`OutgoingMessage`] to send.
    ///
    /// # Returns
    /// A [`Result`] indicating success or failure.
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

#[cfg(test)]
mock! {
    pub MailTransport {}

    #[async_trait]
    impl MailTransport for MailTransport {
        async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
    }
}

/// Opens dedicated transports for stored sender credentials
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Build a transport that authenticates with `credential`
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn MailTransport>, TransportError>;
}

#[cfg(test)]
mock! {
    pub ConnectionFactory {}

    impl ConnectionFactory for ConnectionFactory {
        fn connect(&self, credential: &Credential) -> Result<Arc<dyn MailTransport>, TransportError>;
    }
}
