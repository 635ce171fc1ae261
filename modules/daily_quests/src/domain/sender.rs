use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::notification::EmailContent;
use crate::domain::ports::{EmailTransport, OutboundEmail, TransportError};

/// Sends composed notifications through the configured transport.
pub struct NotificationSender {
    transport: Arc<dyn EmailTransport>,
    from: String,
}

impl NotificationSender {
    pub fn new(transport: Arc<dyn EmailTransport>, from: impl Into<String>) -> Self {
        Self {
            transport,
            from: from.into(),
        }
    }

    /// Returns the provider message id.
    #[instrument(name = "daily_quests.sender.send", skip(self, content), fields(to = %to))]
    pub async fn send(&self, to: &str, content: &EmailContent) -> Result<String, DomainError> {
        let to = to.trim();
        if to.is_empty() || !to.contains('@') {
            return Err(DomainError::invalid_recipient(to));
        }

        let email = OutboundEmail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: content.subject.clone(),
            text: content.text.clone(),
            html: Some(content.html.clone()),
        };

        let id = self.transport.send(&email).await.map_err(|e| match e {
            TransportError::NotConfigured(msg) => DomainError::configuration(msg),
            TransportError::Rejected(msg) => DomainError::delivery(msg),
        })?;
        debug!(message_id = %id, "Email accepted by provider");
        Ok(id)
    }
}
