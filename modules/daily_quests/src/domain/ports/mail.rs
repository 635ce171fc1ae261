use async_trait::async_trait;
use thiserror::Error;

/// A fully composed message ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// Credentials or endpoint missing; nothing can be sent.
    #[error("email transport not configured: {0}")]
    NotConfigured(String),

    /// The provider refused the message or could not be reached.
    #[error("{0}")]
    Rejected(String),
}

/// Transport-agnostic outbound mail port.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Returns the provider's message id.
    async fn send(&self, email: &OutboundEmail) -> Result<String, TransportError>;
}
