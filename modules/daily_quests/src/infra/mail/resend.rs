//! [Resend](https://resend.com) HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::domain::ports::{EmailTransport, OutboundEmail, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    name: Option<String>,
}

pub struct ResendTransport {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ResendTransport {
    /// A missing or empty key builds a transport that refuses to send.
    pub fn new(base_url: Url, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn endpoint(&self) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::NotConfigured("invalid Resend base URL".into()))?
            .pop_if_empty()
            .push("emails");
        Ok(url)
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    #[instrument(
        name = "daily_quests.http.resend.send",
        skip_all,
        fields(base = %self.base_url, to = %email.to)
    )]
    async fn send(&self, email: &OutboundEmail) -> Result<String, TransportError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TransportError::NotConfigured("Resend API key is missing".into()))?;

        let body = SendEmailRequest {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.text,
            html: email.html.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint()?)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Rejected(format!("POST /emails: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message.or(e.name))
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(TransportError::Rejected(detail));
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Rejected(format!("unexpected Resend response: {e}")))?;
        debug!(message_id = %sent.id, "Resend accepted message");
        Ok(sent.id)
    }
}
