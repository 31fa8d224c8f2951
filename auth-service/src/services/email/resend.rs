use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse};
use crate::config::ResendConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delivers email through the Resend HTTP API.
pub struct ResendProvider {
    client: reqwest::Client,
    config: ResendConfig,
    from_email: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

impl ResendProvider {
    pub fn new(config: ResendConfig, from_email: String) -> Result<Self, ProviderError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::Configuration(
                "RESEND_API_KEY is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            from_email,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        if email.body_html.is_none() && email.body_text.is_none() {
            return Err(ProviderError::SendFailed(
                "Email must have either text or HTML body".to_string(),
            ));
        }

        let request = SendEmailRequest {
            from: &self.from_email,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: email.body_html.as_deref(),
            text: email.body_text.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(format!("Resend request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::Authentication(format!("Resend rejected API key: {}", body))
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(body),
                StatusCode::UNPROCESSABLE_ENTITY => ProviderError::InvalidRecipient(body),
                _ => ProviderError::SendFailed(format!("Resend returned {}: {}", status, body)),
            });
        }

        let provider_id = response
            .json::<SendEmailResponse>()
            .await
            .ok()
            .and_then(|r| r.id);

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            provider_id = ?provider_id,
            "Email sent successfully"
        );

        Ok(ProviderResponse::success(provider_id))
    }
}
