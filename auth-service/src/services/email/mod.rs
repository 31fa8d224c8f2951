//! Outbound email delivery.
//!
//! The gateway only depends on [`EmailProvider::send`]; which transport sits
//! behind it is decided once at startup from configuration.

mod mock;
mod resend;
mod smtp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{EmailConfig, EmailProviderKind};
use crate::services::token::TOKEN_TTL_MINUTES;

pub use mock::MockEmailProvider;
pub use resend::ResendProvider;
pub use smtp::SmtpProvider;

pub const MAGIC_LINK_SUBJECT: &str = "Your Magic Link";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication error: {0}")]
    Authentication(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider_id: Option<String>,
}

impl ProviderResponse {
    pub fn success(provider_id: Option<String>) -> Self {
        Self { provider_id }
    }
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

impl EmailMessage {
    /// The login email carrying `link`.
    pub fn magic_link(to: &str, link: &str) -> Self {
        let html_body = format!(
            r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h1>Welcome to Prompt Generator!</h1>
        <p>Click the link below to log in:</p>
        <p>
            <a href="{link}" style="background-color: #000000; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                Log In
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">
            This link will expire in {ttl} minutes. If you didn't request this, please ignore this email.
        </p>
    </body>
</html>
"###,
            link = link,
            ttl = TOKEN_TTL_MINUTES
        );

        let text_body = format!(
            "Welcome to Prompt Generator!\n\n\
             Visit the following link to log in:\n\n\
             {link}\n\n\
             This link will expire in {ttl} minutes. If you didn't request this, please ignore this email.",
            link = link,
            ttl = TOKEN_TTL_MINUTES
        );

        Self {
            to: to.to_string(),
            subject: MAGIC_LINK_SUBJECT.to_string(),
            body_text: Some(text_body),
            body_html: Some(html_body),
        }
    }
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError>;
}

/// Build the provider selected by `EMAIL_PROVIDER`.
pub fn provider_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailProvider>, ProviderError> {
    let provider: Arc<dyn EmailProvider> = match config.provider {
        EmailProviderKind::Resend => Arc::new(ResendProvider::new(
            config.resend.clone(),
            config.from_email.clone(),
        )?),
        EmailProviderKind::Smtp => Arc::new(SmtpProvider::new(
            config.smtp.clone(),
            config.from_email.clone(),
        )?),
    };

    tracing::info!(provider = ?config.provider, "Email provider initialized");
    Ok(provider)
}
