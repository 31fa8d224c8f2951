use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory provider for tests. Records every message it accepts.
pub struct MockEmailProvider {
    fail: bool,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every send fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }
}

impl Default for MockEmailProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        if self.fail {
            return Err(ProviderError::Connection(
                "Mock email provider is configured to fail".to_string(),
            ));
        }

        let mut sent = self
            .sent
            .lock()
            .map_err(|e| ProviderError::SendFailed(format!("Mock outbox poisoned: {}", e)))?;
        sent.push(email.clone());

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "[MOCK] Email would be sent"
        );

        Ok(ProviderResponse::success(Some(format!(
            "mock-email-{}",
            sent.len()
        ))))
    }
}
