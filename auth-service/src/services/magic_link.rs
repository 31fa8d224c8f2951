use std::sync::Arc;
use validator::ValidateEmail;

use crate::services::email::{EmailMessage, EmailProvider};
use crate::services::error::AuthError;
use crate::services::link::LinkBuilder;
use crate::services::metrics;
use crate::services::token::{Rejection, TokenCodec, Verification};

/// Orchestrates the two stateless entry points of the magic-link flow.
///
/// Nothing is stored between `login` and `verify`: the token is the only
/// artifact, and it is replayable until it expires.
#[derive(Clone)]
pub struct MagicLinkService {
    codec: TokenCodec,
    links: LinkBuilder,
    email: Arc<dyn EmailProvider>,
}

impl MagicLinkService {
    pub fn new(codec: TokenCodec, links: LinkBuilder, email: Arc<dyn EmailProvider>) -> Self {
        Self {
            codec,
            links,
            email,
        }
    }

    /// Issue a token for `email` and mail it as a verification link.
    ///
    /// Neither the token nor the link is returned; they only reach the user
    /// through the email.
    #[tracing::instrument(name = "magic_link.login", skip(self))]
    pub async fn login(&self, email: &str) -> Result<(), AuthError> {
        if !email.validate_email() {
            tracing::warn!("Rejected login with malformed email address");
            metrics::record_magic_link_sent("invalid_input");
            return Err(AuthError::InvalidInput);
        }

        let token = self.codec.issue(email)?;
        let link = self.links.build(&token);
        let message = EmailMessage::magic_link(email, &link);

        match self.email.send(&message).await {
            Ok(response) => {
                tracing::info!(
                    provider_id = ?response.provider_id,
                    "Magic link dispatched"
                );
                metrics::record_magic_link_sent("sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to dispatch magic link");
                metrics::record_magic_link_sent("delivery_failed");
                Err(AuthError::DeliveryFailed(e))
            }
        }
    }

    /// Check a presented token and return the email it was issued for.
    #[tracing::instrument(name = "magic_link.verify", skip_all)]
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let verification = self.codec.decode(token).map_err(|e| {
            metrics::record_verification("error");
            AuthError::Internal(e)
        })?;

        match verification {
            Verification::Valid(email) => {
                tracing::info!(email = %email, "Magic link verified");
                metrics::record_verification("valid");
                Ok(email)
            }
            Verification::Rejected(Rejection::Expired) => {
                tracing::info!("Rejected expired magic link token");
                metrics::record_verification("expired");
                Err(AuthError::TokenExpired)
            }
            Verification::Rejected(Rejection::Invalid) => {
                tracing::warn!("Rejected invalid magic link token");
                metrics::record_verification("invalid");
                Err(AuthError::TokenInvalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrontendConfig;
    use crate::services::email::MockEmailProvider;
    use chrono::{Duration, Utc};

    struct Harness {
        service: MagicLinkService,
        outbox: Arc<MockEmailProvider>,
    }

    fn harness_with(secret: &[u8], outbox: Arc<MockEmailProvider>) -> Harness {
        let links = LinkBuilder::new(&FrontendConfig {
            base_url: "http://localhost:3000".to_string(),
        })
        .expect("valid base url");
        let service = MagicLinkService::new(
            TokenCodec::from_secret(secret),
            links,
            outbox.clone() as Arc<dyn EmailProvider>,
        );
        Harness { service, outbox }
    }

    fn harness() -> Harness {
        harness_with(b"test-secret", Arc::new(MockEmailProvider::new()))
    }

    fn token_from_link(link_holder: &str) -> String {
        let start = link_holder
            .find("/verify?token=")
            .expect("link present in email")
            + "/verify?token=".len();
        link_holder[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            .collect()
    }

    #[tokio::test]
    async fn login_dispatches_link_that_verifies_to_same_email() {
        let h = harness();

        h.service
            .login("alice@example.com")
            .await
            .expect("login succeeds");

        let sent = h.outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");

        let text = sent[0].body_text.clone().unwrap_or_default();
        assert!(text.contains("http://localhost:3000/verify?token="));

        let token = token_from_link(&text);
        assert_eq!(
            h.service.verify(&token).expect("token verifies"),
            "alice@example.com"
        );
    }

    #[tokio::test]
    async fn login_with_malformed_email_never_reaches_dispatcher() {
        let h = harness();

        for bad in ["not-an-email", "", "alice@", "@example.com", "a b@example.com"] {
            let result = h.service.login(bad).await;
            assert!(
                matches!(result, Err(AuthError::InvalidInput)),
                "expected InvalidInput for {:?}",
                bad
            );
        }
        assert_eq!(h.outbox.send_count(), 0);
    }

    #[tokio::test]
    async fn login_surfaces_delivery_failure() {
        let h = harness_with(b"test-secret", Arc::new(MockEmailProvider::failing()));

        let result = h.service.login("bob@example.com").await;
        assert!(matches!(result, Err(AuthError::DeliveryFailed(_))));
        assert_eq!(h.outbox.send_count(), 0);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let h = harness();
        let codec = TokenCodec::from_secret(b"test-secret");
        let token = codec
            .issue_at("carol@example.com", Utc::now() - Duration::minutes(6))
            .expect("token issued");

        assert!(matches!(
            h.service.verify(token.as_str()),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let h = harness();
        assert!(matches!(
            h.service.verify("definitely.not.valid"),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn token_is_invalid_after_key_rotation() {
        let outbox = Arc::new(MockEmailProvider::new());
        let before = harness_with(b"original-secret", outbox.clone());
        before
            .service
            .login("dave@example.com")
            .await
            .expect("login succeeds");

        let text = outbox.sent()[0].body_text.clone().unwrap_or_default();
        let token = token_from_link(&text);

        let after = harness_with(b"rotated-secret", Arc::new(MockEmailProvider::new()));
        assert!(matches!(
            after.service.verify(&token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn token_can_be_verified_repeatedly_until_expiry() {
        let h = harness();
        h.service
            .login("erin@example.com")
            .await
            .expect("login succeeds");
        let token = token_from_link(&h.outbox.sent()[0].body_text.clone().unwrap_or_default());

        assert_eq!(h.service.verify(&token).ok().as_deref(), Some("erin@example.com"));
        assert_eq!(h.service.verify(&token).ok().as_deref(), Some("erin@example.com"));
    }
}
