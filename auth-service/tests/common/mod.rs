//! Test helpers for magic-link-auth integration tests.
//!
//! Spawns the real router on a random local port with an in-memory email
//! provider, so the full HTTP surface can be exercised with `reqwest`.

#![allow(dead_code)]

use magic_link_auth::{
    config::{
        EmailConfig, EmailProviderKind, Environment, FrontendConfig, MagicLinkConfig,
        ResendConfig, SecurityConfig, SmtpConfig, TokenConfig,
    },
    services::{EmailProvider, MockEmailProvider, TokenCodec},
    startup::Application,
};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_FRONTEND_URL: &str = "http://localhost:3000";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub outbox: Arc<MockEmailProvider>,
    client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(MockEmailProvider::new())).await
    }

    /// Spawn with a provider that fails every send.
    pub async fn spawn_failing() -> Self {
        Self::spawn_with(Arc::new(MockEmailProvider::failing())).await
    }

    pub async fn spawn_with(outbox: Arc<MockEmailProvider>) -> Self {
        let config = test_config();
        let email = outbox.clone() as Arc<dyn EmailProvider>;

        let app = Application::build(config, email)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            outbox,
            client,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn post_login(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/auth/login", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_verify(&self, token: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/auth/verify", self.address))
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Token carried by the most recent email in the outbox.
    pub fn last_token(&self) -> Option<String> {
        let message = self.outbox.sent().pop()?;
        let body = message.body_text?;
        extract_token(&body)
    }
}

pub fn test_config() -> MagicLinkConfig {
    MagicLinkConfig {
        common: CoreConfig {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
        },
        environment: Environment::Dev,
        service_name: "magic-link-auth-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        token: TokenConfig {
            secret_key: Secret::new(TEST_SECRET.to_string()),
        },
        frontend: FrontendConfig {
            base_url: TEST_FRONTEND_URL.to_string(),
        },
        email: EmailConfig {
            provider: EmailProviderKind::Resend,
            from_email: "onboarding@resend.dev".to_string(),
            resend: ResendConfig {
                api_key: Secret::new("re_test".to_string()),
                api_url: "http://127.0.0.1:9".to_string(),
            },
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 2525,
                user: String::new(),
                password: Secret::new(String::new()),
            },
        },
        security: SecurityConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

/// Codec sharing the test app's signing key.
pub fn test_codec() -> TokenCodec {
    TokenCodec::from_secret(TEST_SECRET.as_bytes())
}

pub fn extract_token(body: &str) -> Option<String> {
    let marker = format!("{}/verify?token=", TEST_FRONTEND_URL);
    let start = body.find(&marker)? + marker.len();
    let token: String = body[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    (!token.is_empty()).then_some(token)
}
