use service_core::axum::Router;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::MagicLinkConfig;
use crate::services::{EmailProvider, LinkBuilder, MagicLinkService, TokenCodec};
use crate::{build_router, AppState};

/// A bound, ready-to-serve instance of the service.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Wire the gateway from `config` and bind the listener.
    ///
    /// The email provider is injected so tests can substitute a mock.
    pub async fn build(
        config: MagicLinkConfig,
        email: Arc<dyn EmailProvider>,
    ) -> Result<Self, AppError> {
        if config.token.uses_placeholder_key() {
            tracing::warn!(
                "JWT_SECRET_KEY is unset; signing with the well-known placeholder key. \
                 Tokens are forgeable, never run this configuration in production"
            );
        }

        let codec = TokenCodec::new(&config.token);
        let links = LinkBuilder::new(&config.frontend).map_err(AppError::ConfigError)?;
        let magic_link = MagicLinkService::new(codec, links, email);

        let state = AppState {
            config: config.clone(),
            magic_link,
        };
        let router = build_router(state)?;

        let addr = config.common.bind_address();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(address = %addr, port, "Listening");

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        service_core::axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
