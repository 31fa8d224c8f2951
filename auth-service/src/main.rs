use magic_link_auth::{config::MagicLinkConfig, services, startup::Application};
use service_core::error::AppError;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = MagicLinkConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    services::metrics::init_metrics()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting magic link auth service"
    );

    let email = services::email::provider_from_config(&config.email)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

    let app = Application::build(config, email).await?;
    app.run_until_stopped().await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
