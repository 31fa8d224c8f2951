use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Well-known fallback signing key. Anything signed with it is forgeable.
pub const PLACEHOLDER_SECRET_KEY: &str = "your-secret-key";

#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub token: TokenConfig,
    pub frontend: FrontendConfig,
    pub email: EmailConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret_key: Secret<String>,
}

impl TokenConfig {
    pub fn uses_placeholder_key(&self) -> bool {
        self.secret_key.expose_secret() == PLACEHOLDER_SECRET_KEY
    }
}

#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmailProviderKind {
    Resend,
    Smtp,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider: EmailProviderKind,
    pub from_email: String,
    pub resend: ResendConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: Secret<String>,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl MagicLinkConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let provider: EmailProviderKind = get_env("EMAIL_PROVIDER", Some("resend"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // Credentials are only mandatory for the provider actually in use.
        let uses_resend = provider == EmailProviderKind::Resend;
        let uses_smtp = provider == EmailProviderKind::Smtp;

        let config = MagicLinkConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("magic-link-auth"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            token: TokenConfig {
                secret_key: Secret::new(get_env(
                    "JWT_SECRET_KEY",
                    Some(PLACEHOLDER_SECRET_KEY),
                    is_prod,
                )?),
            },
            frontend: FrontendConfig {
                base_url: get_env("FRONTEND_URL", Some("http://localhost:3000"), is_prod)?,
            },
            email: EmailConfig {
                provider,
                from_email: get_env("EMAIL_FROM", Some("onboarding@resend.dev"), is_prod)?,
                resend: ResendConfig {
                    api_key: Secret::new(get_env(
                        "RESEND_API_KEY",
                        if uses_resend { None } else { Some("") },
                        is_prod && uses_resend,
                    )?),
                    api_url: get_env(
                        "RESEND_API_URL",
                        Some("https://api.resend.com"),
                        is_prod && uses_resend,
                    )?,
                },
                smtp: SmtpConfig {
                    host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod && uses_smtp)?,
                    port: get_env("SMTP_PORT", Some("587"), is_prod && uses_smtp)?
                        .parse()
                        .map_err(|e: std::num::ParseIntError| {
                            AppError::ConfigError(anyhow::anyhow!("SMTP_PORT: {}", e))
                        })?,
                    user: get_env(
                        "SMTP_USER",
                        if uses_smtp { None } else { Some("") },
                        is_prod && uses_smtp,
                    )?,
                    password: Secret::new(get_env(
                        "SMTP_PASSWORD",
                        if uses_smtp { None } else { Some("") },
                        is_prod && uses_smtp,
                    )?),
                },
            },
            security: SecurityConfig {
                allowed_origins: parse_origins(&get_env("ALLOWED_ORIGINS", Some("*"), is_prod)?),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 && self.environment == Environment::Prod {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.frontend.base_url.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "FRONTEND_URL must not be empty"
            )));
        }

        if self.token.secret_key.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET_KEY must not be empty"
            )));
        }

        if self.environment == Environment::Prod {
            if self.token.uses_placeholder_key() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET_KEY is set to the well-known placeholder; refusing to start in production"
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for EmailProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resend" => Ok(EmailProviderKind::Resend),
            "smtp" => Ok(EmailProviderKind::Smtp),
            _ => Err(format!("Invalid email provider: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MagicLinkConfig {
        MagicLinkConfig {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "magic-link-auth".to_string(),
            service_version: "test".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            token: TokenConfig {
                secret_key: Secret::new("test-secret".to_string()),
            },
            frontend: FrontendConfig {
                base_url: "http://localhost:3000".to_string(),
            },
            email: EmailConfig {
                provider: EmailProviderKind::Resend,
                from_email: "onboarding@resend.dev".to_string(),
                resend: ResendConfig {
                    api_key: Secret::new("re_test".to_string()),
                    api_url: "https://api.resend.com".to_string(),
                },
                smtp: SmtpConfig {
                    host: "smtp.example.com".to_string(),
                    port: 587,
                    user: String::new(),
                    password: Secret::new(String::new()),
                },
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }

    #[test]
    fn parses_environment_case_insensitively() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Dev));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn parses_email_provider() {
        assert_eq!(
            "Resend".parse::<EmailProviderKind>(),
            Ok(EmailProviderKind::Resend)
        );
        assert_eq!("smtp".parse::<EmailProviderKind>(), Ok(EmailProviderKind::Smtp));
        assert!("pigeon".parse::<EmailProviderKind>().is_err());
    }

    #[test]
    fn splits_and_trims_origins() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test ,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn dev_config_with_placeholder_key_is_allowed() {
        let mut config = test_config();
        config.token.secret_key = Secret::new(PLACEHOLDER_SECRET_KEY.to_string());
        assert!(config.token.uses_placeholder_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn prod_config_rejects_placeholder_key() {
        let mut config = test_config();
        config.environment = Environment::Prod;
        config.security.allowed_origins = vec!["https://app.example.com".to_string()];
        config.token.secret_key = Secret::new(PLACEHOLDER_SECRET_KEY.to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn prod_config_rejects_wildcard_origin() {
        let mut config = test_config();
        config.environment = Environment::Prod;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_frontend_url_is_rejected() {
        let mut config = test_config();
        config.frontend.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
