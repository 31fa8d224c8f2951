use crate::config::FrontendConfig;
use crate::services::token::MagicToken;

/// Front-end route that consumes the token.
pub const VERIFY_PATH: &str = "/verify";

/// Composes user-facing verification URLs from a fixed front-end origin.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(config: &FrontendConfig) -> Result<Self, anyhow::Error> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            anyhow::bail!("Front-end base URL must not be empty");
        }

        Ok(Self {
            base_url: base_url.to_string(),
        })
    }

    pub fn build(&self, token: &MagicToken) -> String {
        format!(
            "{}{}?token={}",
            self.base_url,
            VERIFY_PATH,
            urlencoding::encode(token.as_str())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(base_url: &str) -> Result<LinkBuilder, anyhow::Error> {
        LinkBuilder::new(&FrontendConfig {
            base_url: base_url.to_string(),
        })
    }

    #[test]
    fn appends_verify_path_and_token() -> Result<(), anyhow::Error> {
        let link = builder("http://localhost:3000")?.build(&MagicToken::from("a.b.c".to_string()));
        assert_eq!(link, "http://localhost:3000/verify?token=a.b.c");
        Ok(())
    }

    #[test]
    fn trims_trailing_slash_from_base() -> Result<(), anyhow::Error> {
        let link = builder("https://app.example.com/")?.build(&MagicToken::from("x".to_string()));
        assert_eq!(link, "https://app.example.com/verify?token=x");
        Ok(())
    }

    #[test]
    fn escapes_token_characters() -> Result<(), anyhow::Error> {
        let link = builder("https://app.example.com")?
            .build(&MagicToken::from("a+b/c=&d".to_string()));
        assert_eq!(link, "https://app.example.com/verify?token=a%2Bb%2Fc%3D%26d");
        Ok(())
    }

    #[test]
    fn rejects_empty_base() {
        assert!(builder("").is_err());
        assert!(builder(" / ").is_err());
    }
}
