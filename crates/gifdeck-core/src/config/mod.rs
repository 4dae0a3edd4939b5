//! Backend endpoint configuration for gifdeck clients.
//!
//! All API routes are derived from a single base URL, resolved from an
//! explicit value or the `GIFDECK_API_URL` environment variable.

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

/// Environment variable consulted by [`BackendConfig::from_env`].
pub const API_URL_ENV: &str = "GIFDECK_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API base URL must not be empty")]
    EmptyBaseUrl,
    #[error("API base URL must include http:// or https://")]
    InvalidScheme,
    #[error("GIFDECK_API_URL is not set")]
    MissingEnv,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Resolved backend endpoints for one gifdeck deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    base_url: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> ConfigResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(&base_url.into())?,
        })
    }

    /// Resolve the base URL from `GIFDECK_API_URL`.
    pub fn from_env() -> ConfigResult<Self> {
        let raw = normalize_text_option(std::env::var(API_URL_ENV).ok())
            .ok_or(ConfigError::MissingEnv)?;
        Self::new(raw)
    }

    /// Returns the base URL this config was built with (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_url(&self) -> String {
        format!("{}/backend/auth/jwt/create", self.base_url)
    }

    pub fn refresh_url(&self) -> String {
        format!("{}/backend/auth/jwt/refresh/", self.base_url)
    }

    pub fn register_url(&self) -> String {
        format!("{}/backend/auth/users/", self.base_url)
    }

    pub fn gifs_url(&self) -> String {
        format!("{}/backend/api/v1/gifs/", self.base_url)
    }

    pub fn gif_url(&self, id: u64) -> String {
        format!("{}/backend/api/v1/gifs/{id}/", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> ConfigResult<String> {
    let base = raw.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !is_http_url(base) {
        return Err(ConfigError::InvalidScheme);
    }
    Ok(base.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(matches!(
            BackendConfig::new(""),
            Err(ConfigError::EmptyBaseUrl)
        ));
        assert!(matches!(
            BackendConfig::new("example.com"),
            Err(ConfigError::InvalidScheme)
        ));
    }

    #[test]
    fn normalize_base_url_trims_trailing_slash() {
        let config = BackendConfig::new("https://gifs.example.com/").unwrap();
        assert_eq!(config.base_url(), "https://gifs.example.com");
    }

    #[test]
    fn endpoint_urls_follow_backend_routes() {
        let config = BackendConfig::new("http://localhost:8000").unwrap();
        assert_eq!(
            config.login_url(),
            "http://localhost:8000/backend/auth/jwt/create"
        );
        assert_eq!(
            config.refresh_url(),
            "http://localhost:8000/backend/auth/jwt/refresh/"
        );
        assert_eq!(
            config.register_url(),
            "http://localhost:8000/backend/auth/users/"
        );
        assert_eq!(
            config.gifs_url(),
            "http://localhost:8000/backend/api/v1/gifs/"
        );
        assert_eq!(
            config.gif_url(7),
            "http://localhost:8000/backend/api/v1/gifs/7/"
        );
    }
}
