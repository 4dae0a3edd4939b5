//! JWT credential client for the gifdeck backend.
//!
//! Covers token creation (login), account registration, and access-token
//! refresh against the `/backend/auth/` routes.

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendConfig;
use crate::util::compact_text;

/// Access/refresh token pair for an authenticated account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthSession {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Per-field validation messages returned by the credential routes.
///
/// Empty strings mean "no error for this field"; missing fields in the
/// response body default to empty so stale errors are cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CredentialErrors {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub non_field_errors: String,
}

impl CredentialErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty() && self.non_field_errors.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Credentials rejected by the server")]
    Rejected(CredentialErrors),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Outcome of the register-then-login chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Registration and the follow-up login both succeeded.
    SignedIn(AuthSession),
    /// Registration succeeded but the follow-up login did not; the account
    /// exists and the user must log in manually.
    Registered,
}

/// Durable storage for the current session's token pair.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Credential routes consumed by the form controller.
#[async_trait]
pub trait CredentialApi: Send + Sync {
    /// Exchange username/password for a token pair.
    async fn login(&self, username: &str, password: &str) -> AuthResult<AuthSession>;

    /// Create an account. Field errors surface as [`AuthError::Rejected`].
    async fn register(
        &self,
        username: &str,
        password: &str,
        password_confirm: &str,
    ) -> AuthResult<()>;

    /// Exchange a refresh token for a fresh access token.
    async fn refresh(&self, refresh_token: &str) -> AuthResult<String>;
}

/// HTTP implementation of [`CredentialApi`] against the gifdeck backend.
#[derive(Debug, Clone)]
pub struct JwtAuthClient {
    config: BackendConfig,
    client: reqwest::Client,
}

impl JwtAuthClient {
    pub fn new(config: BackendConfig) -> AuthResult<Self> {
        Ok(Self {
            config,
            client: reqwest::Client::builder().build()?,
        })
    }
}

#[async_trait]
impl CredentialApi for JwtAuthClient {
    async fn login(&self, username: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(username, password)?;

        let payload = serde_json::json!({
            "username": username,
            "password": password,
        });
        let response = self
            .client
            .post(self.config.login_url())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection_from_response(response).await);
        }

        let tokens = response.json::<TokenPairResponse>().await?;
        Ok(AuthSession::new(tokens.access, tokens.refresh))
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        password_confirm: &str,
    ) -> AuthResult<()> {
        validate_credentials(username, password)?;

        let payload = serde_json::json!({
            "username": username,
            "password": password,
            "re_password": password_confirm,
        });
        let response = self
            .client
            .post(self.config.register_url())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection_from_response(response).await);
        }
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<String> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "refresh token must not be empty",
            ));
        }

        let payload = serde_json::json!({ "refresh": refresh_token });
        let response = self
            .client
            .post(self.config.refresh_url())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        let refreshed = response.json::<RefreshResponse>().await?;
        Ok(refreshed.access)
    }
}

/// Run the register-then-login chain used by the sign-up form.
///
/// Registration errors propagate to the caller. A login failure after a
/// successful registration is reported as [`SignUpOutcome::Registered`]
/// rather than silently discarded.
pub async fn register_then_login<C>(
    api: &C,
    username: &str,
    password: &str,
    password_confirm: &str,
) -> AuthResult<SignUpOutcome>
where
    C: CredentialApi + ?Sized,
{
    api.register(username, password, password_confirm).await?;

    match api.login(username, password).await {
        Ok(session) => Ok(SignUpOutcome::SignedIn(session)),
        Err(error) => {
            tracing::warn!("login after successful registration failed: {error}");
            Ok(SignUpOutcome::Registered)
        }
    }
}

/// Map a non-2xx credential response to [`AuthError`].
///
/// Client errors with a structured field-error body become `Rejected`;
/// everything else becomes a generic `Api` error.
async fn rejection_from_response(response: reqwest::Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.is_client_error() {
        if let Ok(errors) = serde_json::from_str::<CredentialErrors>(&body) {
            if !errors.is_empty() {
                return AuthError::Rejected(errors);
            }
        }
    }

    AuthError::Api(parse_api_error(status, &body))
}

fn validate_credentials(username: &str, password: &str) -> AuthResult<()> {
    if username.trim().is_empty() {
        return Err(AuthError::InvalidConfiguration("username is required"));
    }
    if password.trim().is_empty() {
        return Err(AuthError::InvalidConfiguration("password is required"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct TokenPairResponse {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.detail.or(payload.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn session_debug_redacts_tokens() {
        let session = AuthSession::new("secret-access-token", "secret-refresh-token");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn credential_errors_default_missing_fields_to_empty() {
        let errors: CredentialErrors =
            serde_json::from_str(r#"{"username": "taken"}"#).unwrap();
        assert_eq!(errors.username, "taken");
        assert_eq!(errors.password, "");
        assert_eq!(errors.non_field_errors, "");
        assert!(!errors.is_empty());
    }

    #[test]
    fn credential_errors_without_fields_count_as_empty() {
        let errors: CredentialErrors = serde_json::from_str("{}").unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn parse_api_error_prefers_detail_field() {
        let message = parse_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "Token is invalid"}"#,
        );
        assert_eq!(message, "Token is invalid (401)");
    }

    #[test]
    fn parse_api_error_falls_back_to_status() {
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "HTTP 500"
        );
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down (502)"
        );
    }

    #[test]
    fn validate_credentials_rejects_blank_input() {
        assert!(validate_credentials("", "pw").is_err());
        assert!(validate_credentials("user", "  ").is_err());
        assert!(validate_credentials("user", "pw").is_ok());
    }
}
