//! Gif API client for create and update operations.
//!
//! Requests are multipart: a `name` text part, a `tags` part holding a
//! JSON-encoded string array, and (for create only) the gif file itself.
//! Authenticated with the backend's `JWT <access>` authorization scheme.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::parse_api_error;
use crate::config::BackendConfig;

/// An in-memory gif file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct GifFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl GifFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for GifFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GifFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Form data for one gif create or update request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GifSubmission {
    pub name: String,
    pub tags: Vec<String>,
    pub file: Option<GifFile>,
}

/// Serialize a tag list into the wire format the backend expects.
///
/// An empty list serializes to exactly `"[]"`.
pub fn tags_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| String::from("[]"))
}

/// Success payload for gif create/update.
///
/// `tags` carries the server's updated gallery-wide tag list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GifRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Per-field validation messages returned by the gif routes.
///
/// Missing fields default to empty strings so stale errors are cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GifFieldErrors {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Error)]
pub enum GifApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Access token was not accepted")]
    Unauthorized,
    #[error("Submission rejected by the server")]
    Rejected(GifFieldErrors),
    #[error("Gif API error: {0}")]
    Api(String),
}

pub type GifApiResult<T> = Result<T, GifApiError>;

/// Gif storage routes consumed by the form controller.
#[async_trait]
pub trait GifStore: Send + Sync {
    /// Create a gif. `POST /backend/api/v1/gifs/`.
    async fn create(&self, access_token: &str, submission: &GifSubmission)
        -> GifApiResult<GifRecord>;

    /// Update gif metadata. `PATCH /backend/api/v1/gifs/{id}/`. The file
    /// part is never sent on update.
    async fn update(
        &self,
        access_token: &str,
        id: u64,
        submission: &GifSubmission,
    ) -> GifApiResult<GifRecord>;
}

/// HTTP implementation of [`GifStore`] against the gifdeck backend.
#[derive(Debug, Clone)]
pub struct HttpGifStore {
    config: BackendConfig,
    client: reqwest::Client,
}

impl HttpGifStore {
    pub fn new(config: BackendConfig) -> GifApiResult<Self> {
        Ok(Self {
            config,
            client: reqwest::Client::builder().build()?,
        })
    }

    fn multipart_form(
        submission: &GifSubmission,
        include_file: bool,
    ) -> GifApiResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new()
            .text("name", submission.name.clone())
            .text("tags", tags_json(&submission.tags));

        if include_file {
            if let Some(file) = &submission.file {
                let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str("image/gif")?;
                form = form.part("file", part);
            }
        }

        Ok(form)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        access_token: &str,
        form: reqwest::multipart::Form,
    ) -> GifApiResult<GifRecord> {
        let response = request
            .header("Authorization", format!("JWT {access_token}"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<GifRecord>().await?);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GifApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            if let Ok(errors) = serde_json::from_str::<GifFieldErrors>(&body) {
                return Err(GifApiError::Rejected(errors));
            }
        }
        Err(GifApiError::Api(parse_api_error(status, &body)))
    }
}

#[async_trait]
impl GifStore for HttpGifStore {
    async fn create(
        &self,
        access_token: &str,
        submission: &GifSubmission,
    ) -> GifApiResult<GifRecord> {
        let form = Self::multipart_form(submission, true)?;
        let request = self.client.post(self.config.gifs_url());
        self.send(request, access_token, form).await
    }

    async fn update(
        &self,
        access_token: &str,
        id: u64,
        submission: &GifSubmission,
    ) -> GifApiResult<GifRecord> {
        let form = Self::multipart_form(submission, false)?;
        let request = self.client.patch(self.config.gif_url(id));
        self.send(request, access_token, form).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn tags_json_empty_list_is_bare_brackets() {
        assert_eq!(tags_json(&[]), "[]");
    }

    #[test]
    fn tags_json_is_a_json_string_array() {
        let tags = vec!["cats".to_string(), "loop".to_string()];
        let encoded = tags_json(&tags);
        assert_eq!(encoded, r#"["cats","loop"]"#);

        let decoded: Vec<String> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, tags);
    }

    #[test]
    fn tags_json_escapes_special_characters() {
        let tags = vec![r#"say "hi""#.to_string()];
        let decoded: Vec<String> = serde_json::from_str(&tags_json(&tags)).unwrap();
        assert_eq!(decoded, tags);
    }

    #[test]
    fn gif_field_errors_default_missing_fields_to_empty() {
        let errors: GifFieldErrors =
            serde_json::from_str(r#"{"file": "Not a gif"}"#).unwrap();
        assert_eq!(errors.name, "");
        assert_eq!(errors.file, "Not a gif");
        assert_eq!(errors.tags, "");
    }

    #[test]
    fn gif_record_tolerates_partial_payloads() {
        let record: GifRecord = serde_json::from_str(r#"{"tags": ["a"]}"#).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.name, "");
        assert_eq!(record.tags, vec!["a".to_string()]);
    }

    #[test]
    fn gif_file_debug_omits_bytes() {
        let file = GifFile::new("cat.gif", vec![0u8; 2048]);
        let rendered = format!("{file:?}");
        assert!(rendered.contains("cat.gif"));
        assert!(rendered.contains("2048"));
        assert!(!rendered.contains("[0,"));
    }
}
