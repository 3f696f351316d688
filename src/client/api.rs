use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use super::recorder::MediaFile;
use crate::api::projection::{Expression, ExpressionSaved, Word, WordSaved};
use crate::storage::models::MediaSlot;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error status (or `ok: false`). The message
    /// is the server's `error` string, or a per-action fallback.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
        }
    }
}

/// Either error envelope; `ok` is only present on write paths.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

/// Fields for creating or updating a word. `created_by` is ignored on update.
#[derive(Debug, Clone, Default)]
pub struct WordInput {
    pub term: String,
    pub definition: String,
    pub examples: Option<String>,
    pub created_by: String,
    pub image: Option<MediaFile>,
    pub audio: Option<MediaFile>,
    pub remove_image: bool,
    pub remove_audio: bool,
}

/// Fields for creating or updating an expression.
#[derive(Debug, Clone, Default)]
pub struct ExpressionInput {
    pub expression: String,
    pub meaning: String,
    pub examples: Option<String>,
    pub created_by: String,
    pub audio: Option<MediaFile>,
    pub remove_audio: bool,
}

/// HTTP client for the dictionary API.
#[derive(Debug, Clone)]
pub struct DictionaryClient {
    http: reqwest::Client,
    base_url: String,
}

impl DictionaryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a relative media path such as `/api/words/3/image`.
    pub fn media_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub async fn check_access(&self, access_code: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/api/check-access"))
            .json(&serde_json::json!({ "accessCode": access_code }))
            .send()
            .await?;

        let status = response.status();
        let body: ErrorEnvelope = response.json().await.unwrap_or_default();
        if status.is_success() && body.ok == Some(true) {
            return Ok(());
        }
        Err(ClientError::Api {
            status,
            message: body.error.unwrap_or_else(|| "Access denied".to_string()),
        })
    }

    // ------------------------------------------------------------------
    // Words
    // ------------------------------------------------------------------

    pub async fn list_words(&self) -> Result<Vec<Word>, ClientError> {
        let response = self.http.get(self.url("/api/words")).send().await?;
        read_json(response, "Failed to fetch words").await
    }

    pub async fn get_word(&self, id: i64) -> Result<Word, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/words/{id}")))
            .send()
            .await?;
        read_json(response, "Failed to fetch word").await
    }

    pub async fn get_word_by_term(&self, term: &str) -> Result<Word, ClientError> {
        let mut url = reqwest::Url::parse(&self.url("/api/words/by-term/"))
            .map_err(|e| fallback_error(StatusCode::BAD_REQUEST, e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| fallback_error(StatusCode::BAD_REQUEST, "Invalid base URL".into()))?
            .pop_if_empty()
            .push(term);

        let response = self.http.get(url).send().await?;
        read_json(response, "Failed to fetch word").await
    }

    pub async fn create_word(&self, input: &WordInput) -> Result<Word, ClientError> {
        let form = word_form(input, true)?;
        let response = self
            .http
            .post(self.url("/api/words"))
            .multipart(form)
            .send()
            .await?;
        let saved: WordSaved = read_saved(response, "Failed to create word").await?;
        Ok(saved.word)
    }

    pub async fn update_word(&self, id: i64, input: &WordInput) -> Result<Word, ClientError> {
        let form = word_form(input, false)?;
        let response = self
            .http
            .put(self.url(&format!("/api/words/{id}")))
            .multipart(form)
            .send()
            .await?;
        let saved: WordSaved = read_saved(response, "Failed to update word").await?;
        Ok(saved.word)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub async fn list_expressions(&self) -> Result<Vec<Expression>, ClientError> {
        let response = self.http.get(self.url("/api/expressions")).send().await?;
        read_json(response, "Failed to fetch expressions").await
    }

    pub async fn get_expression(&self, id: i64) -> Result<Expression, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/expressions/{id}")))
            .send()
            .await?;
        read_json(response, "Failed to fetch expression").await
    }

    pub async fn create_expression(
        &self,
        input: &ExpressionInput,
    ) -> Result<Expression, ClientError> {
        let form = expression_form(input, true)?;
        let response = self
            .http
            .post(self.url("/api/expressions"))
            .multipart(form)
            .send()
            .await?;
        let saved: ExpressionSaved = read_saved(response, "Failed to create expression").await?;
        Ok(saved.expression)
    }

    pub async fn update_expression(
        &self,
        id: i64,
        input: &ExpressionInput,
    ) -> Result<Expression, ClientError> {
        let form = expression_form(input, false)?;
        let response = self
            .http
            .put(self.url(&format!("/api/expressions/{id}")))
            .multipart(form)
            .send()
            .await?;
        let saved: ExpressionSaved = read_saved(response, "Failed to update expression").await?;
        Ok(saved.expression)
    }

    // ------------------------------------------------------------------
    // Media
    // ------------------------------------------------------------------

    /// Download a media blob by its (relative or absolute) URL.
    pub async fn fetch_media(&self, path: &str) -> Result<MediaFile, ClientError> {
        let response = self.http.get(self.media_url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(read_error(response, "Failed to fetch media").await);
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = path.rsplit('/').next().unwrap_or("media").to_string();
        let bytes = response.bytes().await?;

        Ok(MediaFile {
            file_name,
            mime,
            bytes,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn fallback_error(status: StatusCode, message: String) -> ClientError {
    ClientError::Api { status, message }
}

async fn read_error(response: Response, fallback: &str) -> ClientError {
    let status = response.status();
    let body: ErrorEnvelope = response.json().await.unwrap_or_default();
    ClientError::Api {
        status,
        message: body.error.unwrap_or_else(|| fallback.to_string()),
    }
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(read_error(response, fallback).await);
    }
    Ok(response.json().await?)
}

/// Write paths answer `{"ok": true, ...}`; `ok: false` is a failure even on 2xx.
async fn read_saved<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, ClientError> {
    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();

    if !status.is_success() || body.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let message = body
            .get("error")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string());
        return Err(ClientError::Api { status, message });
    }

    serde_json::from_value(body).map_err(|_| fallback_error(status, fallback.to_string()))
}

fn file_part(file: &MediaFile) -> Result<Part, ClientError> {
    Ok(Part::bytes(file.bytes.to_vec())
        .file_name(file.file_name.clone())
        .mime_str(&file.mime)?)
}

fn word_form(input: &WordInput, include_author: bool) -> Result<Form, ClientError> {
    let mut form = Form::new()
        .text("term", input.term.clone())
        .text("definition", input.definition.clone())
        .text("examples", input.examples.clone().unwrap_or_default());

    if include_author {
        form = form.text("created_by", input.created_by.clone());
    } else {
        form = form
            .text("removeImage", input.remove_image.to_string())
            .text("removeAudio", input.remove_audio.to_string());
    }

    if let Some(image) = &input.image {
        form = form.part(MediaSlot::Image.as_str(), file_part(image)?);
    }
    if let Some(audio) = &input.audio {
        form = form.part(MediaSlot::Audio.as_str(), file_part(audio)?);
    }
    Ok(form)
}

fn expression_form(input: &ExpressionInput, include_author: bool) -> Result<Form, ClientError> {
    let mut form = Form::new()
        .text("expression", input.expression.clone())
        .text("meaning", input.meaning.clone())
        .text("examples", input.examples.clone().unwrap_or_default());

    if include_author {
        form = form.text("created_by", input.created_by.clone());
    } else {
        form = form.text("removeAudio", input.remove_audio.to_string());
    }

    if let Some(audio) = &input.audio {
        form = form.part(MediaSlot::Audio.as_str(), file_part(audio)?);
    }
    Ok(form)
}
