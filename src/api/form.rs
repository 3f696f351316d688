//! Entry request bodies. Create and update accept either JSON or multipart
//! form data; both are parsed into the same [`EntryForm`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use bytes::Bytes;

use crate::api::response::{ApiError, AppJson};
use crate::config::UploadConfig;
use crate::storage::models::{normalize_mime, Media, MediaSlot};
use crate::AppState;

const TEXT_FIELDS: &[&str] = &[
    "term",
    "definition",
    "expression",
    "meaning",
    "examples",
    "created_by",
];

/// An uploaded file part before slot validation.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub mime: String,
    pub data: Bytes,
}

impl Upload {
    /// Check the upload against the slot's allow-list and size ceiling.
    pub fn into_media(self, slot: MediaSlot) -> Result<Media, ApiError> {
        if !slot.accepts(&self.mime) {
            return Err(ApiError::bad_request(format!(
                "Unsupported {} type '{}'. Allowed types: {}",
                slot.as_str(),
                self.mime,
                slot.allowed_types().join(", ")
            )));
        }

        if self.data.len() > slot.max_bytes() {
            return Err(ApiError::bad_request(format!(
                "{} file is too large (max {} MB)",
                capitalize(slot.as_str()),
                slot.max_bytes() / (1024 * 1024)
            )));
        }

        Ok(Media::new(self.mime, self.data))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parsed create/update body, independent of how it was encoded.
#[derive(Debug, Default)]
pub struct EntryForm {
    fields: HashMap<String, String>,
    pub remove_image: bool,
    pub remove_audio: bool,
    pub image: Option<Upload>,
    pub audio: Option<Upload>,
}

impl EntryForm {
    /// A required text field, trimmed. Missing fields come back empty.
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// An optional text field, trimmed; blank values become `None`.
    pub fn optional_text(&self, name: &str) -> Option<String> {
        let value = self.text(name);
        (!value.is_empty()).then_some(value)
    }

    pub fn from_json(body: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut form = EntryForm::default();
        for (key, value) in body {
            match key.as_str() {
                "removeImage" => form.remove_image = json_flag(&value),
                "removeAudio" => form.remove_audio = json_flag(&value),
                name if TEXT_FIELDS.contains(&name) => {
                    // Non-string values are treated as missing.
                    if let serde_json::Value::String(text) = value {
                        form.fields.insert(name.to_string(), text);
                    }
                }
                _ => {}
            }
        }
        form
    }

    pub async fn from_multipart(
        mut multipart: Multipart,
        limits: &UploadConfig,
    ) -> Result<Self, ApiError> {
        let mut form = EntryForm::default();
        let mut file_count = 0usize;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_failure("Invalid multipart data", e))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "image" | "audio" => {
                    let file_name = field.file_name().map(|s| s.to_string());
                    let content_type = field.content_type().map(|s| s.to_string());

                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_failure("Failed to read file", e))?;

                    // Browsers send an empty part for an untouched file input.
                    if data.is_empty() {
                        continue;
                    }

                    file_count += 1;
                    if file_count > limits.max_files {
                        return Err(ApiError::bad_request(format!(
                            "Too many files (max {})",
                            limits.max_files
                        )));
                    }

                    if data.len() > limits.max_file_size {
                        return Err(ApiError::bad_request(format!(
                            "File exceeds maximum upload size of {} bytes",
                            limits.max_file_size
                        )));
                    }

                    let upload = Upload {
                        mime: resolve_mime(content_type.as_deref(), file_name.as_deref()),
                        file_name,
                        data,
                    };

                    if field_name == "image" {
                        form.image = Some(upload);
                    } else {
                        form.audio = Some(upload);
                    }
                }
                "removeImage" | "removeAudio" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| multipart_failure(&format!("Invalid {field_name}"), e))?;
                    let flag = text_flag(&text);
                    if field_name == "removeImage" {
                        form.remove_image = flag;
                    } else {
                        form.remove_audio = flag;
                    }
                }
                name if TEXT_FIELDS.contains(&name) => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| multipart_failure(&format!("Invalid {field_name}"), e))?;
                    form.fields.insert(name.to_string(), text);
                }
                _ => {
                    // Ignore unknown fields
                }
            }
        }

        Ok(form)
    }
}

/// Use the declared content type, or guess from the file name when the client
/// sent none or the generic octet-stream.
fn resolve_mime(content_type: Option<&str>, file_name: Option<&str>) -> String {
    content_type
        .map(normalize_mime)
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .or_else(|| {
            file_name
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| normalize_mime(m.essence_str()))
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// The whole-request body limit surfaces here as a 413; anything else is a
/// malformed body.
fn multipart_failure(context: &str, error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Request body is too large")
    } else {
        ApiError::bad_request(format!("{context}: {error}"))
    }
}

fn text_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

fn json_flag(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => text_flag(s),
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

#[axum::async_trait]
impl FromRequest<Arc<AppState>> for EntryForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, ApiError> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(normalize_mime)
            .unwrap_or_default();

        match content_type.as_str() {
            "application/json" => {
                let AppJson(body) =
                    AppJson::<serde_json::Map<String, serde_json::Value>>::from_request(
                        req, state,
                    )
                    .await?;
                Ok(EntryForm::from_json(body))
            }
            "multipart/form-data" => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()).rejected())?;
                EntryForm::from_multipart(multipart, &state.config.uploads)
                    .await
                    .map_err(ApiError::rejected)
            }
            _ => Err(ApiError::bad_request(
                "Content-Type must be application/json or multipart/form-data",
            )
            .rejected()),
        }
    }
}
