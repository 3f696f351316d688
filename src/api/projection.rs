//! JSON views of stored entries. Raw media never appears here; clients follow
//! the derived URLs instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::models::{ExpressionRecord, MediaSlot, WordRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub term: String,
    pub definition: String,
    pub examples: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "hasImage")]
    pub has_image: bool,
    #[serde(rename = "hasAudio")]
    pub has_audio: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "audioUrl")]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub id: i64,
    pub expression: String,
    pub meaning: String,
    pub examples: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "hasAudio")]
    pub has_audio: bool,
    #[serde(rename = "audioUrl")]
    pub audio_url: Option<String>,
}

/// `{"ok": true, "word": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSaved {
    pub ok: bool,
    pub word: Word,
}

/// `{"ok": true, "expression": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionSaved {
    pub ok: bool,
    pub expression: Expression,
}

pub fn word_media_path(id: i64, slot: MediaSlot) -> String {
    format!("/api/words/{id}/{}", slot.as_str())
}

pub fn expression_audio_path(id: i64) -> String {
    format!("/api/expressions/{id}/audio")
}

impl From<&WordRecord> for Word {
    fn from(record: &WordRecord) -> Self {
        Word {
            id: record.id,
            term: record.term.clone(),
            definition: record.definition.clone(),
            examples: record.examples.clone(),
            created_by: record.created_by.clone(),
            created_at: record.created_at,
            has_image: record.has_image,
            has_audio: record.has_audio,
            image_url: record
                .has_image
                .then(|| word_media_path(record.id, MediaSlot::Image)),
            audio_url: record
                .has_audio
                .then(|| word_media_path(record.id, MediaSlot::Audio)),
        }
    }
}

impl From<&ExpressionRecord> for Expression {
    fn from(record: &ExpressionRecord) -> Self {
        Expression {
            id: record.id,
            expression: record.expression.clone(),
            meaning: record.meaning.clone(),
            examples: record.examples.clone(),
            created_by: record.created_by.clone(),
            created_at: record.created_at,
            has_audio: record.has_audio,
            audio_url: record.has_audio.then(|| expression_audio_path(record.id)),
        }
    }
}
