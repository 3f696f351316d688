use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Largest image attachment accepted, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Largest audio attachment accepted, in bytes.
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

pub const IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];
pub const AUDIO_TYPES: &[&str] = &["audio/mpeg", "audio/mp4", "audio/webm", "audio/ogg"];

/// Three-state patch value for a media slot on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    /// Slot was not mentioned in the request (leave unchanged).
    #[default]
    Absent,
    /// Slot was explicitly cleared.
    Null,
    /// Slot receives a new value.
    Value(T),
}

impl<T> Patch<T> {
    /// Resolve a slot directive. A supplied value always wins over the remove flag.
    pub fn from_upload(value: Option<T>, remove: bool) -> Self {
        match (value, remove) {
            (Some(v), _) => Patch::Value(v),
            (None, true) => Patch::Null,
            (None, false) => Patch::Absent,
        }
    }

    /// Convert to the `Option<Option<&T>>` form: `None` means "leave unchanged".
    pub fn as_option(&self) -> Option<Option<&T>> {
        match self {
            Patch::Absent => None,
            Patch::Null => Some(None),
            Patch::Value(v) => Some(Some(v)),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

/// One of a record's optional binary attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSlot {
    Audio,
    Image,
}

impl MediaSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSlot::Audio => "audio",
            MediaSlot::Image => "image",
        }
    }

    pub fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            MediaSlot::Audio => AUDIO_TYPES,
            MediaSlot::Image => IMAGE_TYPES,
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            MediaSlot::Audio => MAX_AUDIO_BYTES,
            MediaSlot::Image => MAX_IMAGE_BYTES,
        }
    }

    /// Whether an already-normalized mime type is on this slot's allow-list.
    pub fn accepts(&self, mime: &str) -> bool {
        self.allowed_types().contains(&mime)
    }
}

/// Reduce a declared content type to its lower-cased essence (`type/subtype`),
/// folding the common `image/jpg` alias into `image/jpeg`.
pub fn normalize_mime(raw: &str) -> String {
    let essence = raw
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => essence,
    }
}

/// A stored attachment: raw bytes plus the content type they were uploaded with.
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub mime: String,
    pub data: Bytes,
}

impl Media {
    pub fn new(mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }
}

/// A word row without its media bytes.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WordRecord {
    pub id: i64,
    pub term: String,
    pub definition: String,
    pub examples: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub has_image: bool,
    pub has_audio: bool,
}

/// An expression row without its media bytes.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ExpressionRecord {
    pub id: i64,
    pub expression: String,
    pub meaning: String,
    pub examples: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub has_audio: bool,
}

#[derive(Debug, Clone)]
pub struct NewWord {
    pub term: String,
    pub definition: String,
    pub examples: Option<String>,
    pub created_by: String,
    pub image: Option<Media>,
    pub audio: Option<Media>,
}

/// Replacement text plus per-slot media directives. `created_by` and
/// `created_at` are write-once and never part of an update.
#[derive(Debug, Clone)]
pub struct WordUpdate {
    pub term: String,
    pub definition: String,
    pub examples: Option<String>,
    pub image: Patch<Media>,
    pub audio: Patch<Media>,
}

#[derive(Debug, Clone)]
pub struct NewExpression {
    pub expression: String,
    pub meaning: String,
    pub examples: Option<String>,
    pub created_by: String,
    pub audio: Option<Media>,
}

#[derive(Debug, Clone)]
pub struct ExpressionUpdate {
    pub expression: String,
    pub meaning: String,
    pub examples: Option<String>,
    pub audio: Patch<Media>,
}
