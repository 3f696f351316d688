//! Postgres DDL applied at startup.
//!
//! Statements are idempotent and separated by `;` so they can be executed one
//! at a time. Comments must not contain semicolons.

pub const POSTGRES_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Words
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS words (
    id BIGSERIAL PRIMARY KEY,
    term TEXT NOT NULL,
    definition TEXT NOT NULL,
    examples TEXT NULL,
    image_bytes BYTEA NULL,
    image_mime TEXT NULL,
    audio_bytes BYTEA NULL,
    audio_mime TEXT NULL,
    created_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT words_image_pair CHECK ((image_bytes IS NULL) = (image_mime IS NULL)),
    CONSTRAINT words_audio_pair CHECK ((audio_bytes IS NULL) = (audio_mime IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_words_term ON words(term);
CREATE INDEX IF NOT EXISTS idx_words_term_lower ON words(LOWER(term));

-- ---------------------------------------------------------------------------
-- Expressions (no image slot)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS expressions (
    id BIGSERIAL PRIMARY KEY,
    expression TEXT NOT NULL,
    meaning TEXT NOT NULL,
    examples TEXT NULL,
    audio_bytes BYTEA NULL,
    audio_mime TEXT NULL,
    created_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT expressions_audio_pair CHECK ((audio_bytes IS NULL) = (audio_mime IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_expressions_expression ON expressions(expression);
"#;

/// Split the init script into individual statements.
pub fn statements(script: &str) -> impl Iterator<Item = &str> {
    script.split(';').map(str::trim).filter(|s| !s.is_empty())
}
