use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database as RedbDatabase, ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use super::models::{
    ExpressionRecord, ExpressionUpdate, Media, MediaSlot, NewExpression, NewWord, Patch,
    WordRecord, WordUpdate,
};
use super::tables::*;
use super::{EntryStore, StoreError};

/// Word row as persisted in redb. Media bytes live in their own tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredWord {
    term: String,
    definition: String,
    #[serde(default)]
    examples: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    image_mime: Option<String>,
    #[serde(default)]
    audio_mime: Option<String>,
}

impl StoredWord {
    fn to_record(&self, id: u64) -> WordRecord {
        WordRecord {
            id: id as i64,
            term: self.term.clone(),
            definition: self.definition.clone(),
            examples: self.examples.clone(),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            has_image: self.image_mime.is_some(),
            has_audio: self.audio_mime.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredExpression {
    expression: String,
    meaning: String,
    #[serde(default)]
    examples: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    audio_mime: Option<String>,
}

impl StoredExpression {
    fn to_record(&self, id: u64) -> ExpressionRecord {
        ExpressionRecord {
            id: id as i64,
            expression: self.expression.clone(),
            meaning: self.meaning.clone(),
            examples: self.examples.clone(),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            has_audio: self.audio_mime.is_some(),
        }
    }
}

/// Embedded single-file backend for development and tests.
pub struct LocalStore {
    db: Arc<RedbDatabase>,
}

impl Clone for LocalStore {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl LocalStore {
    /// Open or create a store in the given directory
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("family-dictionary.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WORDS)?;
            let _ = write_txn.open_table(WORD_IMAGES)?;
            let _ = write_txn.open_table(WORD_AUDIO)?;
            let _ = write_txn.open_table(EXPRESSIONS)?;
            let _ = write_txn.open_table(EXPRESSION_AUDIO)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn load_word(&self, id: u64) -> Result<Option<StoredWord>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WORDS)?;
        let row = table
            .get(id)?
            .map(|data| rmp_serde::from_slice(data.value()))
            .transpose()?;
        Ok(row)
    }

    fn all_words(&self) -> Result<Vec<WordRecord>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WORDS)?;

        let mut words = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let word: StoredWord = rmp_serde::from_slice(value.value())?;
            words.push(word.to_record(key.value()));
        }
        Ok(words)
    }

    fn load_expression(&self, id: u64) -> Result<Option<StoredExpression>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EXPRESSIONS)?;
        let row = table
            .get(id)?
            .map(|data| rmp_serde::from_slice(data.value()))
            .transpose()?;
        Ok(row)
    }

    fn read_blob(
        &self,
        table_def: BlobTable,
        id: u64,
        mime: Option<String>,
    ) -> Result<Option<Media>, StoreError> {
        let Some(mime) = mime else {
            return Ok(None);
        };
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_def)?;
        let data = table.get(id)?.map(|v| v.value().to_vec());
        Ok(data.map(|bytes| Media::new(mime, bytes)))
    }
}

/// Hand out the next id for a table. Ids start at 1 and are never reused.
fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64, StoreError> {
    let mut table = txn.open_table(SEQUENCES)?;
    let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

/// Apply a slot directive to a blob table, returning the mime the row should carry.
fn apply_patch(
    txn: &WriteTransaction,
    table_def: BlobTable,
    id: u64,
    patch: &Patch<Media>,
    current_mime: Option<String>,
) -> Result<Option<String>, StoreError> {
    match patch.as_option() {
        None => Ok(current_mime),
        Some(None) => {
            let mut table = txn.open_table(table_def)?;
            table.remove(id)?;
            Ok(None)
        }
        Some(Some(media)) => {
            let mut table = txn.open_table(table_def)?;
            table.insert(id, media.data.as_ref())?;
            Ok(Some(media.mime.clone()))
        }
    }
}

fn put_blob(
    txn: &WriteTransaction,
    table_def: BlobTable,
    id: u64,
    media: Option<&Media>,
) -> Result<Option<String>, StoreError> {
    match media {
        Some(media) => {
            let mut table = txn.open_table(table_def)?;
            table.insert(id, media.data.as_ref())?;
            Ok(Some(media.mime.clone()))
        }
        None => Ok(None),
    }
}

/// Ids outside the u64 range can never exist.
fn key(id: i64) -> Option<u64> {
    u64::try_from(id).ok()
}

#[async_trait]
impl EntryStore for LocalStore {
    async fn list_words(&self) -> Result<Vec<WordRecord>, StoreError> {
        let mut words = self.all_words()?;
        words.sort_by(|a, b| a.term.cmp(&b.term).then(a.id.cmp(&b.id)));
        Ok(words)
    }

    async fn get_word(&self, id: i64) -> Result<Option<WordRecord>, StoreError> {
        let Some(id) = key(id) else {
            return Ok(None);
        };
        Ok(self.load_word(id)?.map(|w| w.to_record(id)))
    }

    async fn find_word_by_term(&self, term: &str) -> Result<Option<WordRecord>, StoreError> {
        let needle = term.to_lowercase();
        let found = self
            .all_words()?
            .into_iter()
            .filter(|w| w.term.to_lowercase() == needle)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn insert_word(&self, word: NewWord) -> Result<WordRecord, StoreError> {
        debug_assert!(!word.term.is_empty(), "word term must not be empty");

        let write_txn = self.db.begin_write()?;
        let (id, stored) = {
            let id = next_id(&write_txn, "words")?;
            let image_mime = put_blob(&write_txn, WORD_IMAGES, id, word.image.as_ref())?;
            let audio_mime = put_blob(&write_txn, WORD_AUDIO, id, word.audio.as_ref())?;

            let stored = StoredWord {
                term: word.term,
                definition: word.definition,
                examples: word.examples,
                created_by: word.created_by,
                created_at: Utc::now(),
                image_mime,
                audio_mime,
            };
            let data = rmp_serde::to_vec_named(&stored)?;
            let mut table = write_txn.open_table(WORDS)?;
            table.insert(id, data.as_slice())?;
            (id, stored)
        };
        write_txn.commit()?;

        Ok(stored.to_record(id))
    }

    async fn update_word(
        &self,
        id: i64,
        update: WordUpdate,
    ) -> Result<Option<WordRecord>, StoreError> {
        let Some(id) = key(id) else {
            return Ok(None);
        };

        let write_txn = self.db.begin_write()?;

        let existing: Option<StoredWord> = {
            let table = write_txn.open_table(WORDS)?;
            let result = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut word) => {
                word.term = update.term;
                word.definition = update.definition;
                word.examples = update.examples;
                word.image_mime =
                    apply_patch(&write_txn, WORD_IMAGES, id, &update.image, word.image_mime)?;
                word.audio_mime =
                    apply_patch(&write_txn, WORD_AUDIO, id, &update.audio, word.audio_mime)?;

                let serialized = rmp_serde::to_vec_named(&word)?;
                let mut table = write_txn.open_table(WORDS)?;
                table.insert(id, serialized.as_slice())?;
                Some(word.to_record(id))
            }
            None => None,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    async fn word_media(&self, id: i64, slot: MediaSlot) -> Result<Option<Media>, StoreError> {
        let Some(id) = key(id) else {
            return Ok(None);
        };
        let Some(word) = self.load_word(id)? else {
            return Ok(None);
        };
        match slot {
            MediaSlot::Image => self.read_blob(WORD_IMAGES, id, word.image_mime),
            MediaSlot::Audio => self.read_blob(WORD_AUDIO, id, word.audio_mime),
        }
    }

    async fn list_expressions(&self) -> Result<Vec<ExpressionRecord>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EXPRESSIONS)?;

        let mut expressions = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let expression: StoredExpression = rmp_serde::from_slice(value.value())?;
            expressions.push(expression.to_record(key.value()));
        }
        expressions.sort_by(|a, b| a.expression.cmp(&b.expression).then(a.id.cmp(&b.id)));
        Ok(expressions)
    }

    async fn get_expression(&self, id: i64) -> Result<Option<ExpressionRecord>, StoreError> {
        let Some(id) = key(id) else {
            return Ok(None);
        };
        Ok(self.load_expression(id)?.map(|e| e.to_record(id)))
    }

    async fn insert_expression(
        &self,
        expression: NewExpression,
    ) -> Result<ExpressionRecord, StoreError> {
        let write_txn = self.db.begin_write()?;
        let (id, stored) = {
            let id = next_id(&write_txn, "expressions")?;
            let audio_mime =
                put_blob(&write_txn, EXPRESSION_AUDIO, id, expression.audio.as_ref())?;

            let stored = StoredExpression {
                expression: expression.expression,
                meaning: expression.meaning,
                examples: expression.examples,
                created_by: expression.created_by,
                created_at: Utc::now(),
                audio_mime,
            };
            let data = rmp_serde::to_vec_named(&stored)?;
            let mut table = write_txn.open_table(EXPRESSIONS)?;
            table.insert(id, data.as_slice())?;
            (id, stored)
        };
        write_txn.commit()?;

        Ok(stored.to_record(id))
    }

    async fn update_expression(
        &self,
        id: i64,
        update: ExpressionUpdate,
    ) -> Result<Option<ExpressionRecord>, StoreError> {
        let Some(id) = key(id) else {
            return Ok(None);
        };

        let write_txn = self.db.begin_write()?;

        let existing: Option<StoredExpression> = {
            let table = write_txn.open_table(EXPRESSIONS)?;
            let result = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut expression) => {
                expression.expression = update.expression;
                expression.meaning = update.meaning;
                expression.examples = update.examples;
                expression.audio_mime = apply_patch(
                    &write_txn,
                    EXPRESSION_AUDIO,
                    id,
                    &update.audio,
                    expression.audio_mime,
                )?;

                let serialized = rmp_serde::to_vec_named(&expression)?;
                let mut table = write_txn.open_table(EXPRESSIONS)?;
                table.insert(id, serialized.as_slice())?;
                Some(expression.to_record(id))
            }
            None => None,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    async fn expression_audio(&self, id: i64) -> Result<Option<Media>, StoreError> {
        let Some(id) = key(id) else {
            return Ok(None);
        };
        let Some(expression) = self.load_expression(id)? else {
            return Ok(None);
        };
        self.read_blob(EXPRESSION_AUDIO, id, expression.audio_mime)
    }
}
