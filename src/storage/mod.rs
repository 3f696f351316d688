mod local;
pub mod models;
mod postgres;
pub mod schema;
mod tables;

pub use local::LocalStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

use models::{
    ExpressionRecord, ExpressionUpdate, Media, MediaSlot, NewExpression, NewWord, WordRecord,
    WordUpdate,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        StoreError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        StoreError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for StoreError {
    fn from(e: redb::Error) -> Self {
        StoreError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        StoreError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        StoreError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        StoreError::Transaction(Box::new(e))
    }
}

/// Persistence gateway for both entry kinds.
///
/// Every mutating call writes exactly one row. Ids are per kind: a word and an
/// expression may share the same numeric id.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// All words ordered by term ascending.
    async fn list_words(&self) -> Result<Vec<WordRecord>, StoreError>;
    async fn get_word(&self, id: i64) -> Result<Option<WordRecord>, StoreError>;
    /// Case-insensitive exact match; the most recently created match wins.
    async fn find_word_by_term(&self, term: &str) -> Result<Option<WordRecord>, StoreError>;
    async fn insert_word(&self, word: NewWord) -> Result<WordRecord, StoreError>;
    /// Returns `None` when no word has this id.
    async fn update_word(
        &self,
        id: i64,
        update: WordUpdate,
    ) -> Result<Option<WordRecord>, StoreError>;
    /// Returns `None` when the word is unknown or the slot is empty.
    async fn word_media(&self, id: i64, slot: MediaSlot) -> Result<Option<Media>, StoreError>;

    /// All expressions ordered by expression text ascending.
    async fn list_expressions(&self) -> Result<Vec<ExpressionRecord>, StoreError>;
    async fn get_expression(&self, id: i64) -> Result<Option<ExpressionRecord>, StoreError>;
    async fn insert_expression(
        &self,
        expression: NewExpression,
    ) -> Result<ExpressionRecord, StoreError>;
    async fn update_expression(
        &self,
        id: i64,
        update: ExpressionUpdate,
    ) -> Result<Option<ExpressionRecord>, StoreError>;
    async fn expression_audio(&self, id: i64) -> Result<Option<Media>, StoreError>;

    /// Release pooled resources during shutdown.
    async fn close(&self) {}
}

/// Open the backend selected by configuration.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn EntryStore>, StoreError> {
    match config.backend {
        StorageBackend::Local => {
            let store = LocalStore::open(&config.local_data_dir)?;
            tracing::info!(
                "Using local storage backend at: {}",
                config.local_data_dir
            );
            Ok(Arc::new(store))
        }
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database).await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                "Using Postgres storage backend"
            );
            Ok(Arc::new(store))
        }
    }
}
