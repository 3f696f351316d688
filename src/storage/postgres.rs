use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

use super::models::{
    ExpressionRecord, ExpressionUpdate, Media, MediaSlot, NewExpression, NewWord, Patch,
    WordRecord, WordUpdate,
};
use super::schema::{statements, POSTGRES_INIT};
use super::{EntryStore, StoreError};
use crate::config::DatabaseConfig;

macro_rules! word_columns {
    () => {
        "id, term, definition, examples, created_by, created_at, \
         image_bytes IS NOT NULL AS has_image, audio_bytes IS NOT NULL AS has_audio"
    };
}

macro_rules! expression_columns {
    () => {
        "id, expression, meaning, examples, created_by, created_at, \
         audio_bytes IS NOT NULL AS has_audio"
    };
}

const LIST_WORDS: &str = concat!(
    "SELECT ",
    word_columns!(),
    " FROM words ORDER BY term ASC, id ASC"
);

const GET_WORD: &str = concat!("SELECT ", word_columns!(), " FROM words WHERE id = $1");

const FIND_WORD_BY_TERM: &str = concat!(
    "SELECT ",
    word_columns!(),
    " FROM words WHERE LOWER(term) = LOWER($1) ORDER BY created_at DESC, id DESC LIMIT 1"
);

const INSERT_WORD: &str = concat!(
    "INSERT INTO words (term, definition, examples, image_bytes, image_mime, audio_bytes, audio_mime, created_by) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING ",
    word_columns!()
);

// $5/$8 select whether the slot is written at all; $6..$7 and $9..$10 carry
// the new value, NULL when clearing.
const UPDATE_WORD: &str = concat!(
    "UPDATE words SET term = $2, definition = $3, examples = $4, \
     image_bytes = CASE WHEN $5 THEN $6 ELSE image_bytes END, \
     image_mime = CASE WHEN $5 THEN $7 ELSE image_mime END, \
     audio_bytes = CASE WHEN $8 THEN $9 ELSE audio_bytes END, \
     audio_mime = CASE WHEN $8 THEN $10 ELSE audio_mime END \
     WHERE id = $1 RETURNING ",
    word_columns!()
);

const WORD_IMAGE: &str = "SELECT image_bytes, image_mime FROM words WHERE id = $1";
const WORD_AUDIO: &str = "SELECT audio_bytes, audio_mime FROM words WHERE id = $1";

const LIST_EXPRESSIONS: &str = concat!(
    "SELECT ",
    expression_columns!(),
    " FROM expressions ORDER BY expression ASC, id ASC"
);

const GET_EXPRESSION: &str = concat!(
    "SELECT ",
    expression_columns!(),
    " FROM expressions WHERE id = $1"
);

const INSERT_EXPRESSION: &str = concat!(
    "INSERT INTO expressions (expression, meaning, examples, audio_bytes, audio_mime, created_by) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
    expression_columns!()
);

const UPDATE_EXPRESSION: &str = concat!(
    "UPDATE expressions SET expression = $2, meaning = $3, examples = $4, \
     audio_bytes = CASE WHEN $5 THEN $6 ELSE audio_bytes END, \
     audio_mime = CASE WHEN $5 THEN $7 ELSE audio_mime END \
     WHERE id = $1 RETURNING ",
    expression_columns!()
);

const EXPRESSION_AUDIO: &str = "SELECT audio_bytes, audio_mime FROM expressions WHERE id = $1";

/// Production backend: a pooled Postgres connection.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect using either the full URL or the discrete parameters, then make
    /// sure both tables exist.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = connect_options(config)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        for stmt in statements(POSTGRES_INIT) {
            sqlx::query(stmt).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, StoreError> {
    let mut options = match config.url.as_deref() {
        Some(url) => url.parse::<PgConnectOptions>()?,
        None => {
            // Unset parameters fall back to the libpq PG* defaults.
            let mut options = PgConnectOptions::new();
            if let Some(host) = config.host.as_deref() {
                options = options.host(host);
            }
            if let Some(port) = config.port {
                options = options.port(port);
            }
            if let Some(user) = config.user.as_deref() {
                options = options.username(user);
            }
            if let Some(password) = config.password.as_deref() {
                options = options.password(password);
            }
            if let Some(database) = config.database.as_deref() {
                options = options.database(database);
            }
            options
        }
    };

    if config.ssl {
        options = options.ssl_mode(PgSslMode::Require);
    }

    Ok(options)
}

/// Split a slot directive into (write?, bytes, mime) bind parameters.
fn slot_params(patch: &Patch<Media>) -> (bool, Option<Vec<u8>>, Option<String>) {
    match patch.as_option() {
        None => (false, None, None),
        Some(None) => (true, None, None),
        Some(Some(media)) => (true, Some(media.data.to_vec()), Some(media.mime.clone())),
    }
}

fn media_from_row(row: Option<(Option<Vec<u8>>, Option<String>)>) -> Option<Media> {
    match row {
        Some((Some(data), Some(mime))) => Some(Media::new(mime, data)),
        _ => None,
    }
}

#[async_trait]
impl EntryStore for PgStore {
    async fn list_words(&self) -> Result<Vec<WordRecord>, StoreError> {
        let rows = sqlx::query_as::<_, WordRecord>(LIST_WORDS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_word(&self, id: i64) -> Result<Option<WordRecord>, StoreError> {
        let row = sqlx::query_as::<_, WordRecord>(GET_WORD)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_word_by_term(&self, term: &str) -> Result<Option<WordRecord>, StoreError> {
        let row = sqlx::query_as::<_, WordRecord>(FIND_WORD_BY_TERM)
            .bind(term)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_word(&self, word: NewWord) -> Result<WordRecord, StoreError> {
        let (image_bytes, image_mime) = split_media(word.image);
        let (audio_bytes, audio_mime) = split_media(word.audio);

        let row = sqlx::query_as::<_, WordRecord>(INSERT_WORD)
            .bind(word.term)
            .bind(word.definition)
            .bind(word.examples)
            .bind(image_bytes)
            .bind(image_mime)
            .bind(audio_bytes)
            .bind(audio_mime)
            .bind(word.created_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_word(
        &self,
        id: i64,
        update: WordUpdate,
    ) -> Result<Option<WordRecord>, StoreError> {
        let (set_image, image_bytes, image_mime) = slot_params(&update.image);
        let (set_audio, audio_bytes, audio_mime) = slot_params(&update.audio);

        let row = sqlx::query_as::<_, WordRecord>(UPDATE_WORD)
            .bind(id)
            .bind(update.term)
            .bind(update.definition)
            .bind(update.examples)
            .bind(set_image)
            .bind(image_bytes)
            .bind(image_mime)
            .bind(set_audio)
            .bind(audio_bytes)
            .bind(audio_mime)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn word_media(&self, id: i64, slot: MediaSlot) -> Result<Option<Media>, StoreError> {
        let sql = match slot {
            MediaSlot::Image => WORD_IMAGE,
            MediaSlot::Audio => WORD_AUDIO,
        };
        let row = sqlx::query_as::<_, (Option<Vec<u8>>, Option<String>)>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(media_from_row(row))
    }

    async fn list_expressions(&self) -> Result<Vec<ExpressionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ExpressionRecord>(LIST_EXPRESSIONS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_expression(&self, id: i64) -> Result<Option<ExpressionRecord>, StoreError> {
        let row = sqlx::query_as::<_, ExpressionRecord>(GET_EXPRESSION)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_expression(
        &self,
        expression: NewExpression,
    ) -> Result<ExpressionRecord, StoreError> {
        let (audio_bytes, audio_mime) = split_media(expression.audio);

        let row = sqlx::query_as::<_, ExpressionRecord>(INSERT_EXPRESSION)
            .bind(expression.expression)
            .bind(expression.meaning)
            .bind(expression.examples)
            .bind(audio_bytes)
            .bind(audio_mime)
            .bind(expression.created_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_expression(
        &self,
        id: i64,
        update: ExpressionUpdate,
    ) -> Result<Option<ExpressionRecord>, StoreError> {
        let (set_audio, audio_bytes, audio_mime) = slot_params(&update.audio);

        let row = sqlx::query_as::<_, ExpressionRecord>(UPDATE_EXPRESSION)
            .bind(id)
            .bind(update.expression)
            .bind(update.meaning)
            .bind(update.examples)
            .bind(set_audio)
            .bind(audio_bytes)
            .bind(audio_mime)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn expression_audio(&self, id: i64) -> Result<Option<Media>, StoreError> {
        let row = sqlx::query_as::<_, (Option<Vec<u8>>, Option<String>)>(EXPRESSION_AUDIO)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(media_from_row(row))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn split_media(media: Option<Media>) -> (Option<Vec<u8>>, Option<String>) {
    match media {
        Some(m) => (Some(m.data.to_vec()), Some(m.mime)),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_params_for_each_directive() {
        assert_eq!(slot_params(&Patch::Absent), (false, None, None));
        assert_eq!(slot_params(&Patch::Null), (true, None, None));
        let media = Media::new("audio/ogg", vec![9u8; 4]);
        assert_eq!(
            slot_params(&Patch::Value(media)),
            (true, Some(vec![9u8; 4]), Some("audio/ogg".to_string()))
        );
    }

    #[test]
    fn test_media_requires_both_bytes_and_mime() {
        assert!(media_from_row(None).is_none());
        assert!(media_from_row(Some((None, None))).is_none());
        assert!(media_from_row(Some((Some(vec![1]), None))).is_none());
        let media = media_from_row(Some((Some(vec![1, 2]), Some("image/png".into())))).unwrap();
        assert_eq!(media.mime, "image/png");
        assert_eq!(media.data.as_ref(), &[1, 2]);
    }

    #[test]
    fn test_connect_options_from_discrete_parameters() {
        let config = DatabaseConfig {
            url: None,
            host: Some("db.internal".to_string()),
            port: Some(6543),
            user: Some("family".to_string()),
            password: Some("secret".to_string()),
            database: Some("dictionary".to_string()),
            ssl: true,
            max_connections: 5,
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "family");
        assert_eq!(options.get_database(), Some("dictionary"));
    }

    #[test]
    fn test_connect_options_url_takes_precedence() {
        let config = DatabaseConfig {
            url: Some("postgres://alice@pg.example:5433/words".to_string()),
            host: Some("ignored".to_string()),
            ..DatabaseConfig::default()
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "pg.example");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("words"));
    }
}
