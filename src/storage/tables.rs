use redb::TableDefinition;

/// Blob tables map an entry id to raw media bytes.
pub type BlobTable = TableDefinition<'static, u64, &'static [u8]>;

/// Word rows: id -> StoredWord (msgpack, no media bytes)
pub const WORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("words");

/// Word image blobs: word id -> raw bytes
pub const WORD_IMAGES: BlobTable = TableDefinition::new("word_images");

/// Word audio blobs: word id -> raw bytes
pub const WORD_AUDIO: BlobTable = TableDefinition::new("word_audio");

/// Expression rows: id -> StoredExpression (msgpack, no media bytes)
pub const EXPRESSIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("expressions");

/// Expression audio blobs: expression id -> raw bytes
pub const EXPRESSION_AUDIO: BlobTable = TableDefinition::new("expression_audio");

/// Last id handed out per table name
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");
