//! View state for the client screens. Each view owns its own error slot so a
//! failure in one never clears another.

use async_trait::async_trait;

use super::api::{ClientError, DictionaryClient, ExpressionInput, WordInput};
use super::recorder::MediaFile;
use super::search::{filter, Searchable};
use crate::api::projection::{Expression, Word};

// ============================================================================
// Shared plumbing
// ============================================================================

/// An entry kind the views can fetch and replace by id.
#[async_trait]
pub trait RemoteEntry: Searchable + Clone + Send + Sync + Sized {
    const LOAD_FALLBACK: &'static str;
    const DETAIL_FALLBACK: &'static str;

    fn id(&self) -> i64;
    async fn fetch_all(client: &DictionaryClient) -> Result<Vec<Self>, ClientError>;
    async fn fetch_one(client: &DictionaryClient, id: i64) -> Result<Self, ClientError>;
}

#[async_trait]
impl RemoteEntry for Word {
    const LOAD_FALLBACK: &'static str = "Failed to load words.";
    const DETAIL_FALLBACK: &'static str = "Failed to load word details.";

    fn id(&self) -> i64 {
        self.id
    }

    async fn fetch_all(client: &DictionaryClient) -> Result<Vec<Self>, ClientError> {
        client.list_words().await
    }

    async fn fetch_one(client: &DictionaryClient, id: i64) -> Result<Self, ClientError> {
        client.get_word(id).await
    }
}

#[async_trait]
impl RemoteEntry for Expression {
    const LOAD_FALLBACK: &'static str = "Failed to load expressions.";
    const DETAIL_FALLBACK: &'static str = "Failed to load expression details.";

    fn id(&self) -> i64 {
        self.id
    }

    async fn fetch_all(client: &DictionaryClient) -> Result<Vec<Self>, ClientError> {
        client.list_expressions().await
    }

    async fn fetch_one(client: &DictionaryClient, id: i64) -> Result<Self, ClientError> {
        client.get_expression(id).await
    }
}

fn error_text(err: &ClientError, fallback: &str) -> String {
    let text = err.to_string();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

/// Swap the entry with the same id, if present.
pub fn replace_entry<T: RemoteEntry>(entries: &mut [T], updated: &T) {
    for entry in entries.iter_mut().filter(|e| e.id() == updated.id()) {
        *entry = updated.clone();
    }
}

/// Error/success messages and the in-flight flag for one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormStatus {
    pub error: Option<String>,
    pub success: Option<String>,
    pub submitting: bool,
}

impl FormStatus {
    fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.success = None;
        self.submitting = false;
    }

    fn succeed(&mut self, message: &str) {
        self.error = None;
        self.success = Some(message.to_string());
        self.submitting = false;
    }

    fn begin(&mut self) {
        self.error = None;
        self.success = None;
        self.submitting = true;
    }

    /// Editing any field clears stale messages.
    pub fn clear(&mut self) {
        self.error = None;
        self.success = None;
    }
}

// ============================================================================
// List views
// ============================================================================

/// A full list of one kind plus the entry open in the detail modal.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    pub entries: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<T>,
    pub detail_error: Option<String>,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            loading: false,
            error: None,
            selected: None,
            detail_error: None,
        }
    }
}

pub type BrowseView = ListView<Word>;
pub type ExpressionsView = ListView<Expression>;

impl<T: RemoteEntry> ListView<T> {
    pub async fn load(&mut self, client: &DictionaryClient) {
        self.loading = true;
        self.error = None;
        match T::fetch_all(client).await {
            Ok(entries) => self.entries = entries,
            Err(e) => self.error = Some(error_text(&e, T::LOAD_FALLBACK)),
        }
        self.loading = false;
    }

    /// Show the list copy immediately, then refresh it from the server.
    pub async fn open(&mut self, client: &DictionaryClient, entry: &T) {
        self.selected = Some(entry.clone());
        self.detail_error = None;
        match T::fetch_one(client, entry.id()).await {
            Ok(full) => self.selected = Some(full),
            Err(e) => self.detail_error = Some(error_text(&e, T::DETAIL_FALLBACK)),
        }
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.detail_error = None;
    }

    pub fn apply_update(&mut self, updated: &T) {
        replace_entry(&mut self.entries, updated);
        if self.selected.as_ref().is_some_and(|s| s.id() == updated.id()) {
            self.selected = Some(updated.clone());
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// One search tab: the fetched list, the query and its filtered view.
#[derive(Debug, Clone)]
pub struct SearchTab<T> {
    pub list: ListView<T>,
    pub query: String,
    pub filtered: Vec<T>,
}

impl<T> Default for SearchTab<T> {
    fn default() -> Self {
        Self {
            list: ListView::default(),
            query: String::new(),
            filtered: Vec::new(),
        }
    }
}

impl<T: RemoteEntry> SearchTab<T> {
    pub async fn load(&mut self, client: &DictionaryClient) {
        self.list.load(client).await;
        self.refilter();
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.refilter();
    }

    pub fn apply_update(&mut self, updated: &T) {
        self.list.apply_update(updated);
        replace_entry(&mut self.filtered, updated);
    }

    fn refilter(&mut self) {
        self.filtered = filter(&self.list.entries, &self.query);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Words,
    Expressions,
}

#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub mode: SearchMode,
    pub words: SearchTab<Word>,
    pub expressions: SearchTab<Expression>,
}

impl SearchView {
    pub async fn load(&mut self, client: &DictionaryClient) {
        self.words.load(client).await;
        self.expressions.load(client).await;
    }
}

// ============================================================================
// Add
// ============================================================================

const MISSING_AUTHOR: &str = "No user name found. Please set your name again.";

#[derive(Debug, Clone, Default)]
pub struct WordDraft {
    pub term: String,
    pub definition: String,
    pub examples: String,
    pub image: Option<MediaFile>,
    pub audio: Option<MediaFile>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionDraft {
    pub expression: String,
    pub meaning: String,
    pub examples: String,
    pub audio: Option<MediaFile>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddMode {
    #[default]
    Word,
    Expression,
}

/// The add screen: independent word and expression forms.
#[derive(Debug, Clone, Default)]
pub struct AddView {
    pub mode: AddMode,
    pub word: WordDraft,
    pub word_status: FormStatus,
    pub expression: ExpressionDraft,
    pub expression_status: FormStatus,
}

fn optional(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl AddView {
    /// Submit the word form. `created_by` comes from the session.
    pub async fn submit_word(
        &mut self,
        client: &DictionaryClient,
        created_by: Option<&str>,
    ) -> Option<Word> {
        let term = self.word.term.trim();
        let definition = self.word.definition.trim();
        if term.is_empty() || definition.is_empty() {
            self.word_status.fail("Term and definition are required.");
            return None;
        }
        let Some(created_by) = created_by.map(str::trim).filter(|n| !n.is_empty()) else {
            self.word_status.fail(MISSING_AUTHOR);
            return None;
        };

        let input = WordInput {
            term: term.to_string(),
            definition: definition.to_string(),
            examples: optional(&self.word.examples),
            created_by: created_by.to_string(),
            image: self.word.image.clone(),
            audio: self.word.audio.clone(),
            ..WordInput::default()
        };

        self.word_status.begin();
        match client.create_word(&input).await {
            Ok(word) => {
                self.word = WordDraft::default();
                self.word_status.succeed("Word saved successfully!");
                Some(word)
            }
            Err(e) => {
                self.word_status.fail(error_text(&e, "Failed to add word."));
                None
            }
        }
    }

    pub async fn submit_expression(
        &mut self,
        client: &DictionaryClient,
        created_by: Option<&str>,
    ) -> Option<Expression> {
        let expression = self.expression.expression.trim();
        let meaning = self.expression.meaning.trim();
        if expression.is_empty() || meaning.is_empty() {
            self.expression_status
                .fail("Expression and meaning are required.");
            return None;
        }
        let Some(created_by) = created_by.map(str::trim).filter(|n| !n.is_empty()) else {
            self.expression_status.fail(MISSING_AUTHOR);
            return None;
        };

        let input = ExpressionInput {
            expression: expression.to_string(),
            meaning: meaning.to_string(),
            examples: optional(&self.expression.examples),
            created_by: created_by.to_string(),
            audio: self.expression.audio.clone(),
            remove_audio: false,
        };

        self.expression_status.begin();
        match client.create_expression(&input).await {
            Ok(expression) => {
                self.expression = ExpressionDraft::default();
                self.expression_status
                    .succeed("Expression saved successfully!");
                Some(expression)
            }
            Err(e) => {
                self.expression_status
                    .fail(error_text(&e, "Failed to add expression."));
                None
            }
        }
    }
}

// ============================================================================
// Editors
// ============================================================================

/// Edit modal for one word.
#[derive(Debug, Clone)]
pub struct WordEditor {
    pub word: Word,
    pub term: String,
    pub definition: String,
    pub examples: String,
    pub image: Option<MediaFile>,
    pub audio: Option<MediaFile>,
    pub remove_image: bool,
    pub remove_audio: bool,
    pub status: FormStatus,
}

impl WordEditor {
    pub fn new(word: &Word) -> Self {
        Self {
            word: word.clone(),
            term: word.term.clone(),
            definition: word.definition.clone(),
            examples: word.examples.clone().unwrap_or_default(),
            image: None,
            audio: None,
            remove_image: false,
            remove_audio: false,
            status: FormStatus::default(),
        }
    }

    /// A newly chosen file cancels a pending removal of the same slot.
    pub fn choose_image(&mut self, file: MediaFile) {
        self.image = Some(file);
        self.remove_image = false;
        self.status.clear();
    }

    pub fn choose_audio(&mut self, file: MediaFile) {
        self.audio = Some(file);
        self.remove_audio = false;
        self.status.clear();
    }

    pub fn set_remove_image(&mut self, remove: bool) {
        self.remove_image = remove;
        self.status.clear();
    }

    pub fn set_remove_audio(&mut self, remove: bool) {
        self.remove_audio = remove;
        self.status.clear();
    }

    /// Save and return the updated word; callers push it into every list
    /// holding the entry.
    pub async fn save(&mut self, client: &DictionaryClient) -> Option<Word> {
        let term = self.term.trim();
        let definition = self.definition.trim();
        if term.is_empty() || definition.is_empty() {
            self.status.fail("Term and definition are required.");
            return None;
        }

        let input = WordInput {
            term: term.to_string(),
            definition: definition.to_string(),
            examples: optional(&self.examples),
            created_by: self.word.created_by.clone(),
            image: self.image.clone(),
            audio: self.audio.clone(),
            remove_image: self.remove_image,
            remove_audio: self.remove_audio,
        };

        self.status.begin();
        match client.update_word(self.word.id, &input).await {
            Ok(updated) => {
                *self = WordEditor::new(&updated);
                self.status.succeed("Word updated!");
                Some(updated)
            }
            Err(e) => {
                self.status.fail(error_text(&e, "Failed to update word."));
                None
            }
        }
    }
}

/// Edit modal for one expression.
#[derive(Debug, Clone)]
pub struct ExpressionEditor {
    pub expression: Expression,
    pub text: String,
    pub meaning: String,
    pub examples: String,
    pub audio: Option<MediaFile>,
    pub remove_audio: bool,
    pub status: FormStatus,
}

impl ExpressionEditor {
    pub fn new(expression: &Expression) -> Self {
        Self {
            expression: expression.clone(),
            text: expression.expression.clone(),
            meaning: expression.meaning.clone(),
            examples: expression.examples.clone().unwrap_or_default(),
            audio: None,
            remove_audio: false,
            status: FormStatus::default(),
        }
    }

    pub fn choose_audio(&mut self, file: MediaFile) {
        self.audio = Some(file);
        self.remove_audio = false;
        self.status.clear();
    }

    pub fn set_remove_audio(&mut self, remove: bool) {
        self.remove_audio = remove;
        self.status.clear();
    }

    pub async fn save(&mut self, client: &DictionaryClient) -> Option<Expression> {
        let text = self.text.trim();
        let meaning = self.meaning.trim();
        if text.is_empty() || meaning.is_empty() {
            self.status.fail("Expression and meaning are required.");
            return None;
        }

        let input = ExpressionInput {
            expression: text.to_string(),
            meaning: meaning.to_string(),
            examples: optional(&self.examples),
            created_by: self.expression.created_by.clone(),
            audio: self.audio.clone(),
            remove_audio: self.remove_audio,
        };

        self.status.begin();
        match client.update_expression(self.expression.id, &input).await {
            Ok(updated) => {
                *self = ExpressionEditor::new(&updated);
                self.status.succeed("Expression updated!");
                Some(updated)
            }
            Err(e) => {
                self.status
                    .fail(error_text(&e, "Failed to update expression."));
                None
            }
        }
    }
}
