use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use std::sync::Arc;

use super::media::media_response;
use super::{parse_id, store_failure};
use crate::api::form::EntryForm;
use crate::api::projection::{Word, WordSaved};
use crate::api::response::ApiError;
use crate::storage::models::{MediaSlot, NewWord, Patch, WordUpdate};
use crate::AppState;

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_words(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Word>>, ApiError> {
    let words = state
        .store
        .list_words()
        .await
        .map_err(store_failure("Failed to fetch words"))?;

    Ok(Json(words.iter().map(Word::from).collect()))
}

pub async fn get_word(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Word>, ApiError> {
    let id = parse_id(&id, "word")?;

    let word = state
        .store
        .get_word(id)
        .await
        .map_err(store_failure("Failed to fetch word"))?
        .ok_or_else(|| ApiError::not_found("Word not found"))?;

    Ok(Json(Word::from(&word)))
}

pub async fn get_word_by_term(
    State(state): State<Arc<AppState>>,
    Path(term): Path<String>,
) -> Result<Json<Word>, ApiError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(ApiError::bad_request("term is required"));
    }

    let word = state
        .store
        .find_word_by_term(term)
        .await
        .map_err(store_failure("Failed to fetch word"))?
        .ok_or_else(|| ApiError::not_found("Word not found"))?;

    Ok(Json(Word::from(&word)))
}

pub async fn create_word(
    State(state): State<Arc<AppState>>,
    form: EntryForm,
) -> Result<(StatusCode, Json<WordSaved>), ApiError> {
    let term = form.text("term");
    let definition = form.text("definition");
    let created_by = form.text("created_by");

    if term.is_empty() || definition.is_empty() || created_by.is_empty() {
        return Err(
            ApiError::bad_request("term, definition and created_by are required").rejected(),
        );
    }

    let examples = form.optional_text("examples");
    let image = form
        .image
        .map(|upload| upload.into_media(MediaSlot::Image))
        .transpose()
        .map_err(ApiError::rejected)?;
    let audio = form
        .audio
        .map(|upload| upload.into_media(MediaSlot::Audio))
        .transpose()
        .map_err(ApiError::rejected)?;

    let record = state
        .store
        .insert_word(NewWord {
            term,
            definition,
            examples,
            created_by,
            image,
            audio,
        })
        .await
        .map_err(|e| store_failure("Failed to add word")(e).rejected())?;

    tracing::debug!(word_id = record.id, term = %record.term, "Created word");

    Ok((
        StatusCode::CREATED,
        Json(WordSaved {
            ok: true,
            word: Word::from(&record),
        }),
    ))
}

pub async fn update_word(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    form: EntryForm,
) -> Result<Json<WordSaved>, ApiError> {
    let id = parse_id(&id, "word").map_err(ApiError::rejected)?;

    let term = form.text("term");
    let definition = form.text("definition");
    if term.is_empty() || definition.is_empty() {
        return Err(ApiError::bad_request("term and definition are required").rejected());
    }

    let examples = form.optional_text("examples");
    let image = form
        .image
        .map(|upload| upload.into_media(MediaSlot::Image))
        .transpose()
        .map_err(ApiError::rejected)?;
    let audio = form
        .audio
        .map(|upload| upload.into_media(MediaSlot::Audio))
        .transpose()
        .map_err(ApiError::rejected)?;

    let update = WordUpdate {
        term,
        definition,
        examples,
        image: Patch::from_upload(image, form.remove_image),
        audio: Patch::from_upload(audio, form.remove_audio),
    };

    let record = state
        .store
        .update_word(id, update)
        .await
        .map_err(|e| store_failure("Failed to update word")(e).rejected())?
        .ok_or_else(|| ApiError::not_found("Word not found").rejected())?;

    tracing::debug!(word_id = id, "Updated word");

    Ok(Json(WordSaved {
        ok: true,
        word: Word::from(&record),
    }))
}

pub async fn word_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    word_media(&state, &id, MediaSlot::Image).await
}

pub async fn word_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    word_media(&state, &id, MediaSlot::Audio).await
}

// ============================================================================
// Helpers
// ============================================================================

async fn word_media(state: &AppState, id: &str, slot: MediaSlot) -> Result<Response, ApiError> {
    let id = parse_id(id, "word")?;

    let media = state
        .store
        .word_media(id, slot)
        .await
        .map_err(store_failure("Failed to fetch media"))?
        .ok_or_else(|| ApiError::not_found(format!("No {} for this word", slot.as_str())))?;

    Ok(media_response(media))
}
