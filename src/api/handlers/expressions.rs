use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use std::sync::Arc;

use super::media::media_response;
use super::{parse_id, store_failure};
use crate::api::form::EntryForm;
use crate::api::projection::{Expression, ExpressionSaved};
use crate::api::response::ApiError;
use crate::storage::models::{ExpressionUpdate, MediaSlot, NewExpression, Patch};
use crate::AppState;

pub async fn list_expressions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Expression>>, ApiError> {
    let expressions = state
        .store
        .list_expressions()
        .await
        .map_err(store_failure("Failed to fetch expressions"))?;

    Ok(Json(expressions.iter().map(Expression::from).collect()))
}

pub async fn get_expression(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Expression>, ApiError> {
    let id = parse_id(&id, "expression")?;

    let expression = state
        .store
        .get_expression(id)
        .await
        .map_err(store_failure("Failed to fetch expression"))?
        .ok_or_else(|| ApiError::not_found("Expression not found"))?;

    Ok(Json(Expression::from(&expression)))
}

pub async fn create_expression(
    State(state): State<Arc<AppState>>,
    form: EntryForm,
) -> Result<(StatusCode, Json<ExpressionSaved>), ApiError> {
    let expression = form.text("expression");
    let meaning = form.text("meaning");
    let created_by = form.text("created_by");

    if expression.is_empty() || meaning.is_empty() || created_by.is_empty() {
        return Err(
            ApiError::bad_request("expression, meaning and created_by are required").rejected(),
        );
    }

    let examples = form.optional_text("examples");

    // Expressions have no image slot; an image part is ignored.
    let audio = form
        .audio
        .map(|upload| upload.into_media(MediaSlot::Audio))
        .transpose()
        .map_err(ApiError::rejected)?;

    let record = state
        .store
        .insert_expression(NewExpression {
            expression,
            meaning,
            examples,
            created_by,
            audio,
        })
        .await
        .map_err(|e| store_failure("Failed to add expression")(e).rejected())?;

    tracing::debug!(expression_id = record.id, "Created expression");

    Ok((
        StatusCode::CREATED,
        Json(ExpressionSaved {
            ok: true,
            expression: Expression::from(&record),
        }),
    ))
}

pub async fn update_expression(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    form: EntryForm,
) -> Result<Json<ExpressionSaved>, ApiError> {
    let id = parse_id(&id, "expression").map_err(ApiError::rejected)?;

    let expression = form.text("expression");
    let meaning = form.text("meaning");
    if expression.is_empty() || meaning.is_empty() {
        return Err(ApiError::bad_request("expression and meaning are required").rejected());
    }

    let examples = form.optional_text("examples");
    let audio = form
        .audio
        .map(|upload| upload.into_media(MediaSlot::Audio))
        .transpose()
        .map_err(ApiError::rejected)?;

    let update = ExpressionUpdate {
        expression,
        meaning,
        examples,
        audio: Patch::from_upload(audio, form.remove_audio),
    };

    let record = state
        .store
        .update_expression(id, update)
        .await
        .map_err(|e| store_failure("Failed to update expression")(e).rejected())?
        .ok_or_else(|| ApiError::not_found("Expression not found").rejected())?;

    tracing::debug!(expression_id = id, "Updated expression");

    Ok(Json(ExpressionSaved {
        ok: true,
        expression: Expression::from(&record),
    }))
}

pub async fn expression_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, "expression")?;

    let media = state
        .store
        .expression_audio(id)
        .await
        .map_err(store_failure("Failed to fetch media"))?
        .ok_or_else(|| ApiError::not_found("No audio for this expression"))?;

    Ok(media_response(media))
}
