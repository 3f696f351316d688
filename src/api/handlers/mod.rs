mod access;
mod admin;
mod expressions;
mod media;
mod words;

use crate::api::response::ApiError;
use crate::storage::StoreError;

pub use access::check_access;
pub use admin::health;
pub use expressions::{
    create_expression, expression_audio, get_expression, list_expressions, update_expression,
};
pub use words::{
    create_word, get_word, get_word_by_term, list_words, update_word, word_audio, word_image,
};

/// Map a StoreError to a generic 500. The cause is logged, never returned.
fn store_failure(message: &'static str) -> impl Fn(StoreError) -> ApiError {
    move |e| {
        tracing::error!(error = %e, "{message}");
        ApiError::internal(message)
    }
}

/// Parse a path id. Anything but a positive integer is a 400.
fn parse_id(raw: &str, kind: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid {kind} id")))
}
