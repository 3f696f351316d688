use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.uploads.body_limit();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/check-access", post(handlers::check_access))
        // Words
        .route(
            "/api/words",
            get(handlers::list_words).post(handlers::create_word),
        )
        .route("/api/words/by-term/:term", get(handlers::get_word_by_term))
        .route(
            "/api/words/:id",
            get(handlers::get_word).put(handlers::update_word),
        )
        .route("/api/words/:id/image", get(handlers::word_image))
        .route("/api/words/:id/audio", get(handlers::word_audio))
        // Expressions
        .route(
            "/api/expressions",
            get(handlers::list_expressions).post(handlers::create_expression),
        )
        .route(
            "/api/expressions/:id",
            get(handlers::get_expression).put(handlers::update_expression),
        )
        .route("/api/expressions/:id/audio", get(handlers::expression_audio))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&state.config.server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(
                origin,
                "CORS_ORIGIN is not a valid header value; cross-origin requests disabled"
            );
            layer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_state, TEST_ACCESS_CODE};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(&temp_dir));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Family dictionary backend is running.");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(&temp_dir));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/words")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_check_access_route() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(&temp_dir));

        let response = app
            .oneshot(
                Request::post("/api/check-access")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "accessCode": TEST_ACCESS_CODE }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
