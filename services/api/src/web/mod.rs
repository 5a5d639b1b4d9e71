pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Builds the service router. Exposed from the library so integration tests
/// can drive the exact routes the binary serves.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(rest::health_handler))
        .route("/init_exam", post(rest::init_exam_handler))
        .route("/update_exam", post(rest::update_exam_handler))
        .route("/get_last_exam/{email}", get(rest::get_last_exam_handler))
        .route("/get_result", get(rest::get_result_handler))
        .route(
            "/get_last_exam_global",
            get(rest::get_last_exam_global_handler),
        )
        .route("/last-exam-pdf", get(rest::last_exam_pdf_handler))
        .with_state(state)
}
