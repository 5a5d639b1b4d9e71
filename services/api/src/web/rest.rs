//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::report;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use chrono::Utc;
use exam_record_core::domain::{ExamDocument, ExamResult, ExamSession};
use exam_record_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        init_exam_handler,
        update_exam_handler,
        get_last_exam_handler,
        get_result_handler,
        get_last_exam_global_handler,
        last_exam_pdf_handler,
    ),
    components(
        schemas(InitExamRequest, InitExamResponse, UpdateExamRequest, MessageResponse)
    ),
    tags(
        (name = "Exam Record API", description = "API endpoints for the exam-session tracking service.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct InitExamRequest {
    pub email: String,
    pub exam_id: String,
}

/// The response payload sent after successfully initiating an exam session.
#[derive(Serialize, ToSchema)]
pub struct InitExamResponse {
    session_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateExamRequest {
    pub email: String,
    pub exam_id: String,
    pub score: f64,
    pub cheat_score: f64,
    pub passed: bool,
    /// Open-ended key-value payload; stored as-is.
    #[schema(value_type = Option<Object>)]
    pub details: Option<Map<String, Value>>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
pub struct ResultQuery {
    email: Option<String>,
}

/// Maps a store failure onto an HTTP response: missing records surface as
/// 404, anything else is logged and collapsed to a 500.
fn store_error(action: &'static str) -> impl FnOnce(PortError) -> (StatusCode, String) {
    move |e| match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        other => {
            error!("Failed to {}: {:?}", action, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running")
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Exam Record Service is running";
    Json(serde_json::json!({
        "status": "success",
        "message": MESSAGE
    }))
}

/// Start a new exam session.
///
/// Always succeeds: repeated calls for the same pair create further sessions
/// with their own timestamps, without any deduplication.
#[utoipa::path(
    post,
    path = "/init_exam",
    request_body = InitExamRequest,
    responses(
        (status = 200, description = "Session created", body = InitExamResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn init_exam_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitExamRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let timestamp = Utc::now().timestamp();
    let session = ExamSession::begin(req.email, req.exam_id, timestamp);
    let session_id = session.session_id.clone();

    state
        .store
        .insert_session(&session)
        .await
        .map_err(store_error("initialize the exam session"))?;

    Ok(Json(InitExamResponse { session_id }))
}

/// Apply a result to every session matching the (email, exam_id) pair.
#[utoipa::path(
    post,
    path = "/update_exam",
    request_body = UpdateExamRequest,
    responses(
        (status = 200, description = "Exam updated", body = MessageResponse),
        (status = 404, description = "No session exists for the pair"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_exam_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = ExamResult {
        email: req.email,
        exam_id: req.exam_id,
        score: req.score,
        cheat_score: req.cheat_score,
        passed: req.passed,
        details: req.details,
    };

    state
        .store
        .apply_result(&result)
        .await
        .map_err(store_error("update the exam"))?;

    Ok(Json(MessageResponse {
        message: "Exam updated".to_string(),
    }))
}

/// The most recent exam document for one user.
#[utoipa::path(
    get,
    path = "/get_last_exam/{email}",
    params(
        ("email" = String, Path, description = "The user's email address.")
    ),
    responses(
        (status = 200, description = "The user's most recent exam document", body = serde_json::Value),
        (status = 404, description = "The user has no exam documents")
    )
)]
pub async fn get_last_exam_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let exam = state
        .store
        .last_exam_for_email(&email)
        .await
        .map_err(store_error("fetch the last exam"))?;

    Ok(Json(exam))
}

/// Every exam document for one user.
///
/// Deliberately never a 404: an unknown (or absent) email yields the empty
/// list, so callers must treat "found nothing" as data, not as an error.
#[utoipa::path(
    get,
    path = "/get_result",
    params(
        ("email" = Option<String>, Query, description = "The user's email address.")
    ),
    responses(
        (status = 200, description = "All matching exam documents, possibly empty", body = Vec<serde_json::Value>)
    )
)]
pub async fn get_result_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResultQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let documents: Vec<ExamDocument> = match query.email {
        Some(email) => state
            .store
            .find_by_email(&email)
            .await
            .map_err(store_error("fetch the exam results"))?,
        None => Vec::new(),
    };

    Ok(Json(documents))
}

/// The most recent exam document across all users.
#[utoipa::path(
    get,
    path = "/get_last_exam_global",
    responses(
        (status = 200, description = "The most recent exam document", body = serde_json::Value),
        (status = 404, description = "The store is empty")
    )
)]
pub async fn get_last_exam_global_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let exam = state
        .store
        .last_exam_global()
        .await
        .map_err(store_error("fetch the last exam"))?;

    Ok(Json(exam))
}

/// The most recent exam, rendered as a PDF report.
#[utoipa::path(
    get,
    path = "/last-exam-pdf",
    responses(
        (status = 200, description = "The rendered report", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "The store is empty"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn last_exam_pdf_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let exam = state
        .store
        .last_exam_global()
        .await
        .map_err(store_error("fetch the last exam"))?;

    let pdf = report::render_exam_report(&exam).map_err(|e| {
        error!("Failed to render the exam report: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to render the exam report".to_string(),
        )
    })?;

    Ok((
        [(header::CONTENT_TYPE, "application/pdf")],
        Bytes::from(pdf),
    ))
}
