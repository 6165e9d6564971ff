use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::QuizError;
use crate::metrics;
use crate::models::quiz::{
    CreateQuizRequest, DeleteQuizResponse, Quiz, QuizSummary, UpdateQuizRequest,
};
use crate::services::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    question_index: Option<usize>,
}

fn error_response(status: StatusCode, error: &'static str, message: String) -> Response {
    error_response_at(status, error, message, None)
}

fn error_response_at(
    status: StatusCode,
    error: &'static str,
    message: String,
    question_index: Option<usize>,
) -> Response {
    let body = ErrorBody {
        status_code: status.as_u16(),
        error,
        message,
        question_index,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = match &self {
            QuizError::NotFound => StatusCode::NOT_FOUND,
            QuizError::CorruptRecord { .. } | QuizError::Storage(_) => {
                tracing::error!(error = ?self, "Quiz operation failed");
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    self.kind(),
                    "internal server error".to_string(),
                );
            }
            _ => StatusCode::BAD_REQUEST,
        };
        let question_index = match &self {
            QuizError::InvalidQuestion { index, .. } => Some(*index),
            _ => None,
        };
        error_response_at(status, self.kind(), self.to_string(), question_index)
    }
}

/// Malformed or non-JSON bodies are structural rejections.
fn body_rejection(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection, "Rejected quiz request body");
    metrics::record_quiz_operation("parse", "structural");
    error_response(StatusCode::BAD_REQUEST, "structural", rejection.body_text())
}

/// Records the outcome of a quiz operation in metrics and logs.
fn observe<T>(operation: &'static str, result: Result<T, QuizError>) -> Result<T, QuizError> {
    match &result {
        Ok(_) => metrics::record_quiz_operation(operation, "ok"),
        Err(err) => {
            metrics::record_quiz_operation(operation, err.kind());
            if let QuizError::InvalidQuestion { index, rejection } = err {
                metrics::record_question_rejection(rejection.reason());
                tracing::info!(operation, index, reason = rejection.reason(), "Question rejected");
            } else if err.is_rejection() {
                tracing::info!(operation, error = %err, "Quiz request rejected");
            }
        }
    }
    result
}

/// POST /quizzes
pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateQuizRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Quiz>), Response> {
    let Json(payload) = payload.map_err(body_rejection)?;

    let quiz = observe(
        "create",
        state
            .quizzes
            .create(payload.title.as_deref(), &payload.questions)
            .await,
    )
    .map_err(IntoResponse::into_response)?;

    tracing::info!(quiz_id = %quiz.id, questions = quiz.questions.len(), "Quiz created");
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// GET /quizzes
pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<QuizSummary>>, QuizError> {
    let summaries = observe("find_all", state.quizzes.find_all().await)?;
    Ok(Json(summaries))
}

/// GET /quizzes/{id}
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Quiz>, QuizError> {
    let quiz = observe("find_one", state.quizzes.find_one(&id).await)?;
    Ok(Json(quiz))
}

/// PATCH /quizzes/{id}
pub async fn update_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateQuizRequest>, JsonRejection>,
) -> Result<Json<Quiz>, Response> {
    let Json(payload) = payload.map_err(body_rejection)?;

    let quiz = observe(
        "update",
        state
            .quizzes
            .update(&id, payload.title.as_deref(), payload.questions.as_ref())
            .await,
    )
    .map_err(IntoResponse::into_response)?;

    tracing::info!(quiz_id = %quiz.id, "Quiz updated");
    Ok(Json(quiz))
}

/// DELETE /quizzes/{id}
pub async fn delete_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteQuizResponse>, QuizError> {
    observe("remove", state.quizzes.remove(&id).await)?;

    tracing::info!(quiz_id = %id, "Quiz deleted");
    Ok(Json(DeleteQuizResponse { success: true }))
}
