//! HTTP surface
//!
//! - `POST /ask`: `{"question"}` → `{"answer"}`; pipeline failures → 500 `{"detail"}`
//! - `GET /health`: liveness only

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use finqa_core::Orchestrator;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{instrument, warn, Level};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/health", get(health_check))
        .with_state(AppState { orchestrator })
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, Json<ErrorResponse>)> {
    let started = Instant::now();

    match state.orchestrator.answer(&req.question).await {
        Ok(answer) => {
            crate::log_event!(
                level: Level::INFO,
                event: "question_answered",
                duration_ms: started.elapsed().as_millis(),
                answer_chars: answer.len()
            );
            Ok(Json(AskResponse { answer }))
        }
        Err(e) => {
            warn!(error = %e, duration_ms = started.elapsed().as_millis() as u64, "Question failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: e.to_string(),
                }),
            ))
        }
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
