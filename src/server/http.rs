use crate::state::AppState;
use crate::text_processor::analyze_text;
use crate::translation::TranslationClient;
use crate::utils::TranslatorError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

#[derive(Clone)]
pub struct HttpState {
    pub app: AppState,
    pub client: Option<TranslationClient>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/languages", get(languages))
        .route("/analyze", post(analyze))
        .route("/translate", post(translate))
        .route("/progress", get(progress))
        .route("/cancel", post(cancel))
        .route("/result", get(result))
        .with_state(state)
}

pub async fn serve(state: HttpState, bind_addr: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind_addr, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("HTTP server listening on http://{}", addr);
    tracing::info!("  GET  /health     - Health check");
    tracing::info!("  GET  /languages  - Supported target languages");
    tracing::info!("  POST /analyze    - Analyze a document");
    tracing::info!("  POST /translate  - Start a translation job");
    tracing::info!("  GET  /progress   - Current job progress");
    tracing::info!("  POST /cancel     - Cancel the running job");
    tracing::info!("  GET  /result     - Last finished job");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "longform-translator",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn info(State(state): State<HttpState>) -> impl IntoResponse {
    let chunking = &state.app.config.chunking;
    Json(serde_json::json!({
        "name": state.app.config.server.name,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Chunked long-form translation coordinator - HTTP Mode",
        "limits": {
            "max_document_words": chunking.max_document_words,
            "max_chunk_size": chunking.max_chunk_size,
            "overlap_size": chunking.overlap_size,
            "context_size": chunking.context_size,
            "concurrency_limit": state.app.config.scheduler.concurrency_limit
        }
    }))
}

async fn languages(State(state): State<HttpState>) -> Response {
    let Some(client) = state.client.as_ref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "No translation service configured",
        );
    };

    match client.fetch_languages().await {
        Ok(catalog) => Json(catalog).into_response(),
        Err(e) => translator_error_response(e),
    }
}

async fn analyze(State(state): State<HttpState>, Json(payload): Json<AnalyzeRequest>) -> Response {
    Json(analyze_text(&payload.text, &state.app.config.chunking)).into_response()
}

async fn translate(
    State(state): State<HttpState>,
    Json(payload): Json<TranslateRequest>,
) -> Response {
    let catalog = match state.client.as_ref() {
        Some(client) => match client.fetch_languages().await {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch language catalog, skipping validation");
                None
            }
        },
        None => None,
    };

    match state
        .app
        .start_translation(&payload.text, &payload.target_language, catalog.as_ref())
        .await
    {
        Ok(handle) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "job_id": handle.job_id,
                "status": "running"
            })),
        )
            .into_response(),
        Err(e) => translator_error_response(e),
    }
}

async fn progress(State(state): State<HttpState>) -> Response {
    match state.app.jobs.snapshot().await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "No translation job has been started"),
    }
}

async fn cancel(State(state): State<HttpState>) -> Response {
    match state.app.jobs.cancel().await {
        Ok(job_id) => Json(serde_json::json!({
            "job_id": job_id,
            "status": "cancelling"
        }))
        .into_response(),
        Err(e) => translator_error_response(e),
    }
}

async fn result(State(state): State<HttpState>) -> Response {
    if state.app.jobs.is_running().await {
        return error_response(StatusCode::CONFLICT, "Translation still running");
    }

    match state.app.jobs.result().await {
        Some(result) => Json(result).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "No finished translation job"),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn translator_error_response(e: TranslatorError) -> Response {
    let status = match &e {
        TranslatorError::JobAlreadyRunning(_) => StatusCode::CONFLICT,
        TranslatorError::JobNotFound => StatusCode::NOT_FOUND,
        TranslatorError::InputTooLarge { .. }
        | TranslatorError::EmptyInputError
        | TranslatorError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
        TranslatorError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::BAD_GATEWAY,
    };
    error_response(status, &e.to_string())
}
