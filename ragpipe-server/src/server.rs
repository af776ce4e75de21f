use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use ragpipe_eval::{EvalError, Evaluator};
use ragpipe_rag::{RagError, RagPipeline};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::protocol::{ApiResponse, AskRequest};

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub evaluator: Arc<Evaluator>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{context}: {source}")]
    Pipeline {
        context: &'static str,
        #[source]
        source: RagError,
    },

    #[error("{context}: {source}")]
    Evaluation {
        context: &'static str,
        #[source]
        source: EvalError,
    },

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    fn pipeline(context: &'static str) -> impl FnOnce(RagError) -> Self {
        move |source| Self::Pipeline { context, source }
    }

    fn evaluation(context: &'static str) -> impl FnOnce(EvalError) -> Self {
        move |source| Self::Evaluation { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => {
                error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ApiResponse::error(self.to_string()))).into_response()
    }
}

type ApiResult = Result<Json<ApiResponse>, ApiError>;

/// Build the API router over `state`.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/ask", post(ask))
        .route("/api/ask-direct", post(ask_direct))
        .route("/api/store", post(store))
        .route("/api/evaluation", get(evaluation_index))
        .route("/api/evaluation/retrieval", get(evaluation_retrieval))
        .route("/api/evaluation/generation", get(evaluation_generation))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve the API until Ctrl-C.
pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid host/port {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "ragpipe API listening");

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

fn query_from(payload: Result<Json<AskRequest>, JsonRejection>) -> Result<String, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?;
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    Ok(request.query)
}

fn data<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

async fn ping() -> Json<ApiResponse> {
    Json(ApiResponse::ok().with_message("ragpipe API is up"))
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult {
    let query = query_from(payload)?;
    let answer =
        state.pipeline.answer(&query).await.map_err(ApiError::pipeline("failed to answer"))?;

    Ok(Json(
        ApiResponse::ok()
            .with_data(data(&answer.contexts)?)
            .with_answer(answer.text)
            .with_query(query),
    ))
}

async fn ask_direct(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult {
    let query = query_from(payload)?;
    let answer = state
        .pipeline
        .answer_direct(&query)
        .await
        .map_err(ApiError::pipeline("failed to answer"))?;

    Ok(Json(ApiResponse::ok().with_answer(answer).with_query(query)))
}

/// Form field carrying the uploaded document.
const STORE_FIELD: &str = "file";

/// Pull the text of the `file` field out of a multipart upload.
async fn document_from(upload: Result<Multipart, MultipartRejection>) -> Result<String, ApiError> {
    let mut multipart =
        upload.map_err(|e| ApiError::BadRequest(format!("expected a multipart upload: {e}")))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read multipart field: {e}")))?
    {
        if field.name() != Some(STORE_FIELD) {
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read '{STORE_FIELD}': {e}")))?;
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest("document must not be empty".to_string()));
        }
        return Ok(text);
    }

    Err(ApiError::BadRequest(format!("missing form field '{STORE_FIELD}'")))
}

async fn store(
    State(state): State<AppState>,
    upload: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    let document = document_from(upload).await?;
    let report = state
        .pipeline
        .ingest(&document)
        .await
        .map_err(ApiError::pipeline("failed to store document"))?;

    Ok(Json(ApiResponse::ok().with_message("document stored").with_data(data(&report)?)))
}

async fn evaluation_index() -> Json<ApiResponse> {
    Json(ApiResponse::ok().with_message(
        "retrieval evaluation: GET /api/evaluation/retrieval; \
         generation evaluation: GET /api/evaluation/generation",
    ))
}

async fn evaluation_retrieval(State(state): State<AppState>) -> ApiResult {
    let result = state
        .evaluator
        .retrieval_report()
        .await
        .map_err(ApiError::evaluation("retrieval evaluation failed"))?;

    Ok(Json(ApiResponse::ok().with_data(data(result.as_ref())?)))
}

async fn evaluation_generation(State(state): State<AppState>) -> ApiResult {
    let result = state
        .evaluator
        .generation_report()
        .await
        .map_err(ApiError::evaluation("generation evaluation failed"))?;

    Ok(Json(ApiResponse::ok().with_data(data(result.as_ref())?)))
}
