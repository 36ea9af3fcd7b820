use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use crate::classifier::{EmotionClassifier, EmotionScore};
use crate::config::RequestLimits;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<EmotionClassifier>,
    pub limits: RequestLimits,
}

impl AppState {
    pub fn new(classifier: EmotionClassifier, limits: RequestLimits) -> Self {
        Self {
            classifier: Arc::new(classifier),
            limits,
        }
    }
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub num_labels: usize,
    pub num_features: usize,
    pub top_k: usize,
    pub labels: Vec<String>,
}

/// Errors returned to HTTP clients as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// JSON bytes allowed around the text in a `/predict` body.
const BODY_OVERHEAD_BYTES: usize = 1024;

/// Largest request body accepted for the given limits.
///
/// A character takes at most 6 bytes in a JSON string (`\uXXXX`), so any
/// body holding `max_text_chars` characters fits.
pub fn body_limit(limits: &RequestLimits) -> usize {
    limits
        .max_text_chars
        .saturating_mul(6)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

pub fn create_app(state: AppState) -> Router {
    let limit = body_limit(&state.limits);
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Serves the app on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(state);
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Vec<EmotionScore>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected prediction request: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    validate_text(&request.text, &state.limits)?;

    let start = Instant::now();
    let text_len = request.text.len();
    let classifier = Arc::clone(&state.classifier);
    let top_k = state.limits.top_k;

    let results = tokio::task::spawn_blocking(move || classifier.predict_top_k(&request.text, top_k))
        .await
        .map_err(|e| {
            error!("Prediction task failed: {}", e);
            ApiError::Internal("Prediction task failed".to_string())
        })?
        .map_err(|e| {
            error!("Prediction failed: {}", e);
            ApiError::Internal(e.to_string())
        })?;

    debug!(
        "Predicted {:?} for {} bytes in {:.2?}",
        results.first().map(|s| s.emotion.as_str()),
        text_len,
        start.elapsed()
    );
    Ok(Json(results))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let info = state.classifier.info();
    Json(HealthResponse {
        status: "ok".to_string(),
        num_labels: info.num_labels,
        num_features: info.num_features,
        top_k: state.limits.top_k,
        labels: info.labels,
    })
}

fn validate_text(text: &str, limits: &RequestLimits) -> Result<(), ApiError> {
    if text.is_empty() {
        warn!("Rejected prediction request: empty text");
        return Err(ApiError::BadRequest("Field `text` cannot be empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > limits.max_text_chars {
        warn!("Rejected prediction request: {} characters", chars);
        return Err(ApiError::PayloadTooLarge(format!(
            "Field `text` is too long ({} characters, max is {})",
            chars, limits.max_text_chars
        )));
    }
    Ok(())
}
