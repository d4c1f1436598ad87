//! HTTP API over a [`ChatSession`].
//!
//! ## Endpoints
//!
//! - `POST /predict`: classify `{"message": ...}`, record it and reply
//! - `GET /stats`: transition matrix, statistics and recommendations
//! - `GET /generate_clusters`: render the cluster plot
//! - `GET /export?format=json|csv`: download the conversation
//! - `GET /history`: list recorded messages
//!
//! Errors are `{"error": "..."}` with 400 for bad input or an empty
//! conversation and 500 otherwise.

use crate::clusters::ClusterReport;
use crate::config::ServerConfig;
use crate::error::{ErrorKind, SentioError};
use crate::export::{self, ExportFormat};
use crate::session::ChatSession;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub message: String,
}

/// Query string of `GET /export`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// [`SentioError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(SentioError);

impl From<SentioError> for ApiError {
    fn from(e: SentioError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self(SentioError::InvalidInput(message.to_owned()))
    }

    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidInput | ErrorKind::NoData => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            SentioError::InvalidInput(m) | SentioError::NoData(m) => m.clone(),
            other => format!("Internal server error: {other}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        } else {
            warn!("request rejected: {}", self.0);
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ---------------------------------------------------------------------------
// ChatServer
// ---------------------------------------------------------------------------

/// The HTTP server, serving on a background tokio task.
pub struct ChatServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

/// Build the API router for `session`.
pub fn router(session: Arc<ChatSession>) -> Router {
    Router::new()
        .route("/predict", post(handle_predict))
        .route("/stats", get(handle_stats))
        .route("/generate_clusters", get(handle_clusters))
        .route("/export", get(handle_export))
        .route("/history", get(handle_history))
        .fallback(handle_not_found)
        .with_state(session)
}

impl ChatServer {
    /// Start serving `session`.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign)
    /// and begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(
        session: Arc<ChatSession>,
        config: &ServerConfig,
    ) -> crate::error::Result<Self> {
        let app = router(session);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        let addr = listener.local_addr()?;

        info!("sentio API listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("sentio API server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ChatServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// Run blocking session work off the async runtime.
async fn blocking<T, F>(session: Arc<ChatSession>, f: F) -> ApiResult<T>
where
    F: FnOnce(&ChatSession) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&session))
        .await
        .map_err(|e| SentioError::Internal(format!("background task failed: {e}")))?
        .map_err(ApiError::from)
}

/// `POST /predict`
async fn handle_predict(
    State(session): State<Arc<ChatSession>>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request("No JSON data provided"))?;
    if is_empty_payload(&value) {
        return Err(ApiError::bad_request("No JSON data provided"));
    }
    let request: PredictRequest = serde_json::from_value(value)
        .map_err(|_| ApiError::bad_request("Message field missing or empty"))?;
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message field missing or empty"));
    }

    let turn = blocking(session, move |s| s.predict(&request.message)).await?;
    Ok(Json(json!({
        "predicted_emotion": turn.prediction.label,
        "bot_reply": turn.reply,
        "transition_probs": turn.transitions,
        "emotion_statistics": turn.statistics,
        "confidence": turn.prediction.confidence(),
    })))
}

/// `null`, `false`, `0`, `""`, `[]` and `{}` carry no request.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// `GET /stats`
async fn handle_stats(State(session): State<Arc<ChatSession>>) -> ApiResult<Json<Value>> {
    let report = session.stats_report()?;
    Ok(Json(serde_json::to_value(report).map_err(SentioError::from)?))
}

/// `GET /generate_clusters`
async fn handle_clusters(State(session): State<Arc<ChatSession>>) -> ApiResult<Json<Value>> {
    let report = blocking(session, |s| s.generate_clusters()).await?;
    let body = match &report {
        ClusterReport::Generated { path, .. } => json!({
            "cluster_image": path.display().to_string(),
            "message": report.message(),
        }),
        ClusterReport::NotEnoughData { .. } => json!({ "message": report.message() }),
    };
    Ok(Json(body))
}

/// `GET /export?format=json|csv`
async fn handle_export(
    State(session): State<Arc<ChatSession>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let format = match query.format.as_deref() {
        Some(f) => f.parse::<ExportFormat>()?,
        None => ExportFormat::Json,
    };
    let snapshot = session.snapshot()?;
    let body = export::export(&snapshot, format)?;

    let disposition = format!("attachment; filename={}", format.file_name());
    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_owned()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    match format {
        ExportFormat::Csv => Ok((StatusCode::OK, headers, body).into_response()),
        ExportFormat::Json => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, format.content_type().to_owned())],
            body,
        )
            .into_response()),
    }
}

/// `GET /history`
async fn handle_history(State(session): State<Arc<ChatSession>>) -> ApiResult<Json<Value>> {
    let history = session.history()?;
    Ok(Json(json!({ "history": history })))
}

async fn handle_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
}
