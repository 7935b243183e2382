//! HTTP front end (axum).
//!
//! | Method | Path | |
//! |--------|------|---|
//! | `GET`  | `/`              | landing page |
//! | `GET`  | `/upload`        | file conversion form |
//! | `GET`  | `/qr-converter`  | QR code form |
//! | `GET`  | `/api/health`    | liveness probe |
//! | `POST` | `/api/convert?type=<KIND>` | multipart upload, responds with the artifact |
//!
//! `/api/convert` reads every `file` field and an optional `logo` field.
//! Failures are JSON `{"error": "..."}` with status 400 for bad requests
//! and 500 for conversion failures.

use crate::config::ServiceConfig;
use crate::convert::convert;
use crate::error::ConvertError;
use crate::kind::ConversionKind;
use crate::output::ConversionOutput;
use crate::pipeline::{engine, office};
use crate::qr::LogoOutcome;
use crate::upload::UploadedFile;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

const INDEX_HTML: &str = include_str!("../assets/index.html");
const UPLOAD_HTML: &str = include_str!("../assets/upload.html");
const QR_HTML: &str = include_str!("../assets/qr.html");

/// Response header reporting what happened to a QR logo.
pub const QR_LOGO_HEADER: HeaderName = HeaderName::from_static("x-qr-logo");

/// Headroom over `max_upload_bytes` for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Build the application router.
pub fn router(config: Arc<ServiceConfig>) -> Router {
    let body_limit = config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/upload", get(|| async { Html(UPLOAD_HTML) }))
        .route("/qr-converter", get(|| async { Html(QR_HTML) }))
        .route("/api/health", get(health_check))
        .route("/api/convert", post(convert_handler))
        .with_state(AppState { config })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(config: ServiceConfig, addr: SocketAddr) -> Result<(), ConvertError> {
    config.ensure_dirs()?;
    report_backends(&config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Listening on http://{} (uploads: {}, outputs: {})",
        listener.local_addr()?,
        config.upload_dir.display(),
        config.output_dir.display()
    );
    axum::serve(listener, router(Arc::new(config)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Warn at startup about conversions whose native backend is missing.
fn report_backends(config: &ServiceConfig) {
    let unavailable = |pred: fn(&ConversionKind) -> bool| {
        ConversionKind::ALL
            .iter()
            .filter(|k| pred(k))
            .map(ConversionKind::label)
            .collect::<Vec<_>>()
            .join(", ")
    };
    if !engine::is_available(config) {
        warn!(
            "pdfium library not found; these conversions will fail: {}",
            unavailable(ConversionKind::needs_pdfium)
        );
    }
    if !office::is_available(config) {
        warn!(
            "'{}' not runnable; these conversions will fail: {}",
            config.office_binary,
            unavailable(|k| matches!(k, ConversionKind::OfficeToPdf(_)))
        );
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ── /api/convert ─────────────────────────────────────────────────────────

async fn convert_handler(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::BadRequest("No file part".into()));
    };

    let mut files = Vec::new();
    let mut logo = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field.bytes().await?;
                files.push(UploadedFile::new(file_name, bytes.to_vec()));
            }
            "logo" => {
                let bytes = field.bytes().await?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    logo = Some(UploadedFile::new(file_name, bytes.to_vec()));
                }
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    match files.first() {
        None => return Err(ApiError::BadRequest("No file part".into())),
        Some(f) if f.file_name.is_empty() => return Err(ConvertError::NoInput.into()),
        Some(_) => {}
    }
    files.retain(|f| !f.file_name.is_empty());

    let kind: ConversionKind = query.kind.parse()?;
    let output = convert(kind, &files, logo.as_ref(), &state.config).await?;
    if output.logo_failed() {
        warn!("Serving {} without its logo", output.file_name);
    }
    let body = read_output(&output, state.config.retain_outputs).await?;
    Ok(attachment(&output, body))
}

/// Load the artifact and delete it unless outputs are retained.
async fn read_output(output: &ConversionOutput, retain: bool) -> Result<Vec<u8>, ConvertError> {
    let body = tokio::fs::read(&output.path).await?;
    if !retain {
        if let Err(e) = tokio::fs::remove_file(&output.path).await {
            warn!("Could not remove served output {}: {}", output.path.display(), e);
        }
    }
    Ok(body)
}

fn attachment(output: &ConversionOutput, body: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", output.file_name);
    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, output.content_type.clone()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response();

    if let Some(qr) = &output.qr {
        let status = match qr.logo {
            LogoOutcome::None => "none",
            LogoOutcome::Skipped { .. } => "skipped",
            LogoOutcome::Embedded(_) => "embedded",
            LogoOutcome::Failed(_) => "failed",
        };
        response
            .headers_mut()
            .insert(QR_LOGO_HEADER, HeaderValue::from_static(status));
    }
    response
}

// ── Errors ───────────────────────────────────────────────────────────────

/// Errors surfaced by the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request detected before conversion.
    BadRequest(String),
    /// The multipart body could not be read.
    Multipart(MultipartError),
    /// The conversion itself failed.
    Convert(ConvertError),
}

impl From<ConvertError> for ApiError {
    fn from(err: ConvertError) -> Self {
        ApiError::Convert(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Multipart(e) => (e.status(), e.body_text()),
            ApiError::Convert(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Convert(e) => {
                error!("Conversion failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
