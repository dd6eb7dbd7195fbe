//! HTTP server: upload an order export, download the two sheets.
//!
//! # Endpoints
//!
//! | Method | Path                 | Description                              |
//! |--------|----------------------|------------------------------------------|
//! | GET    | `/`                  | Upload form                              |
//! | POST   | `/`                  | Upload (multipart `file`), HTML result   |
//! | POST   | `/api/upload`        | Upload (multipart `file`), JSON result   |
//! | GET    | `/orders/{filename}` | Download a stored or produced file       |
//! | GET    | `/error?message=`    | Error page                               |
//! | GET    | `/health`            | Health check                             |
//! | GET    | `/api/logs`          | SSE stream for real-time logs            |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Html, Json, Redirect, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::pages::{error_page, processed_page, UPLOAD_FORM};
use super::types::{download_url, error_response, UploadResponse, DOWNLOAD_PREFIX};
use crate::config::{AppConfig, MAX_UPLOAD_SIZE};
use crate::error::{ServerError, ServerResult};
use crate::logs::{log_error, log_info, LOG_BROADCASTER};
use crate::transform::pipeline::{process_file, ProcessOptions, ProcessOutput};

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("filename pattern is valid"));

type SharedConfig = Arc<AppConfig>;

/// Build the application router.
pub fn router(config: AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let downloads = ServeDir::new(&config.upload_dir);

    Router::new()
        .route("/", get(upload_form).post(upload_page))
        .route("/api/upload", post(upload_api))
        .route("/error", get(show_error))
        .route("/health", get(health))
        .route("/api/logs", get(sse_logs))
        .nest_service(DOWNLOAD_PREFIX, downloads)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
        .with_state(Arc::new(config))
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Ordersplit server running on http://localhost:{}", config.port);
    println!("   GET  /           - Upload form");
    println!("   POST /api/upload - Upload order export (JSON)");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   Cost table: {}", config.cost_table.display());
    println!("   Upload dir: {}", config.upload_dir.display());
    println!();

    let app = router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ordersplit",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

#[derive(Debug, Deserialize)]
struct ErrorQuery {
    #[serde(default)]
    message: String,
}

async fn show_error(Query(query): Query<ErrorQuery>) -> Html<String> {
    Html(error_page(&query.message))
}

/// Browser upload: result page, or a redirect to the error page.
async fn upload_page(
    State(config): State<SharedConfig>,
    multipart: Multipart,
) -> Result<Html<String>, Redirect> {
    match handle_upload(&config, multipart).await {
        Ok(output) => Ok(Html(processed_page(
            &download_url(&output.accounts_path),
            &download_url(&output.shipping_path),
        ))),
        Err(e) => {
            log_error(format!("Upload failed: {}", e));
            Err(error_redirect(&e.to_string()))
        }
    }
}

/// JSON upload for scripted clients.
async fn upload_api(
    State(config): State<SharedConfig>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<Value>)> {
    match handle_upload(&config, multipart).await {
        Ok(output) => Ok(Json(UploadResponse::from(output))),
        Err(e) => {
            log_error(format!("Upload failed: {}", e));
            Err((status_code(&e), Json(error_response(&e.to_string()))))
        }
    }
}

async fn handle_upload(config: &AppConfig, multipart: Multipart) -> ServerResult<ProcessOutput> {
    let (file_name, bytes) = read_upload(multipart).await?;
    store_and_process(config, &file_name, &bytes).await
}

/// Pull the `file` part out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> ServerResult<(String, Vec<u8>)> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }

    upload.ok_or_else(|| ServerError::BadRequest("No file component in request payload".to_string()))
}

/// Validate the file name, store the upload and run the transform on it.
pub async fn store_and_process(
    config: &AppConfig,
    file_name: &str,
    bytes: &[u8],
) -> ServerResult<ProcessOutput> {
    if file_name.is_empty() {
        return Err(ServerError::BadRequest("No file selected".to_string()));
    }
    if !config.allows(file_name) {
        return Err(ServerError::UnsupportedFile);
    }
    let safe_name = sanitize_filename(file_name)
        .filter(|name| config.allows(name))
        .ok_or_else(|| ServerError::BadRequest("Invalid file name".to_string()))?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let input = config.upload_dir.join(&safe_name);
    tokio::fs::write(&input, bytes).await?;

    println!("\n{}", "=".repeat(70));
    log_info(format!("📄 NEW UPLOAD: {} ({} bytes)", safe_name, bytes.len()));
    println!("{}\n", "=".repeat(70));

    let options = ProcessOptions {
        cost_table: config.cost_table.clone(),
    };
    let output = tokio::task::spawn_blocking(move || process_file(&input, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(output)
}

/// Reduce an uploaded file name to `[A-Za-z0-9_.-]`, without any directory part.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let spaced = name.replace(|c| c == '/' || c == '\\', " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn error_redirect(message: &str) -> Redirect {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("message", message)
        .finish();
    Redirect::to(&format!("/error?{}", query))
}

fn status_code(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::UnsupportedFile => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ServerError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
