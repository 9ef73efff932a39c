//! Cafeteria menu publishing server: day-menu browsing, availability
//! toggles, and monthly menu PDF ingestion through a generative
//! extraction service.

mod auth;
mod config;
mod dates;
mod error;
mod gemini;
mod ingest;
mod pdftext;
mod schema;
mod store;
mod upload;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{Duration, FixedOffset, Utc};
use config::AppConfig;
use error::ApiError;
use gemini::GeminiClient;
use ingest::MenuIngestor;
use serde_json::{json, Value};
use std::sync::Arc;
use store::{MenuStore, SqliteStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
    store: SqliteStore,
    gemini: Option<GeminiClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shokudou_menu=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    std::fs::create_dir_all(&config.upload_dir)?;
    let store = SqliteStore::open(&config.db_path)?;
    info!("Menu store opened at {:?}", config.db_path);

    let gemini = match &config.gemini_api_key {
        Some(key) => Some(GeminiClient::new(
            key.clone(),
            config.gemini_api_url.clone(),
            config.gemini_connect_timeout,
            config.gemini_timeout,
        )?),
        None => {
            info!("GEMINI_API_KEY not set; menu uploads will be rejected");
            None
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        store,
        gemini,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/menu", get(day_menu))
        .route("/api/menu/upload", post(upload_menu))
        .route("/api/menu/:id/status", post(update_status))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(serde::Deserialize)]
struct DayMenuQuery {
    /// Days relative to today (JST); 0 = today.
    offset: Option<i64>,
}

/// Menu for today + offset days.
async fn day_menu(
    State(state): State<AppState>,
    Query(query): Query<DayMenuQuery>,
) -> Result<Json<Value>, ApiError> {
    let offset = query.offset.unwrap_or(0);
    let date = (Utc::now().with_timezone(&jst()).date_naive() + Duration::days(offset))
        .format("%Y-%m-%d")
        .to_string();

    let items = state.store.menu_for_date(&date)?;
    Ok(Json(json!({
        "success": true,
        "date": date,
        "items": items,
    })))
}

/// Upload a monthly menu PDF and run the ingestion pipeline:
/// guard → store file → extract text → generative extraction →
/// date inference → per-row persistence.
async fn upload_menu(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let caller = auth::authenticate(&headers, &state.config.admin_token)?;

    let mut filename = None;
    let mut file_data = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            if let Some(content_type) = field.content_type() {
                if !is_pdf_like(content_type) {
                    return Err(ApiError::UnsupportedMediaType);
                }
            }
            filename = field.file_name().map(str::to_string);
            file_data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read file: {e}")))?
                .to_vec();
            break;
        }
    }

    let filename = filename.ok_or(ApiError::MissingFile)?;
    if file_data.is_empty() {
        return Err(ApiError::MissingFile);
    }

    info!(
        "Upload from '{}': {} ({} bytes)",
        caller.subject,
        filename,
        file_data.len()
    );

    // Client-side validation first, then the service precondition, then the
    // atomic guarded write.
    if !dates::filename_matches(&filename) {
        return Err(ApiError::InvalidFilename);
    }
    let gemini = state.gemini.as_ref().ok_or(ApiError::ServiceUnconfigured)?;

    let path = upload::guard_and_store(&state.config.upload_dir, &filename, &file_data)?;
    // Parsed once here, reused for both the prompt and date inference.
    let ctx = dates::DateContext::from_filename(&filename);

    let text = pdftext::extract_text(&path).await?;
    let prompt = schema::build_prompt(&text, ctx.as_ref());
    let rows = gemini.extract_rows(&prompt, schema::response_schema()).await?;

    let result = MenuIngestor::new(&state.store).ingest(rows, ctx.as_ref());

    info!(
        "Upload {} processed: {} inserted, {} errors",
        filename,
        result.inserted_count,
        result.errors.len()
    );

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "File uploaded successfully. Inserted {} menu items.",
            result.inserted_count
        ),
        "fileName": filename,
        "processing_result": result,
    })))
}

#[derive(serde::Deserialize)]
struct StatusBody {
    available: bool,
}

/// Toggle a menu item's availability.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<StatusBody>,
) -> Result<Json<Value>, ApiError> {
    auth::authenticate(&headers, &state.config.admin_token)?;

    if !state.store.set_availability(id, body.available)? {
        return Err(ApiError::NotFound);
    }

    Ok(Json(json!({
        "success": true,
        "id": id,
        "available": body.available,
    })))
}

/// The cafeteria operates on Japan Standard Time, UTC+9.
fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("UTC+9 is a valid fixed offset")
}

fn is_pdf_like(content_type: &str) -> bool {
    matches!(
        content_type,
        "application/pdf" | "application/x-pdf" | "application/octet-stream"
    )
}
