//! HTTP API — the data surface behind the website table page.
//!
//! Endpoints:
//!   GET    /api/status                → record count + storage info (JSON)
//!   GET    /api/websites              → all records (JSON)
//!   GET    /api/websites?q=term       → records whose name contains `term`
//!   GET    /api/websites/{id}         → one record
//!   POST   /api/websites              → insert from a RecordDraft body
//!   PUT    /api/websites/{id}         → update from a RecordPatch body
//!   DELETE /api/websites/{id}         → remove
//!
//! Every error, including a malformed id or body, is a JSON `{"error": ...}`.
//! When `api.static_dir` is configured, every other path is served from it.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::SiteError;
use crate::record::{RecordDraft, RecordPatch};
use crate::store::RecordStore;

/// Shared state passed to all handlers.
pub struct AppState {
    pub store: RwLock<RecordStore>,
    pub config: Config,
}

// ──────────────── request / response types ────────────────────────────────

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    records: usize,
    storage_key: String,
    storage_dir: String,
    source: String,
}

// ──────────────── router ──────────────────────────────────────────────────

/// Build the axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.api.static_dir.clone();

    let router = Router::new()
        .route("/api/status", get(handle_status))
        .route("/api/websites", get(handle_list).post(handle_create))
        .route(
            "/api/websites/{id}",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .layer(CorsLayer::permissive())
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

/// Start the HTTP server.
pub async fn start_server(state: Arc<AppState>, port: u16) {
    let app = build_router(state);
    let addr = format!("0.0.0.0:{}", port);
    info!(port, "HTTP API listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "Failed to bind HTTP server");
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "HTTP server error");
    }
}

// ──────────────── handlers ────────────────────────────────────────────────

async fn handle_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let records = state.store.read().len();
    Json(StatusResponse {
        records,
        storage_key: state.config.storage.key.clone(),
        storage_dir: state.config.storage.dir.display().to_string(),
        source: state.config.source.path.display().to_string(),
    })
}

async fn handle_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let store = state.store.read();
    let records = match params.q.as_deref() {
        Some(term) => store.search(term),
        None => store.load(),
    };
    Json(records)
}

async fn handle_get(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    match state.store.read().get(id) {
        Some(record) => Json(record).into_response(),
        None => not_found(id),
    }
}

async fn handle_create(
    State(state): State<Arc<AppState>>,
    draft: Result<Json<RecordDraft>, JsonRejection>,
) -> Response {
    let Json(draft) = match draft {
        Ok(j) => j,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    match state.store.write().insert(draft) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_update(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    patch: Result<Json<RecordPatch>, JsonRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    let Json(patch) = match patch {
        Ok(j) => j,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    match state.store.write().update(id, patch) {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => not_found(id),
        Err(e) => error_response(e),
    }
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    match state.store.write().delete(id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(id),
        Err(e) => error_response(e),
    }
}

// ──────────────── helpers ─────────────────────────────────────────────────

/// Extractor rejections keep axum's status but answer in JSON.
fn rejected(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

fn not_found(id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("No website with id '{id}'")})),
    )
        .into_response()
}

fn error_response(err: SiteError) -> Response {
    match err {
        SiteError::Validation(problems) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "Please enter valid values for the website",
                "problems": problems,
            })),
        )
            .into_response(),
        other => {
            error!(error = %other, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": other.to_string()})),
            )
                .into_response()
        }
    }
}
