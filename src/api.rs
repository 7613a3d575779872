// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::export;
use crate::model::Snapshot;
use crate::view;
use crate::watch::RateWatcher;

#[derive(Clone)]
pub struct AppState {
    pub watcher: Arc<RateWatcher>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/", get(index))
        .route("/api/rates", get(rates_snapshot))
        .route("/refresh", post(refresh))
        .route("/export.xlsx", get(export_xlsx))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(view::render_page(&state.watcher.snapshot()))
}

async fn rates_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.watcher.snapshot())
}

/// Manual refresh. A trigger while a fetch is in flight is dropped by the
/// watcher's guard; either way the browser goes back to the page.
async fn refresh(State(state): State<AppState>) -> Redirect {
    let outcome = state.watcher.refresh().await;
    tracing::debug!(target: "api", ?outcome, "manual refresh");
    Redirect::to("/")
}

async fn export_xlsx(State(state): State<AppState>) -> Response {
    let snap = state.watcher.snapshot();
    let Some(update) = snap.data else {
        return StatusCode::NO_CONTENT.into_response();
    };
    match export::workbook_bytes(&update) {
        Ok(Some(bytes)) => {
            let filename = export::export_filename(chrono::Local::now().date_naive());
            (
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                            .to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(target: "api", error = %e, "xlsx build failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "export failed").into_response()
        }
    }
}
