// src/api.rs
//! Read-only HTTP status surface over the shared registry.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{Duration, Utc};

use crate::rate::StatusReport;
use crate::registry::Registry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub window: Duration,
}

impl AppState {
    pub fn report(&self) -> StatusReport {
        StatusReport::collect(&self.registry, Utc::now(), self.window)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(status_json))
        .route("/status/text", get(status_text))
        .with_state(state)
}

async fn status_json(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.report())
}

async fn status_text(State(state): State<AppState>) -> String {
    state.report().render_text()
}
