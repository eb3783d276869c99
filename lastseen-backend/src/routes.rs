use crate::AppState;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub(crate) struct StatusResponse {
    subscribers: usize,
    monitored_players: usize,
    cached_players: usize,
    cache_generation: u64,
    last_refresh: Option<DateTime<Utc>>,
    refreshing: bool,
}

pub(crate) async fn health() -> impl IntoResponse {
    StatusCode::OK
}

pub(crate) async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let counts = state.subscriptions.counts().await;
    let info = state.cache.info().await;

    Json(StatusResponse {
        subscribers: counts.subscribers,
        monitored_players: counts.handles,
        cached_players: info.entries,
        cache_generation: info.generation,
        last_refresh: info.refreshed_at,
        refreshing: state.cache.is_refreshing(),
    })
}
