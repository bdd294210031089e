//! API Handlers
//!
//! HTTP request handlers for each snapshot endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use tokio::sync::{watch, RwLock};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::models::{
    HealthResponse, SettingsRequest, SettingsResponse, SnapshotResponse, StatsResponse,
};
use crate::snapshot::{SnapshotBoard, SnapshotEngine};
use crate::tasks::{poll_once, PollSettings, SharedBoard};

/// Application state shared across all handlers.
///
/// Holds the engine, the board with the last-known snapshot, and the
/// sending half of the poller's settings channel.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SnapshotEngine>,
    pub board: SharedBoard,
    pub settings: Arc<watch::Sender<PollSettings>>,
}

impl AppState {
    /// Creates a new AppState around an engine.
    ///
    /// Returns the settings receiver the poller should be spawned with.
    pub fn new(
        engine: SnapshotEngine,
        settings: PollSettings,
    ) -> (Self, watch::Receiver<PollSettings>) {
        let (tx, rx) = watch::channel(settings);
        let state = Self {
            engine: Arc::new(engine),
            board: Arc::new(RwLock::new(SnapshotBoard::new())),
            settings: Arc::new(tx),
        };
        (state, rx)
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(
        engine: SnapshotEngine,
        config: &Config,
    ) -> (Self, watch::Receiver<PollSettings>) {
        Self::new(engine, config.poll_settings())
    }
}

/// Handler for GET /snapshot
///
/// Returns the last-known snapshot, or a loading status if none arrived yet.
pub async fn snapshot_handler(State(state): State<AppState>) -> Json<SnapshotResponse> {
    let view = state.board.read().await.view();
    Json(SnapshotResponse::from_view(view))
}

/// Handler for POST /refresh
///
/// Takes a snapshot immediately and publishes it. Fails with 409 while
/// another poll is in flight. Always answers with the board's snapshot, so a
/// late result never overrides a newer one in the response.
pub async fn refresh_handler(State(state): State<AppState>) -> Result<Json<SnapshotResponse>> {
    let snapshot = poll_once(&state.engine, &state.board).await?;
    Ok(Json(SnapshotResponse::fresh(snapshot)))
}

/// Handler for GET /settings
pub async fn get_settings_handler(State(state): State<AppState>) -> Json<SettingsResponse> {
    let current = *state.settings.borrow();
    Json(SettingsResponse::from(current))
}

/// Handler for PUT /settings
///
/// Updates auto-refresh and/or the refresh interval; the poller picks the
/// change up right away.
pub async fn put_settings_handler(
    State(state): State<AppState>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>> {
    // Read, validate and store under the channel's lock so concurrent
    // updates each see the other's fields.
    let mut outcome = Ok(*state.settings.borrow());
    state.settings.send_if_modified(|current| match req.apply(*current) {
        Ok(updated) => {
            outcome = Ok(updated);
            if updated == *current {
                return false;
            }
            *current = updated;
            true
        }
        Err(err) => {
            outcome = Err(err);
            false
        }
    });
    let updated = outcome?;
    info!("Poll settings now {:?}", updated);

    Ok(Json(SettingsResponse::from(updated)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let board = state.board.read().await;
    let entries = board.latest().map(|s| s.len()).unwrap_or(0);
    Json(StatsResponse::new(board.stats(), entries))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
