//! songbook-api library - song library HTTP service
//!
//! Router, handlers and the song repository. The binary in `main.rs` only
//! resolves configuration, opens the pool and serves [`build_router`].

use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod cli;
pub mod couplet;
pub mod db;
pub mod error;
pub mod pagination;
pub mod query;

use db::SongRepository;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub songs: SongRepository,
}

impl AppState {
    /// Create new application state
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            songs: SongRepository::new(pool, query_timeout),
        }
    }
}

/// Build application router
///
/// Every request gets an `x-request-id` (generated unless the client sent
/// one), is traced inside a span carrying that id, and has the id echoed on
/// the response.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let songs = Router::new()
        .route("/api/song", post(api::create_song).put(api::update_song))
        .route("/api/song/", get(api::missing_song_id).delete(api::missing_song_id))
        .route("/api/song/info", get(api::song_info))
        .route("/api/song/:id", get(api::get_song).delete(api::delete_song))
        .route("/api/song/:id/couplet", get(api::get_couplet))
        .route("/api/songs", get(api::list_songs));

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(api::REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .merge(songs)
        .merge(api::health_routes())
        .with_state(state)
        .layer(middleware)
}
