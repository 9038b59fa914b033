use crate::server::AppContext;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Live playlist served at `/<playlist_name>`.
pub fn playlist_routes(playlist_name: &str) -> Router<AppContext> {
    let path = format!("/{}", playlist_name.trim_matches('/'));
    Router::new().route(&path, get(live_playlist))
}

async fn live_playlist(State(ctx): State<AppContext>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        ctx.manager.playlist_text(),
    )
}
