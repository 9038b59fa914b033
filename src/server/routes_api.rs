use crate::server::AppContext;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/status", get(status))
        .route("/stream/pause", post(pause))
        .route("/stream/resume", post(resume))
}

async fn status(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.manager.snapshot())
}

async fn pause(State(ctx): State<AppContext>) -> impl IntoResponse {
    if !ctx.manager.pause() {
        tracing::debug!(status = %ctx.manager.status(), "Pause request ignored");
    }
    StatusCode::NO_CONTENT
}

async fn resume(State(ctx): State<AppContext>) -> impl IntoResponse {
    if !ctx.manager.resume() {
        tracing::debug!(status = %ctx.manager.status(), "Resume request ignored");
    }
    StatusCode::NO_CONTENT
}
