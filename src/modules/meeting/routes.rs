use axum::{
    routing::{get, post},
    Router,
};

use crate::modules::meeting::controller;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bots", post(controller::create_bot))
        .route("/api/meetings", get(controller::list_meetings))
        .route("/api/meetings/{id}", get(controller::get_meeting))
        .route("/api/meetings/{id}/summarize", post(controller::summarize_meeting))
        .route("/api/meetings/{id}/video", get(controller::get_video_url))
}
