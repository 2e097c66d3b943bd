use axum::{routing::post, Router};

use crate::modules::webhook::controller;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/webhook", post(controller::receive_webhook))
}
