use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info, warn};

use crate::modules::meeting::schema::MessageResponse;
use crate::modules::webhook::engine;
use crate::modules::webhook::schema::{WebhookAck, WebhookEvent, WebhookPayload};
use crate::AppState;

pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<WebhookAck>, (StatusCode, Json<MessageResponse>)> {
    let bot_id = payload
        .data
        .bot
        .as_ref()
        .map(|b| b.id.clone())
        .filter(|id| !id.is_empty());

    let (Some(bot_id), Some(event_name)) = (bot_id, payload.event.filter(|e| !e.is_empty()))
    else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "Invalid webhook payload - missing bot ID or event name".to_string(),
            }),
        ));
    };

    let Some(event) = WebhookEvent::from_name(&event_name) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: format!("Unrecognized webhook event: {}", event_name),
            }),
        ));
    };

    info!(bot_id = %bot_id, event = %event_name, "webhook received");

    let meeting = state.store.find_by_bot_id(&bot_id).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    let Some(meeting) = meeting else {
        warn!(bot_id = %bot_id, "no meeting found for bot");
        return Ok(Json(WebhookAck {
            message: "Webhook processed but no matching meeting found".to_string(),
            bot_id,
            event: event_name,
        }));
    };

    // The ack must go out before reconciliation runs, or the remote service
    // redelivers on timeout. The spawned task owns all further failures.
    let store = state.store.clone();
    let meeting_id = meeting.id.clone();
    let task_bot_id = bot_id.clone();
    let data = payload.data.clone();

    tokio::spawn(async move {
        if let Err(e) =
            engine::process_event(store, meeting_id.clone(), task_bot_id.clone(), event, data).await
        {
            error!(
                meeting_id = %meeting_id,
                bot_id = %task_bot_id,
                event = event.as_str(),
                error = %e,
                "webhook reconciliation failed"
            );
        }
    });

    Ok(Json(WebhookAck {
        message: "Webhook received and processing started".to_string(),
        bot_id,
        event: event_name,
    }))
}
