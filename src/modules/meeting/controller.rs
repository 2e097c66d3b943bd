use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::modules::meeting::{
    model::{MeetingNote, MeetingStatus},
    schema::{
        CreateBotRequest, CreateBotResponse, MeetingListResponse, MeetingResponse,
        MeetingSummaryResponse, MessageResponse, SummarizeResponse, VideoMeetingInfo,
        VideoUrlResponse,
    },
};
use crate::services::recall::RecallClient;
use crate::services::summary::SummaryClient;
use crate::AppState;

fn to_response(m: &MeetingNote) -> MeetingResponse {
    MeetingResponse {
        id: m.id.clone(),
        status: m.status.as_str().to_string(),
        meeting_url: m.meeting_url.clone(),
        bot_id: m.bot_id.clone(),
        title: m.title.clone(),
        participants: m.participants.clone(),
        transcript: m.transcript.clone(),
        summary: m.summary.clone(),
        duration: m.duration.clone(),
        created_at: m.created_at.to_rfc3339(),
        updated_at: m.updated_at.to_rfc3339(),
    }
}

fn to_summary_response(m: &MeetingNote) -> MeetingSummaryResponse {
    MeetingSummaryResponse {
        id: m.id.clone(),
        status: m.status.as_str().to_string(),
        title: m.title.clone(),
        meeting_url: m.meeting_url.clone(),
        duration: m.duration.clone(),
        participant_count: m.participants.len(),
        created_at: m.created_at.to_rfc3339(),
        updated_at: m.updated_at.to_rfc3339(),
    }
}

fn parse_meeting_id(id: &str) -> Result<(), (StatusCode, Json<MessageResponse>)> {
    Uuid::parse_str(id).map(|_| ()).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse { message: "Invalid ID format".to_string() }),
        )
    })
}

pub async fn create_bot(
    State(state): State<AppState>,
    Json(payload): Json<CreateBotRequest>,
) -> Result<(StatusCode, Json<CreateBotResponse>), (StatusCode, Json<MessageResponse>)> {
    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse { message: e.to_string() }),
        ));
    }

    let client = RecallClient::new().map_err(|e| {
        error!(error = %e, "recording bot client unavailable");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    let created = client.create_bot(&payload.meeting_url).await.map_err(|e| {
        error!(meeting_url = %payload.meeting_url, error = %e, "failed to create recording bot");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    // Persist only after the remote call succeeded, so a failed dispatch
    // leaves no record behind.
    let meeting = MeetingNote::new(payload.meeting_url, Some(created.id.clone()));

    state.store.create(&meeting).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    info!(meeting_id = %meeting.id, bot_id = %created.id, "recording bot dispatched");

    Ok((
        StatusCode::CREATED,
        Json(CreateBotResponse {
            message: "Bot created successfully".to_string(),
            meeting_id: meeting.id,
            data: created.raw,
        }),
    ))
}

pub async fn get_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MeetingResponse>, (StatusCode, Json<MessageResponse>)> {
    parse_meeting_id(&id)?;

    match state.store.find_by_id(&id).await {
        Ok(Some(m)) => Ok(Json(to_response(&m))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(MessageResponse { message: "Meeting not found".to_string() }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )),
    }
}

pub async fn list_meetings(
    State(state): State<AppState>,
) -> Result<Json<MeetingListResponse>, (StatusCode, Json<MessageResponse>)> {
    let meetings = state.store.find_all().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    let total = meetings.len() as u64;

    Ok(Json(MeetingListResponse {
        data: meetings.iter().map(to_summary_response).collect(),
        total,
    }))
}

pub async fn summarize_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SummarizeResponse>, (StatusCode, Json<MessageResponse>)> {
    parse_meeting_id(&id)?;

    let meeting = state.store.find_by_id(&id).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    let meeting = meeting.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(MessageResponse { message: "Meeting not found".to_string() }),
        )
    })?;

    let transcript = meeting.transcript.filter(|t| !t.is_empty()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "No transcript available for this meeting".to_string(),
            }),
        )
    })?;

    let client = SummaryClient::new().map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    // Unlike the webhook path, generator failure here is surfaced to the
    // caller and the record is left untouched.
    let summary = client
        .generate(&transcript, &meeting.participants)
        .await
        .map_err(|e| {
            error!(meeting_id = %id, error = %e, "on-demand summary generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse { message: "Failed to generate summary".to_string() }),
            )
        })?;

    let stored = summary.clone();
    let updated = state
        .store
        .update(&id, |m| m.summary = Some(stored))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse { message: e.to_string() }),
            )
        })?;

    if updated.is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(MessageResponse { message: "Meeting not found".to_string() }),
        ));
    }

    info!(meeting_id = %id, "summary generated on demand");

    Ok(Json(SummarizeResponse {
        message: "Summary generated successfully".to_string(),
        summary,
    }))
}

pub async fn get_video_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoUrlResponse>, (StatusCode, Json<MessageResponse>)> {
    parse_meeting_id(&id)?;

    let meeting = state.store.find_by_id(&id).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    let meeting = meeting.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(MessageResponse { message: "Meeting not found".to_string() }),
        )
    })?;

    if meeting.status != MeetingStatus::Done {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse { message: "Meeting not completed yet".to_string() }),
        ));
    }

    let bot_id = meeting.bot_id.as_deref().ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "No bot ID found for this meeting".to_string(),
            }),
        )
    })?;

    let client = RecallClient::new().map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: e.to_string() }),
        )
    })?;

    // Download URLs expire after ~6 hours, so the bot detail is re-fetched on
    // every request instead of cached.
    let bot = client.get_bot(bot_id).await.map_err(|e| {
        error!(meeting_id = %id, bot_id = %bot_id, error = %e, "failed to fetch bot detail for video URL");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse { message: "Failed to fetch video URL".to_string() }),
        )
    })?;

    let video_url = bot.video_download_url().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(MessageResponse {
                message: "No video available for this meeting".to_string(),
            }),
        )
    })?;

    Ok(Json(VideoUrlResponse {
        video_url,
        expires_in: "6 hours".to_string(),
        meeting: VideoMeetingInfo {
            id: meeting.id,
            title: meeting.title,
            status: meeting.status.as_str().to_string(),
        },
    }))
}
