use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::meeting::model::{Summary, TranscriptSegment};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBotRequest {
    #[validate(length(min = 1, message = "meeting_url cannot be empty"))]
    pub meeting_url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBotResponse {
    pub message: String,
    pub meeting_id: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct MeetingResponse {
    pub id: String,
    pub status: String,
    pub meeting_url: String,
    pub bot_id: Option<String>,
    pub title: String,
    pub participants: Vec<String>,
    pub transcript: Option<Vec<TranscriptSegment>>,
    pub summary: Option<Summary>,
    pub duration: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct MeetingSummaryResponse {
    pub id: String,
    pub status: String,
    pub title: String,
    pub meeting_url: String,
    pub duration: Option<String>,
    pub participant_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct MeetingListResponse {
    pub data: Vec<MeetingSummaryResponse>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub message: String,
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
pub struct VideoMeetingInfo {
    pub id: String,
    pub title: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct VideoUrlResponse {
    pub video_url: String,
    pub expires_in: String,
    pub meeting: VideoMeetingInfo,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
