use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEvent {
    Done,
    VideoCallEnded,
    RecordingReady,
    Error,
}

impl WebhookEvent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bot.done" => Some(WebhookEvent::Done),
            "bot.video_call_ended" => Some(WebhookEvent::VideoCallEnded),
            "bot.recording_ready" => Some(WebhookEvent::RecordingReady),
            "bot.error" => Some(WebhookEvent::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::Done => "bot.done",
            WebhookEvent::VideoCallEnded => "bot.video_call_ended",
            WebhookEvent::RecordingReady => "bot.recording_ready",
            WebhookEvent::Error => "bot.error",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotRef {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InlineTranscriptSegment {
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookMeetingMetadata {
    pub title: Option<String>,
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookData {
    pub bot: Option<BotRef>,
    pub transcript_segments: Option<Vec<InlineTranscriptSegment>>,
    pub meeting_metadata: Option<WebhookMeetingMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub message: String,
    pub bot_id: String,
    pub event: String,
}
