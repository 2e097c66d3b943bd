use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecallError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Missing API key")]
    MissingApiKey,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct CreateBotRequest<'a> {
    meeting_url: &'a str,
    recording_config: RecordingConfig,
}

#[derive(Debug, Serialize)]
struct RecordingConfig {
    transcript: TranscriptConfig,
}

#[derive(Debug, Serialize)]
struct TranscriptConfig {
    provider: TranscriptProvider,
}

#[derive(Debug, Serialize)]
struct TranscriptProvider {
    recallai_streaming: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    detail: String,
}

pub struct CreatedBot {
    pub id: String,
    pub raw: serde_json::Value,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct BotMeetingMetadata {
    pub title: Option<String>,
    #[serde(default)]
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ArtifactData {
    pub download_url: Option<String>,
    pub participants_download_url: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MediaShortcut {
    pub data: Option<ArtifactData>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MediaShortcuts {
    pub video_mixed: Option<MediaShortcut>,
    pub transcript: Option<MediaShortcut>,
    pub participant_events: Option<MediaShortcut>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Recording {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub media_shortcuts: Option<MediaShortcuts>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotDetail {
    pub id: String,
    pub meeting_metadata: Option<BotMeetingMetadata>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

impl BotDetail {
    pub fn video_download_url(&self) -> Option<String> {
        self.recordings
            .first()
            .and_then(|r| r.media_shortcuts.as_ref())
            .and_then(|s| s.video_mixed.as_ref())
            .and_then(|m| m.data.as_ref())
            .and_then(|d| d.download_url.clone())
    }

    pub fn transcript_download_url(&self) -> Option<String> {
        self.recordings
            .first()
            .and_then(|r| r.media_shortcuts.as_ref())
            .and_then(|s| s.transcript.as_ref())
            .and_then(|m| m.data.as_ref())
            .and_then(|d| d.download_url.clone())
    }

    pub fn participants_download_url(&self) -> Option<String> {
        self.recordings
            .first()
            .and_then(|r| r.media_shortcuts.as_ref())
            .and_then(|s| s.participant_events.as_ref())
            .and_then(|m| m.data.as_ref())
            .and_then(|d| d.participants_download_url.clone())
    }
}

// The transcript artifact identifies speakers by numeric id; older payloads
// use strings. Accept both.
fn id_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TranscriptParticipant {
    #[serde(default, deserialize_with = "id_string_or_number")]
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WordTimestamp {
    pub relative: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TranscriptWord {
    #[serde(default)]
    pub text: String,
    pub start_timestamp: Option<WordTimestamp>,
    pub end_timestamp: Option<WordTimestamp>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TranscriptEntry {
    pub participant: Option<TranscriptParticipant>,
    #[serde(default)]
    pub words: Vec<TranscriptWord>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantEvent {
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct RecallClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RecallClient {
    pub fn new() -> Result<Self, RecallError> {
        let api_key = env::var("RECALL_API_KEY").map_err(|_| RecallError::MissingApiKey)?;

        if api_key.is_empty() {
            return Err(RecallError::MissingApiKey);
        }

        let base_url = env::var("RECALL_BASE_URL")
            .unwrap_or_else(|_| "https://us-east-1.recall.ai/api/v1".to_string());

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key,
        })
    }

    pub async fn create_bot(&self, meeting_url: &str) -> Result<CreatedBot, RecallError> {
        let request = CreateBotRequest {
            meeting_url,
            recording_config: RecordingConfig {
                transcript: TranscriptConfig {
                    provider: TranscriptProvider {
                        recallai_streaming: serde_json::Map::new(),
                    },
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/bot/", self.base_url))
            .header("accept", "application/json")
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let body = Self::check_response(response).await?;
        let raw: serde_json::Value = serde_json::from_str(&body)?;

        let id = raw
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| RecallError::InvalidResponse("No bot id in response".to_string()))?
            .to_string();

        Ok(CreatedBot { id, raw })
    }

    pub async fn get_bot(&self, bot_id: &str) -> Result<BotDetail, RecallError> {
        let response = self
            .client
            .get(format!("{}/bot/{}/", self.base_url, bot_id))
            .header("accept", "application/json")
            .header("Authorization", format!("Token {}", self.api_key))
            .send()
            .await?;

        let body = Self::check_response(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Downloads a signed-URL artifact. The URL is pre-authenticated, so no
    /// API key header is sent.
    pub async fn fetch_artifact<T: DeserializeOwned>(&self, url: &str) -> Result<T, RecallError> {
        let response = self.client.get(url).send().await?;
        let body = Self::check_response(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn check_response(response: reqwest::Response) -> Result<String, RecallError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(RecallError::ApiError(error_response.detail));
            }
            return Err(RecallError::ApiError(format!("{}: {}", status, body)));
        }

        Ok(body)
    }
}

impl From<serde_json::Error> for RecallError {
    fn from(e: serde_json::Error) -> Self {
        RecallError::InvalidResponse(e.to_string())
    }
}
