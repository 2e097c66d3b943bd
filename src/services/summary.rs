use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::modules::meeting::model::{ParticipantInfo, Summary, TranscriptSegment};

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Missing API key")]
    MissingApiKey,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Transcript is required for summary generation")]
    EmptyTranscript,
}

const PARTICIPANT_COLORS: [&str; 6] = [
    "bg-blue-50 text-blue-900",
    "bg-green-50 text-green-900",
    "bg-purple-50 text-purple-900",
    "bg-orange-50 text-orange-900",
    "bg-pink-50 text-pink-900",
    "bg-indigo-50 text-indigo-900",
];

pub fn participant_color(index: usize) -> &'static str {
    PARTICIPANT_COLORS[index % PARTICIPANT_COLORS.len()]
}

fn participant_slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct SummaryClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SummaryClient {
    pub fn new() -> Result<Self, SummaryError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| SummaryError::MissingApiKey)?;

        if api_key.is_empty() {
            return Err(SummaryError::MissingApiKey);
        }

        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = env::var("SUMMARY_MODEL").unwrap_or_else(|_| "gpt-5".to_string());

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key,
            model,
        })
    }

    pub async fn generate(
        &self,
        transcript: &[TranscriptSegment],
        participants: &[String],
    ) -> Result<Summary, SummaryError> {
        if transcript.is_empty() {
            return Err(SummaryError::EmptyTranscript);
        }

        let palette: Vec<ParticipantInfo> = participants
            .iter()
            .enumerate()
            .map(|(index, name)| ParticipantInfo {
                id: participant_slug(name),
                name: name.clone(),
                color: participant_color(index).to_string(),
            })
            .collect();

        let transcript_text = transcript
            .iter()
            .map(|t| {
                format!(
                    "{}: {}",
                    t.speaker_name.as_deref().unwrap_or("Speaker"),
                    t.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let participant_list = palette
            .iter()
            .map(|p| format!("{} (id: {}, color: {})", p.name, p.id, p.color))
            .collect::<Vec<_>>()
            .join(", ");

        let system_prompt = "You are an expert meeting summarizer. Create a structured summary \
             with participant highlights and important moments that can link to video timestamps. \
             Respond with a single JSON object and nothing else.";

        let prompt = format!(
            r#"Required JSON format:
{{
  "segments": [
    {{"type": "text", "content": "This was a productive meeting between "}},
    {{"type": "participant", "content": "John Smith", "participant_id": "john_smith"}},
    {{"type": "text", "content": " and "}},
    {{"type": "participant", "content": "Sarah Johnson", "participant_id": "sarah_johnson"}},
    {{"type": "text", "content": ". "}},
    {{"type": "participant", "content": "John Smith", "participant_id": "john_smith"}},
    {{"type": "text", "content": " discussed "}},
    {{"type": "timestamp_link", "content": "the Q4 budget planning", "timestamp": 120}},
    {{"type": "text", "content": " while "}},
    {{"type": "participant", "content": "Sarah Johnson", "participant_id": "sarah_johnson"}},
    {{"type": "text", "content": " focused on implementation details."}}
  ],
  "participants": [
    {{"id": "john_smith", "name": "John Smith", "color": "bg-blue-50 text-blue-900"}}
  ]
}}

Guidelines:
- Write 2-4 paragraphs in past tense
- Always use participant segments for names - never write participant names as regular text
- Mark participant names with "participant" type and create participant objects
- Use at most 2-3 timestamp_link segments. Always include at least one.
- Use the EXACT participant data provided below (including color)
- Create participant_id by converting names to lowercase with underscores
- DO NOT infer timestamps for words in the middle of segments - only use actual segment start times
- Focus timestamp links on key decisions, major announcements, or pivotal discussion topics

Participants: {}

Transcript:
{}

Create a structured summary with the participants and important moments that should be clickable."#,
            participant_list, transcript_text
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                return Err(SummaryError::ApiError(error_response.error.message));
            }
            return Err(SummaryError::ApiError(error_text));
        }

        let chat_response: ChatResponse = response.json().await?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| SummaryError::InvalidResponse("No choices in response".to_string()))?;

        let summary: Summary = serde_json::from_str(&content).map_err(|e| {
            SummaryError::InvalidResponse(format!("Summary did not match the expected schema: {}", e))
        })?;

        if summary.segments.is_empty() {
            return Err(SummaryError::InvalidResponse(
                "Summary contained no segments".to_string(),
            ));
        }

        Ok(summary)
    }
}
