use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PLACEHOLDER_TITLE: &str = "Meeting in Progress";
pub const FALLBACK_TITLE: &str = "Completed Meeting";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    InProgress,
    Processing,
    Done,
    Errored,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::InProgress => "in_progress",
            MeetingStatus::Processing => "processing",
            MeetingStatus::Done => "done",
            MeetingStatus::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Done | MeetingStatus::Errored)
    }

    /// Legal transitions only move forward; terminal states never change.
    pub fn can_advance_to(&self, next: MeetingStatus) -> bool {
        if *self == next {
            return !self.is_terminal();
        }

        matches!(
            (*self, next),
            (
                MeetingStatus::InProgress,
                MeetingStatus::Processing | MeetingStatus::Done | MeetingStatus::Errored
            ) | (
                MeetingStatus::Processing,
                MeetingStatus::Done | MeetingStatus::Errored
            )
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub speaker_name: Option<String>,
    pub speaker_id: Option<String>,
    #[serde(default)]
    pub text: String,
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummarySegment {
    Text { content: String },
    Participant { content: String, participant_id: String },
    TimestampLink { content: String, timestamp: f64 },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParticipantInfo {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Summary {
    pub segments: Vec<SummarySegment>,
    pub participants: Vec<ParticipantInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MeetingNote {
    pub id: String,
    pub status: MeetingStatus,
    pub meeting_url: String,
    pub bot_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub participants: Vec<String>,
    pub transcript: Option<Vec<TranscriptSegment>>,
    pub summary: Option<Summary>,
    pub duration: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MeetingNote {
    pub fn new(meeting_url: String, bot_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            status: MeetingStatus::InProgress,
            meeting_url,
            bot_id,
            title: PLACEHOLDER_TITLE.to_string(),
            participants: Vec::new(),
            transcript: None,
            summary: None,
            duration: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the transition only when it is legal, returning whether the
    /// status actually changed to `next`.
    pub fn advance(&mut self, next: MeetingStatus) -> bool {
        if !self.status.can_advance_to(next) {
            return false;
        }
        self.status = next;
        true
    }
}
