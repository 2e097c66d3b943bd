use tracing::{error, info, warn};

use crate::modules::meeting::crud::{MeetingStore, StoreError};
use crate::modules::meeting::model::{MeetingStatus, Summary, TranscriptSegment, FALLBACK_TITLE};
use crate::modules::webhook::schema::{InlineTranscriptSegment, WebhookData, WebhookEvent};
use crate::services::recall::{
    BotDetail, ParticipantEvent, RecallClient, Recording, TranscriptEntry,
};
use crate::services::summary::SummaryClient;

pub struct ProcessedBotData {
    pub title: String,
    pub participants: Vec<String>,
    pub duration: Option<String>,
    pub transcript: Vec<TranscriptSegment>,
}

/// Reconciles a meeting record against a webhook event. Runs detached from
/// the webhook response; every failure path still leaves the record in a
/// terminal, renderable state.
pub async fn process_event(
    store: MeetingStore,
    meeting_id: String,
    bot_id: String,
    event: WebhookEvent,
    data: WebhookData,
) -> Result<(), StoreError> {
    info!(
        meeting_id = %meeting_id,
        bot_id = %bot_id,
        event = event.as_str(),
        "starting webhook reconciliation"
    );

    let Some(meeting) = store.find_by_id(&meeting_id).await? else {
        warn!(meeting_id = %meeting_id, "meeting disappeared before reconciliation");
        return Ok(());
    };

    // First terminal state wins: redelivered events for a finished meeting
    // must not overwrite its data.
    if meeting.status.is_terminal() {
        info!(
            meeting_id = %meeting_id,
            status = meeting.status.as_str(),
            event = event.as_str(),
            "meeting already terminal, skipping event"
        );
        return Ok(());
    }

    match event {
        WebhookEvent::Done => handle_bot_done(&store, &meeting_id, &bot_id).await,
        WebhookEvent::VideoCallEnded | WebhookEvent::RecordingReady => {
            handle_fallback(&store, &meeting_id, &bot_id, data).await
        }
        WebhookEvent::Error => {
            store
                .update(&meeting_id, |m| {
                    m.advance(MeetingStatus::Errored);
                })
                .await?;
            info!(meeting_id = %meeting_id, bot_id = %bot_id, "meeting marked errored");
            Ok(())
        }
    }
}

async fn handle_bot_done(
    store: &MeetingStore,
    meeting_id: &str,
    bot_id: &str,
) -> Result<(), StoreError> {
    let fetched = match RecallClient::new() {
        Ok(client) => match client.get_bot(bot_id).await {
            Ok(bot) => Some((client, bot)),
            Err(e) => {
                error!(meeting_id = %meeting_id, bot_id = %bot_id, error = %e, "failed to retrieve bot detail");
                None
            }
        },
        Err(e) => {
            error!(meeting_id = %meeting_id, bot_id = %bot_id, error = %e, "recording bot client unavailable");
            None
        }
    };

    // The remote service reported completion, so the record reaches `done`
    // even when no data could be fetched.
    let Some((client, bot)) = fetched else {
        store
            .update(meeting_id, |m| {
                if m.advance(MeetingStatus::Done) {
                    m.title = FALLBACK_TITLE.to_string();
                }
            })
            .await?;
        info!(meeting_id = %meeting_id, "meeting marked done without bot data");
        return Ok(());
    };

    let processed = process_bot_detail(&client, &bot).await;
    let transcript =
        (!processed.transcript.is_empty()).then(|| processed.transcript.clone());

    let basics_transcript = transcript.clone();
    store
        .update(meeting_id, |m| {
            if !m.advance(MeetingStatus::Processing) {
                return;
            }
            m.title = processed.title.clone();
            m.participants = processed.participants.clone();
            if processed.duration.is_some() {
                m.duration = processed.duration.clone();
            }
            if let Some(t) = basics_transcript {
                m.transcript = Some(t);
            }
        })
        .await?;
    info!(meeting_id = %meeting_id, "meeting updated to processing");

    let summary = match &transcript {
        Some(t) => try_generate_summary(t, &processed.participants, meeting_id, bot_id).await,
        None => None,
    };

    store
        .update(meeting_id, |m| {
            if m.advance(MeetingStatus::Done) {
                if let Some(s) = summary {
                    m.summary = Some(s);
                }
            }
        })
        .await?;
    info!(meeting_id = %meeting_id, bot_id = %bot_id, "webhook reconciliation complete");
    Ok(())
}

async fn handle_fallback(
    store: &MeetingStore,
    meeting_id: &str,
    bot_id: &str,
    data: WebhookData,
) -> Result<(), StoreError> {
    // The fallback events carry whatever metadata the remote service inlined
    // in the payload; nothing is fetched separately.
    let transcript = data
        .transcript_segments
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(transcript_from_inline_segments);

    let metadata = data.meeting_metadata.unwrap_or_default();
    let title = metadata.title.unwrap_or_else(|| FALLBACK_TITLE.to_string());
    let participants = metadata.participants.unwrap_or_default();

    let basics_transcript = transcript.clone();
    let basics_participants = participants.clone();
    store
        .update(meeting_id, |m| {
            if !m.advance(MeetingStatus::Processing) {
                return;
            }
            m.title = title;
            m.participants = basics_participants;
            if let Some(t) = basics_transcript {
                m.transcript = Some(t);
            }
        })
        .await?;
    info!(meeting_id = %meeting_id, "meeting updated to processing (fallback)");

    let summary = match &transcript {
        Some(t) => try_generate_summary(t, &participants, meeting_id, bot_id).await,
        None => None,
    };

    store
        .update(meeting_id, |m| {
            if m.advance(MeetingStatus::Done) {
                if let Some(s) = summary {
                    m.summary = Some(s);
                }
            }
        })
        .await?;
    info!(meeting_id = %meeting_id, bot_id = %bot_id, "webhook reconciliation complete (fallback)");
    Ok(())
}

/// Summary failure on the webhook path is degraded success: the meeting
/// still completes, just without a summary.
async fn try_generate_summary(
    transcript: &[TranscriptSegment],
    participants: &[String],
    meeting_id: &str,
    bot_id: &str,
) -> Option<Summary> {
    let client = match SummaryClient::new() {
        Ok(client) => client,
        Err(e) => {
            error!(meeting_id = %meeting_id, bot_id = %bot_id, error = %e, "summary client unavailable");
            return None;
        }
    };

    match client.generate(transcript, participants).await {
        Ok(summary) => {
            info!(meeting_id = %meeting_id, bot_id = %bot_id, "summary generated");
            Some(summary)
        }
        Err(e) => {
            error!(meeting_id = %meeting_id, bot_id = %bot_id, error = %e, "failed to generate summary");
            None
        }
    }
}

pub async fn process_bot_detail(client: &RecallClient, bot: &BotDetail) -> ProcessedBotData {
    let duration = calculate_duration(&bot.recordings);
    let participants = extract_participants(client, bot).await;
    let transcript = extract_transcript(client, bot).await;
    let title = bot
        .meeting_metadata
        .as_ref()
        .and_then(|m| m.title.clone())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    ProcessedBotData {
        title,
        participants,
        duration,
        transcript,
    }
}

/// Elapsed time of the first recording that has both timestamps, rounded to
/// the nearest minute.
pub fn calculate_duration(recordings: &[Recording]) -> Option<String> {
    let recording = recordings
        .iter()
        .find(|r| r.started_at.is_some() && r.completed_at.is_some())?;

    let start = recording.started_at?;
    let end = recording.completed_at?;

    let elapsed_ms = (end - start).num_milliseconds();
    let minutes = (elapsed_ms as f64 / 60_000.0).round() as i64;

    Some(format!("{} min", minutes))
}

async fn extract_participants(client: &RecallClient, bot: &BotDetail) -> Vec<String> {
    let Some(url) = bot.participants_download_url() else {
        return Vec::new();
    };

    match client.fetch_artifact::<Vec<ParticipantEvent>>(&url).await {
        Ok(events) => events
            .into_iter()
            .filter_map(|p| p.name)
            .filter(|name| !name.is_empty())
            .collect(),
        Err(e) => {
            warn!(bot_id = %bot.id, error = %e, "failed to download participant list");
            Vec::new()
        }
    }
}

async fn extract_transcript(client: &RecallClient, bot: &BotDetail) -> Vec<TranscriptSegment> {
    let Some(url) = bot.transcript_download_url() else {
        return Vec::new();
    };

    match client.fetch_artifact::<Vec<TranscriptEntry>>(&url).await {
        Ok(entries) => transcript_from_entries(entries),
        Err(e) => {
            warn!(bot_id = %bot.id, error = %e, "failed to download transcript");
            Vec::new()
        }
    }
}

/// One segment per speaker turn: word tokens joined with single spaces,
/// timestamps taken from the first and last word's relative fields.
pub fn transcript_from_entries(entries: Vec<TranscriptEntry>) -> Vec<TranscriptSegment> {
    entries
        .into_iter()
        .map(|entry| {
            let speaker_name = entry.participant.as_ref().and_then(|p| p.name.clone());
            let speaker_id = entry.participant.as_ref().and_then(|p| p.id.clone());

            if entry.words.is_empty() {
                return TranscriptSegment {
                    speaker_name,
                    speaker_id,
                    text: String::new(),
                    start_seconds: None,
                    end_seconds: None,
                };
            }

            let text = entry
                .words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let start_seconds = entry
                .words
                .first()
                .and_then(|w| w.start_timestamp.as_ref())
                .and_then(|t| t.relative);
            let end_seconds = entry
                .words
                .last()
                .and_then(|w| w.end_timestamp.as_ref())
                .and_then(|t| t.relative);

            TranscriptSegment {
                speaker_name,
                speaker_id,
                text,
                start_seconds,
                end_seconds,
            }
        })
        .collect()
}

/// Inline webhook segments carry no timing data, so the timestamps stay
/// absent and speaker ids fall back to the segment index.
pub fn transcript_from_inline_segments(
    segments: &[InlineTranscriptSegment],
) -> Vec<TranscriptSegment> {
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| TranscriptSegment {
            speaker_name: Some(segment.speaker.clone()),
            speaker_id: Some(index.to_string()),
            text: segment.text.clone(),
            start_seconds: None,
            end_seconds: None,
        })
        .collect()
}
