use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use crate::modules::meeting::model::MeetingNote;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One JSON file per meeting, named by record id. Writes to the same record
/// are serialized through a per-id lock so concurrent webhook deliveries
/// apply in order instead of clobbering each other.
#[derive(Clone)]
pub struct MeetingStore {
    root: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl MeetingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    async fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id.to_string()).or_default().clone()
    }

    async fn write_record(&self, meeting: &MeetingNote) -> Result<(), StoreError> {
        self.ensure_root().await?;
        let json = serde_json::to_vec_pretty(meeting)?;
        fs::write(self.record_path(&meeting.id), json).await?;
        Ok(())
    }

    pub async fn create(&self, meeting: &MeetingNote) -> Result<(), StoreError> {
        self.write_record(meeting).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<MeetingNote>, StoreError> {
        match fs::read(self.record_path(id)).await {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_all(&self) -> Result<Vec<MeetingNote>, StoreError> {
        self.ensure_root().await?;

        let mut meetings = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = fs::read(&path).await?;
            match serde_json::from_slice::<MeetingNote>(&content) {
                Ok(meeting) => meetings.push(meeting),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unparseable meeting file"),
            }
        }

        meetings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(meetings)
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.find_all().await?.len() as u64)
    }

    pub async fn find_by_bot_id(&self, bot_id: &str) -> Result<Option<MeetingNote>, StoreError> {
        let meetings = self.find_all().await?;
        Ok(meetings
            .into_iter()
            .find(|m| m.bot_id.as_deref() == Some(bot_id)))
    }

    /// Whole-record read-modify-write under the record's lock. The closure
    /// cannot change `id` or `created_at`; `updated_at` is stamped on every
    /// write.
    pub async fn update<F>(&self, id: &str, apply: F) -> Result<Option<MeetingNote>, StoreError>
    where
        F: FnOnce(&mut MeetingNote),
    {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let Some(mut meeting) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let record_id = meeting.id.clone();
        let created_at = meeting.created_at;

        apply(&mut meeting);

        meeting.id = record_id;
        meeting.created_at = created_at;
        meeting.updated_at = Utc::now();

        self.write_record(&meeting).await?;
        Ok(Some(meeting))
    }
}
