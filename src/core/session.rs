use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::processor::{DeriveMode, Transcription};

/// Pipeline progress for one uploaded file. Transitions only move forward;
/// `Failed` is reachable from the two calling stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Received,
    Transcribing,
    Transcribed,
    Generating,
    Complete,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: String,
    /// Client-supplied name, kept for display only. The bytes live under a
    /// generated storage name.
    pub file_name: String,
    pub stored_path: PathBuf,
    pub mode: DeriveMode,
    pub stage: SessionStage,
    pub transcript: Option<String>,
    pub word_count: Option<usize>,
    pub spoken_secs: Option<f32>,
    pub derived: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// In-memory cache of session results. A record is written only by the
/// request that created it; re-renders read the cached values instead of
/// re-issuing paid remote calls.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(
        &self,
        file_name: String,
        stored_path: PathBuf,
        mode: DeriveMode,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let record = SessionRecord {
            id: id.clone(),
            file_name,
            stored_path,
            mode,
            stage: SessionStage::Received,
            transcript: None,
            word_count: None,
            spoken_secs: None,
            derived: None,
            error: None,
            created_at: Utc::now(),
        };
        self.sessions.write().await.insert(id.clone(), record);
        id
    }

    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn mark_stage(&self, id: &str, stage: SessionStage) {
        if let Some(record) = self.sessions.write().await.get_mut(id) {
            record.stage = stage;
        }
    }

    pub async fn record_transcript(&self, id: &str, transcription: &Transcription) {
        if let Some(record) = self.sessions.write().await.get_mut(id) {
            record.transcript = Some(transcription.text.clone());
            if !transcription.words.is_empty() {
                record.word_count = Some(transcription.words.len());
            }
            record.spoken_secs = transcription.spoken_secs();
            record.stage = SessionStage::Transcribed;
        }
    }

    pub async fn record_derived(&self, id: &str, derived: String) {
        if let Some(record) = self.sessions.write().await.get_mut(id) {
            record.derived = Some(derived);
            record.stage = SessionStage::Complete;
        }
    }

    pub async fn record_failure(&self, id: &str, message: String) {
        if let Some(record) = self.sessions.write().await.get_mut(id) {
            record.error = Some(message);
            record.stage = SessionStage::Failed;
        }
    }
}
