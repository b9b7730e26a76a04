use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::core::processor::{ProcessorError, SpeechToText, TextGenerator};
use crate::core::session::{SessionStage, SessionStore};

/// Drives one linear run per upload: transcribe, then derive. Both remote
/// clients are injected as trait objects so tests substitute stubs.
pub struct BriefPipeline {
    transcriber: Arc<dyn SpeechToText>,
    generator: Arc<dyn TextGenerator>,
    sessions: Arc<SessionStore>,
}

impl BriefPipeline {
    pub fn new(
        transcriber: Arc<dyn SpeechToText>,
        generator: Arc<dyn TextGenerator>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            transcriber,
            generator,
            sessions,
        }
    }

    /// Run the two remote calls for one session, recording stage transitions
    /// as it goes. Processor errors are caught and recorded on the session as
    /// a user-visible failure; only an unknown session id errors to the
    /// caller. Cached values short-circuit the corresponding call, so
    /// re-running a finished session issues no remote traffic.
    pub async fn run(&self, session_id: &str) -> Result<()> {
        let Some(record) = self.sessions.get(session_id).await else {
            anyhow::bail!("unknown session {session_id}");
        };

        if record.derived.is_some() {
            info!(session = session_id, "results cached; skipping remote calls");
            return Ok(());
        }

        let transcript = match record.transcript {
            Some(cached) => cached,
            None => {
                self.sessions
                    .mark_stage(session_id, SessionStage::Transcribing)
                    .await;
                let transcription = match self.transcriber.transcribe(&record.stored_path).await {
                    Ok(transcription) => transcription,
                    Err(err) => return self.fail(session_id, err).await,
                };
                info!(
                    session = session_id,
                    chars = transcription.text.len(),
                    words = transcription.words.len(),
                    spoken_secs = ?transcription.spoken_secs(),
                    "transcription finished"
                );
                self.sessions
                    .record_transcript(session_id, &transcription)
                    .await;
                transcription.text
            }
        };

        self.sessions
            .mark_stage(session_id, SessionStage::Generating)
            .await;
        let derived = match self.generator.derive(&transcript, record.mode).await {
            Ok(text) => text,
            Err(err) => return self.fail(session_id, err).await,
        };
        self.sessions.record_derived(session_id, derived).await;
        info!(session = session_id, "session complete");
        Ok(())
    }

    async fn fail(&self, session_id: &str, err: ProcessorError) -> Result<()> {
        warn!(session = session_id, error = %err, "processing failed");
        self.sessions
            .record_failure(session_id, err.to_string())
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::processor::{DeriveMode, Transcription};

    struct StubTranscriber {
        calls: AtomicUsize,
        outcome: Result<String, ProcessorError>,
    }

    impl StubTranscriber {
        fn returning(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Ok(text.to_string()),
            }
        }

        fn failing(err: ProcessorError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Err(err),
            }
        }
    }

    #[async_trait]
    impl SpeechToText for StubTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Transcription, ProcessorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(text) => Ok(Transcription {
                    text: text.clone(),
                    words: Vec::new(),
                }),
                Err(ProcessorError::Auth(msg)) => Err(ProcessorError::Auth(msg.clone())),
                Err(ProcessorError::Request(msg)) => Err(ProcessorError::Request(msg.clone())),
                Err(ProcessorError::MissingApiKey) => Err(ProcessorError::MissingApiKey),
                Err(ProcessorError::EmptyTranscript) => Err(ProcessorError::EmptyTranscript),
            }
        }
    }

    struct StubGenerator {
        calls: AtomicUsize,
        seen_transcript: Mutex<Option<String>>,
        derived: String,
    }

    impl StubGenerator {
        fn returning(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen_transcript: Mutex::new(None),
                derived: text.to_string(),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn derive(
            &self,
            transcript: &str,
            _mode: DeriveMode,
        ) -> Result<String, ProcessorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_transcript.lock().unwrap() = Some(transcript.to_string());
            Ok(self.derived.clone())
        }
    }

    async fn seeded_session(store: &SessionStore) -> String {
        store
            .create(
                "notes.m4a".to_string(),
                PathBuf::from("uploads/stub.m4a"),
                DeriveMode::Summary,
            )
            .await
    }

    #[tokio::test]
    async fn run_produces_transcript_and_derived_text() {
        let sessions = Arc::new(SessionStore::new());
        let transcriber = Arc::new(StubTranscriber::returning("the quarterly numbers"));
        let generator = Arc::new(StubGenerator::returning("Numbers discussed."));
        let pipeline = BriefPipeline::new(
            transcriber.clone(),
            generator.clone(),
            sessions.clone(),
        );

        let id = seeded_session(&sessions).await;
        pipeline.run(&id).await.unwrap();

        let record = sessions.get(&id).await.unwrap();
        assert_eq!(record.stage, SessionStage::Complete);
        assert_eq!(record.transcript.as_deref(), Some("the quarterly numbers"));
        assert_eq!(record.derived.as_deref(), Some("Numbers discussed."));
        assert_eq!(
            generator.seen_transcript.lock().unwrap().as_deref(),
            Some("the quarterly numbers")
        );
    }

    #[tokio::test]
    async fn second_run_issues_no_remote_calls() {
        let sessions = Arc::new(SessionStore::new());
        let transcriber = Arc::new(StubTranscriber::returning("once only"));
        let generator = Arc::new(StubGenerator::returning("Once."));
        let pipeline = BriefPipeline::new(
            transcriber.clone(),
            generator.clone(),
            sessions.clone(),
        );

        let id = seeded_session(&sessions).await;
        pipeline.run(&id).await.unwrap();
        pipeline.run(&id).await.unwrap();

        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn auth_failure_is_recorded_and_halts_generation() {
        let sessions = Arc::new(SessionStore::new());
        let transcriber = Arc::new(StubTranscriber::failing(ProcessorError::Auth(
            "status 401".to_string(),
        )));
        let generator = Arc::new(StubGenerator::returning("never"));
        let pipeline = BriefPipeline::new(
            transcriber.clone(),
            generator.clone(),
            sessions.clone(),
        );

        let id = seeded_session(&sessions).await;
        pipeline.run(&id).await.unwrap();

        let record = sessions.get(&id).await.unwrap();
        assert_eq!(record.stage, SessionStage::Failed);
        assert!(record.error.as_deref().unwrap().contains("401"));
        assert!(record.derived.is_none());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let sessions = Arc::new(SessionStore::new());
        let pipeline = BriefPipeline::new(
            Arc::new(StubTranscriber::returning("x")),
            Arc::new(StubGenerator::returning("y")),
            sessions,
        );
        assert!(pipeline.run("missing").await.is_err());
    }
}
