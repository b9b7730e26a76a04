use std::path::Path;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("no OpenAI API key configured")]
    MissingApiKey,
    #[error("remote service rejected the API key: {0}")]
    Auth(String),
    #[error("remote request failed: {0}")]
    Request(String),
    #[error("transcription response was empty")]
    EmptyTranscript,
}

/// Transcript text plus the word-level timing metadata the vendor returns.
/// Only the text flows into generation; the timings surface as display
/// metadata on the session page.
#[derive(Debug, Clone, Default)]
pub struct Transcription {
    pub text: String,
    pub words: Vec<TranscriptWord>,
}

#[derive(Debug, Clone)]
pub struct TranscriptWord {
    pub word: String,
    pub start: f32,
    pub end: f32,
}

impl Transcription {
    /// Seconds between the first and last spoken word, when timings exist.
    pub fn spoken_secs(&self) -> Option<f32> {
        match (self.words.first(), self.words.last()) {
            (Some(first), Some(last)) => Some((last.end - first.start).max(0.0)),
            _ => None,
        }
    }
}

/// Which instruction template drives the text-generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveMode {
    Summary,
    Extraction,
}

impl DeriveMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "summary" => Some(Self::Summary),
            "extraction" => Some(Self::Extraction),
            _ => None,
        }
    }

    /// Heading shown above the derived-text block.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::Extraction => "Extracted Details",
        }
    }
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcription, ProcessorError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn derive(&self, transcript: &str, mode: DeriveMode) -> Result<String, ProcessorError>;
}
