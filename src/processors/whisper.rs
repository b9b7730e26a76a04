use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::core::processor::{ProcessorError, SpeechToText, Transcription, TranscriptWord};
use crate::settings::key_store::ApiKeyStore;

const TRANSCRIPTION_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";
const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Speech-to-text against the OpenAI transcription endpoint. Requests the
/// verbose response with word-level timestamps.
#[derive(Clone)]
pub struct WhisperTranscriber {
    client: reqwest::Client,
    key_store: Arc<dyn ApiKeyStore>,
}

impl WhisperTranscriber {
    pub fn new(key_store: Arc<dyn ApiKeyStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            key_store,
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcription, ProcessorError> {
        let api_key = self
            .key_store
            .read_api_key()
            .await
            .map_err(|err| ProcessorError::Request(err.to_string()))?
            .ok_or(ProcessorError::MissingApiKey)?;

        let audio_bytes = std::fs::read(audio_path).map_err(|err| {
            ProcessorError::Request(format!("could not read audio file: {err}"))
        })?;
        let file_name = audio_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio")
            .to_string();

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(audio_bytes).file_name(file_name))
            .text("model", TRANSCRIPTION_MODEL)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");

        let response = self
            .client
            .post(TRANSCRIPTION_ENDPOINT)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| ProcessorError::Request(err.to_string()))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Auth(format!(
                "transcription returned status {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Request(format!(
                "transcription returned status {status}: {body}"
            )));
        }

        let payload: VerboseTranscription = response.json().await.map_err(|err| {
            ProcessorError::Request(format!("invalid transcription payload: {err}"))
        })?;

        parse_transcription(payload)
    }
}

fn parse_transcription(payload: VerboseTranscription) -> Result<Transcription, ProcessorError> {
    if payload.text.trim().is_empty() {
        return Err(ProcessorError::EmptyTranscript);
    }

    let words = payload
        .words
        .unwrap_or_default()
        .into_iter()
        .map(|word| TranscriptWord {
            word: word.word,
            start: word.start,
            end: word.end,
        })
        .collect();

    Ok(Transcription {
        text: payload.text,
        words,
    })
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    words: Option<Vec<VerboseWord>>,
}

#[derive(Debug, Deserialize)]
struct VerboseWord {
    word: String,
    start: f32,
    end: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbose_payload_with_words() {
        let payload: VerboseTranscription = serde_json::from_str(
            r#"{
                "text": "hello world",
                "duration": 1.9,
                "words": [
                    { "word": "hello", "start": 0.1, "end": 0.6 },
                    { "word": "world", "start": 0.8, "end": 1.3 }
                ]
            }"#,
        )
        .unwrap();

        let transcription = parse_transcription(payload).unwrap();
        assert_eq!(transcription.text, "hello world");
        assert_eq!(transcription.words.len(), 2);
        assert_eq!(transcription.words[0].word, "hello");
        assert!((transcription.spoken_secs().unwrap() - 1.2).abs() < 1e-6);
    }

    #[test]
    fn words_are_optional_in_the_payload() {
        let payload: VerboseTranscription =
            serde_json::from_str(r#"{ "text": "just text" }"#).unwrap();
        let transcription = parse_transcription(payload).unwrap();
        assert_eq!(transcription.text, "just text");
        assert!(transcription.words.is_empty());
    }

    #[test]
    fn blank_transcript_is_an_error() {
        let payload: VerboseTranscription =
            serde_json::from_str(r#"{ "text": "   " }"#).unwrap();
        assert!(matches!(
            parse_transcription(payload),
            Err(ProcessorError::EmptyTranscript)
        ));
    }
}
