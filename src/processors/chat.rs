use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::core::processor::{DeriveMode, ProcessorError, TextGenerator};
use crate::settings::key_store::ApiKeyStore;

const CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const CHAT_MODEL: &str = "gpt-3.5-turbo";
const SAMPLING_TEMPERATURE: f64 = 0.5;

const SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

const SUMMARY_INSTRUCTION: &str =
    "Please summarize the following transcription in a concise manner:";

const EXTRACTION_INSTRUCTION: &str = "\
Extract the key information from the following transcription. Report the \
main topic, any names, dates, amounts, and action items mentioned, and the \
overall sentiment (positive, negative, or neutral). Use one labelled line \
per field and write 'none' for fields that do not appear:";

pub(crate) fn build_user_message(transcript: &str, mode: DeriveMode) -> String {
    let instruction = match mode {
        DeriveMode::Summary => SUMMARY_INSTRUCTION,
        DeriveMode::Extraction => EXTRACTION_INSTRUCTION,
    };
    format!("{instruction}\n\n{transcript}")
}

/// Text generation against the OpenAI chat-completion endpoint. One request
/// per transcript, fixed low temperature, first choice consumed.
#[derive(Clone)]
pub struct ChatGenerator {
    client: reqwest::Client,
    key_store: Arc<dyn ApiKeyStore>,
}

impl ChatGenerator {
    pub fn new(key_store: Arc<dyn ApiKeyStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            key_store,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatGenerator {
    async fn derive(&self, transcript: &str, mode: DeriveMode) -> Result<String, ProcessorError> {
        // Derived text is only ever computed from a non-empty transcript.
        if transcript.trim().is_empty() {
            return Err(ProcessorError::EmptyTranscript);
        }

        let api_key = self
            .key_store
            .read_api_key()
            .await
            .map_err(|err| ProcessorError::Request(err.to_string()))?
            .ok_or(ProcessorError::MissingApiKey)?;

        let response = self
            .client
            .post(CHAT_ENDPOINT)
            .bearer_auth(api_key)
            .json(&json!({
                "model": CHAT_MODEL,
                "temperature": SAMPLING_TEMPERATURE,
                "messages": [
                    { "role": "system", "content": SYSTEM_MESSAGE },
                    { "role": "user", "content": build_user_message(transcript, mode) }
                ]
            }))
            .send()
            .await
            .map_err(|err| ProcessorError::Request(err.to_string()))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Auth(format!(
                "chat completion returned status {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Request(format!(
                "chat completion returned status {status}: {body}"
            )));
        }

        let payload: ChatResponse = response.json().await.map_err(|err| {
            ProcessorError::Request(format!("invalid chat completion payload: {err}"))
        })?;

        let content = payload
            .choices
            .into_iter()
            .map(|choice| choice.message.content)
            .find(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                ProcessorError::Request("chat completion returned no content".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_carries_the_transcript_verbatim() {
        let transcript = "we agreed to ship on Friday, pending QA sign-off";
        let message = build_user_message(transcript, DeriveMode::Summary);
        assert!(message.starts_with(SUMMARY_INSTRUCTION));
        assert!(message.ends_with(transcript));
    }

    #[test]
    fn extraction_mode_uses_the_extraction_template() {
        let message = build_user_message("hello", DeriveMode::Extraction);
        assert!(message.contains("sentiment"));
        assert!(!message.contains(SUMMARY_INSTRUCTION));
    }

    #[test]
    fn first_non_empty_choice_is_selected() {
        let payload: ChatResponse = serde_json::from_str(
            r#"{
                "choices": [
                    { "message": { "role": "assistant", "content": "  " } },
                    { "message": { "role": "assistant", "content": "A tidy summary." } }
                ]
            }"#,
        )
        .unwrap();

        let content = payload
            .choices
            .into_iter()
            .map(|choice| choice.message.content)
            .find(|content| !content.trim().is_empty());
        assert_eq!(content.as_deref(), Some("A tidy summary."));
    }
}
