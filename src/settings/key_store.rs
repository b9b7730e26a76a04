use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Where an API key may come from. Sources are tried in order and the first
/// one yielding a non-empty key wins.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Environment variable holding the key directly.
    Env(String),
    /// JSON file with a `key` field.
    JsonFile(PathBuf),
}

#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn read_api_key(&self) -> Result<Option<String>>;
}

#[derive(serde::Deserialize, Default)]
struct CredentialsFile {
    key: Option<String>,
}

pub struct CredentialChain {
    sources: Vec<CredentialSource>,
}

impl CredentialChain {
    pub fn new(sources: Vec<CredentialSource>) -> Self {
        Self { sources }
    }

    /// Standard resolution order: `OPENAI_API_KEY`, then the credentials
    /// file next to the process.
    pub fn standard(credentials_file: PathBuf) -> Self {
        Self::new(vec![
            CredentialSource::Env("OPENAI_API_KEY".to_string()),
            CredentialSource::JsonFile(credentials_file),
        ])
    }

    fn read_source(source: &CredentialSource) -> Result<Option<String>> {
        match source {
            CredentialSource::Env(name) => Ok(std::env::var(name).ok()),
            CredentialSource::JsonFile(path) => {
                if !path.exists() {
                    return Ok(None);
                }
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("could not read credentials file {}", path.display()))?;
                let parsed: CredentialsFile = serde_json::from_str(&contents)
                    .with_context(|| format!("could not parse credentials file {}", path.display()))?;
                Ok(parsed.key)
            }
        }
    }
}

#[async_trait]
impl ApiKeyStore for CredentialChain {
    async fn read_api_key(&self) -> Result<Option<String>> {
        for source in &self.sources {
            if let Some(key) = Self::read_source(source)? {
                let trimmed = key.trim();
                if !trimmed.is_empty() {
                    return Ok(Some(trimmed.to_string()));
                }
            }
        }
        Ok(None)
    }
}
