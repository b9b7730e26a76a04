use std::path::PathBuf;

use tracing::warn;

const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration, resolved from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub credentials_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host =
            std::env::var("VOICEBRIEF_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match std::env::var("VOICEBRIEF_PORT") {
            Ok(raw) => match raw.parse::<u16>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    warn!("invalid VOICEBRIEF_PORT='{}', falling back to {}", raw, DEFAULT_PORT);
                    DEFAULT_PORT
                }
            },
            Err(_) => DEFAULT_PORT,
        };
        let upload_dir = std::env::var("VOICEBRIEF_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        let credentials_file = std::env::var("VOICEBRIEF_CREDENTIALS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("secrets.json"));

        Self {
            host,
            port,
            upload_dir,
            credentials_file,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
