mod core;
mod intake;
mod processors;
mod server;
mod settings;

use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::pipeline::BriefPipeline;
use crate::core::session::SessionStore;
use crate::intake::UploadStore;
use crate::processors::chat::ChatGenerator;
use crate::processors::whisper::WhisperTranscriber;
use crate::server::AppState;
use crate::settings::config::AppConfig;
use crate::settings::key_store::{ApiKeyStore, CredentialChain};
use crate::settings::validation::validate_openai_key;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voicebrief=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    info!("uploads directory: {}", config.upload_dir.display());

    let key_store: Arc<dyn ApiKeyStore> =
        Arc::new(CredentialChain::standard(config.credentials_file.clone()));
    match key_store.read_api_key().await {
        Ok(Some(key)) => {
            if let Err(message) = validate_openai_key(&key).await {
                warn!("{message}");
            }
        }
        Ok(None) => warn!("no OpenAI API key configured; remote calls will fail until one is provided"),
        Err(err) => warn!("could not resolve OpenAI API key: {err}"),
    }

    let sessions = Arc::new(SessionStore::new());
    let uploads = Arc::new(UploadStore::new(config.upload_dir.clone()));
    let transcriber = Arc::new(WhisperTranscriber::new(key_store.clone()));
    let generator = Arc::new(ChatGenerator::new(key_store.clone()));
    let pipeline = Arc::new(BriefPipeline::new(transcriber, generator, sessions.clone()));

    let app = server::router::create_router(AppState {
        sessions,
        pipeline,
        uploads,
    });

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("received SIGTERM, shutting down");
        },
    }
}
