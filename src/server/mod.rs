pub mod error;
pub mod pages;
pub mod router;
pub mod upload;

use std::sync::Arc;

use crate::core::pipeline::BriefPipeline;
use crate::core::session::SessionStore;
use crate::intake::UploadStore;

/// Shared handler state. Everything is behind an Arc so router clones stay
/// cheap.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub pipeline: Arc<BriefPipeline>,
    pub uploads: Arc<UploadStore>,
}
