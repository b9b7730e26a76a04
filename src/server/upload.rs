use axum::extract::{Multipart, State};
use axum::response::Redirect;
use tracing::info;

use crate::core::processor::DeriveMode;
use crate::intake::UploadStore;
use crate::server::error::PageError;
use crate::server::AppState;

/// Multipart upload handler: intake, then the full pipeline, synchronously
/// within this request. The redirect means a browser refresh of the result
/// page replays only the cached render.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, PageError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut mode = DeriveMode::Summary;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| PageError::bad_request(format!("invalid multipart payload: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|err| {
                    PageError::bad_request(format!("failed reading upload field: {err}"))
                })?;
                if !bytes.is_empty() {
                    file = Some((file_name, bytes.to_vec()));
                }
            }
            "mode" => {
                let text = field.text().await.map_err(|err| {
                    PageError::bad_request(format!("failed reading mode field: {err}"))
                })?;
                if let Some(parsed) = DeriveMode::parse(text.trim()) {
                    mode = parsed;
                }
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(PageError::bad_request("missing audio file field"));
    };

    // Reject a bad extension before writing anything or calling out.
    UploadStore::accepted_extension(&file_name)?;

    let stored = state.uploads.save(&file_name, &bytes)?;
    info!(
        file = %stored.file_name,
        path = %stored.path.display(),
        bytes = bytes.len(),
        "upload stored"
    );

    let session_id = state
        .sessions
        .create(stored.file_name, stored.path, mode)
        .await;
    state
        .pipeline
        .run(&session_id)
        .await
        .map_err(|err| PageError::internal(err.to_string()))?;

    Ok(Redirect::to(&format!("/sessions/{session_id}")))
}
