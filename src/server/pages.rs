use axum::extract::{Path, State};
use axum::response::Html;

use crate::core::session::{SessionRecord, SessionStage};
use crate::server::error::PageError;
use crate::server::AppState;

/// Upload form. Static: the page carries no per-request data.
pub async fn index() -> Html<&'static str> {
    const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(INDEX)
}

/// Result page for one session: title, upload notice, transcript, derived
/// text, or the recorded failure. Refreshing re-renders from the cache only.
pub async fn session_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let record = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| PageError::not_found(format!("no session with id {id}")))?;
    Ok(Html(render_session(&record)))
}

fn render_session(record: &SessionRecord) -> String {
    let mut body = String::new();
    body.push_str("<h1>Audio Transcription and Summarization</h1>\n");
    body.push_str(&format!(
        "<p class=\"notice\">File uploaded successfully: {}</p>\n",
        escape_html(&record.file_name)
    ));
    body.push_str(&format!(
        "<p class=\"meta\">Received {}</p>\n",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    match record.stage {
        SessionStage::Received | SessionStage::Transcribing => {
            body.push_str("<p class=\"pending\">Transcribing audio... refresh to update.</p>\n");
        }
        SessionStage::Generating => {
            body.push_str("<p class=\"pending\">Summarizing transcription... refresh to update.</p>\n");
        }
        SessionStage::Transcribed | SessionStage::Complete | SessionStage::Failed => {}
    }

    if let Some(transcript) = &record.transcript {
        body.push_str("<h2>Full Transcription</h2>\n");
        if let Some(count) = record.word_count {
            match record.spoken_secs {
                Some(secs) => body.push_str(&format!(
                    "<p class=\"meta\">{count} words over {secs:.1}s of speech</p>\n"
                )),
                None => body.push_str(&format!("<p class=\"meta\">{count} words</p>\n")),
            }
        }
        body.push_str(&format!("<p>{}</p>\n", escape_html(transcript)));
    }

    if let Some(derived) = &record.derived {
        body.push_str(&format!("<h2>{}</h2>\n", record.mode.label()));
        body.push_str(&format!("<p>{}</p>\n", escape_html(derived)));
    }

    if let Some(error) = &record.error {
        body.push_str(&format!(
            "<p class=\"error\">Processing failed: {}</p>\n",
            escape_html(error)
        ));
    }

    body.push_str("<p><a href=\"/\">Upload another file</a></p>\n");

    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Audio Transcription and Summarization</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}\n\
         .notice {{ color: #2a7a2a; }}\n\
         .pending {{ color: #666; }}\n\
         .meta {{ color: #666; font-size: 0.9rem; }}\n\
         .error {{ color: #b00020; }}\n\
         </style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::Utc;

    use super::*;
    use crate::core::processor::DeriveMode;

    fn record(stage: SessionStage) -> SessionRecord {
        SessionRecord {
            id: "abc".to_string(),
            file_name: "standup.mp3".to_string(),
            stored_path: PathBuf::from("uploads/abc.mp3"),
            mode: DeriveMode::Summary,
            stage,
            transcript: None,
            word_count: None,
            spoken_secs: None,
            derived: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn escapes_markup_in_dynamic_text() {
        assert_eq!(
            escape_html("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn complete_session_shows_both_text_blocks() {
        let mut rec = record(SessionStage::Complete);
        rec.transcript = Some("we shipped <it>".to_string());
        rec.derived = Some("Shipped.".to_string());

        let html = render_session(&rec);
        assert!(html.contains("Full Transcription"));
        assert!(html.contains("we shipped &lt;it&gt;"));
        assert!(html.contains("<h2>Summary</h2>"));
        assert!(html.contains("Shipped."));
        assert!(!html.contains("Processing failed"));
    }

    #[test]
    fn failed_session_shows_the_error_and_no_derived_block() {
        let mut rec = record(SessionStage::Failed);
        rec.error = Some("remote service rejected the API key".to_string());

        let html = render_session(&rec);
        assert!(html.contains("Processing failed"));
        assert!(html.contains("rejected the API key"));
        assert!(!html.contains("<h2>Summary</h2>"));
    }

    #[test]
    fn in_flight_session_shows_a_loading_hint() {
        let html = render_session(&record(SessionStage::Transcribing));
        assert!(html.contains("Transcribing audio"));
    }
}
