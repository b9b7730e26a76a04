use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::intake::IntakeError;
use crate::server::pages::escape_html;

/// Request-level error, rendered as a minimal page.
#[derive(Debug)]
pub struct PageError {
    pub status: StatusCode,
    pub message: String,
}

impl PageError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let body = Html(format!(
            "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Voicebrief</title></head>\
             <body><h1>{}</h1><p>{}</p><p><a href=\"/\">Back to upload</a></p></body></html>",
            self.status,
            escape_html(&self.message)
        ));
        (self.status, body).into_response()
    }
}

impl From<IntakeError> for PageError {
    fn from(err: IntakeError) -> Self {
        match &err {
            IntakeError::UnsupportedExtension(_) => PageError::bad_request(err.to_string()),
            IntakeError::Io(_) => PageError::internal(err.to_string()),
        }
    }
}
