//! Error types for txconsole-api

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use txconsole_core::{log_error, CoreError, ErrorDetails};
use txconsole_utils::escape_html;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {message}")]
    BadRequest { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(error) => match error {
                CoreError::NetworkError { .. } | CoreError::HttpStatus { .. } | CoreError::DecodeError { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                CoreError::InvalidField { .. }
                | CoreError::UnknownField { .. }
                | CoreError::ValidationError { .. }
                | CoreError::SessionNotFound => StatusCode::BAD_REQUEST,
                CoreError::TransactionNotFound { .. } | CoreError::EditorNotOpen { .. } => StatusCode::NOT_FOUND,
                CoreError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn details(&self) -> Option<ErrorDetails> {
        match self {
            ApiError::Core(error) => Some(error.to_details()),
            _ => None,
        }
    }
}

/// Dismissable error panel swapped into the request's target
pub fn error_panel(title: &str, message: &str, suggestions: &[String]) -> String {
    let hints: String = suggestions
        .iter()
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect();
    format!(
        r#"<div class='console-error bg-red-50 border border-red-200 rounded-lg p-4' role='alert'>
    <div class='flex items-center justify-between'>
        <span class='font-medium text-red-800'>{}</span>
        <button type='button' onclick='this.closest(".console-error").remove()' class='text-red-400 hover:text-red-600'>&times;</button>
    </div>
    <p class='text-sm text-red-600 mt-1'>{}</p>
    <ul class='text-sm text-red-500 mt-2 list-disc list-inside'>{}</ul>
</div>"#,
        escape_html(title),
        escape_html(message),
        hints
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Core(ref error) = self {
            log_error("Console request", error);
        } else {
            log::warn!("Console request failed: {}", self);
        }

        let body = match self.details() {
            Some(details) => error_panel(&status.to_string(), &details.message, &details.suggestions),
            None => error_panel(&status.to_string(), &self.to_string(), &[]),
        };
        (status, Html(body)).into_response()
    }
}
