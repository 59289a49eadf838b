//! Mapping errors to HTTP responses

use axum::{
    http::{header::WWW_AUTHENTICATE, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::AppState;
use crate::error::Error;
use crate::templates::SiteData;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) | Error::InvalidFilter(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error body, used by the admin API
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": message }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(WWW_AUTHENTICATE, "Basic realm=\"admin\"")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl AppState {
    /// Turn a rendered page or its error into an HTML response
    pub(super) fn html(&self, path: &str, page: crate::Result<String>) -> Response {
        match page {
            Ok(html) => Html(html).into_response(),
            Err(e) => self.error_page(path, e),
        }
    }

    pub(super) fn error_page(&self, path: &str, error: Error) -> Response {
        if !error.is_not_found() {
            tracing::error!("Failed to render {}: {}", path, error);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }

        tracing::debug!("{}: {}", path, error);
        let site = SiteData::new(&self.config, &self.store);
        match self.templates.render_not_found(&site, path) {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render the 404 page: {}", e);
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
        }
    }
}
