use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::cache::DeckCacheError, application::fetch::FetchError,
    application::render::RenderError, domain::error::DomainError, infra::error::InfraError,
};

/// Diagnostic attached to failing responses so the logging middleware can
/// report the full message chain without leaking it to the client body.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Failures of the deck pipeline. All are terminal for the request and are
/// surfaced verbatim; none are retried.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error(transparent)]
    Cache(#[from] DeckCacheError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl DeckError {
    fn status_code(&self) -> StatusCode {
        match self {
            DeckError::Domain(DomainError::PageOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_body(&self) -> String {
        match self {
            // the bound message is the response body, without prefix
            DeckError::Domain(DomainError::PageOutOfRange { .. }) => self.to_string(),
            other => format!("Error: {other}"),
        }
    }
}

impl IntoResponse for DeckError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.public_body();
        let report = ErrorReport::from_error("application::error::DeckError", status, &self);
        let mut response = (status, body).into_response();
        report.attach(&mut response);
        response
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
