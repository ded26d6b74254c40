use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::ErrorReport;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            let err = TemplateRenderError::new(
                "presentation::views::render_template_response",
                "Template rendering failed",
                err,
            );
            let mut response = (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error: {err}"),
            )
                .into_response();
            ErrorReport::from_error(err.source, StatusCode::INTERNAL_SERVER_ERROR, &err)
                .attach(&mut response);
            response
        }
    }
}

/// Interactive form UI at `/`.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate;

/// Full HTML document wrapping the combined markup and stylesheet.
#[derive(Template)]
#[template(path = "deck.html")]
pub struct DeckTemplate {
    pub stylesheet: String,
    pub markup: String,
}

/// `/generate` snippet pointing at a deck or page link.
#[derive(Template)]
#[template(path = "generate_link.html")]
pub struct GenerateLinkTemplate {
    pub link: String,
}

/// `/generate` snippet carrying embed code for every page.
#[derive(Template)]
#[template(path = "generate_code.html")]
pub struct GenerateCodeTemplate {
    pub code: String,
}
