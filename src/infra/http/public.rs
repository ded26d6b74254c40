use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::deck::{DeckService, EmbedStyle},
    application::error::ErrorReport,
    presentation::views::{
        DeckTemplate, GenerateCodeTemplate, GenerateLinkTemplate, IndexTemplate,
        render_template_response,
    },
};

use super::middleware::{log_responses, set_request_context};

const MISSING_URL_BODY: &str = "Missing ?url=https://path.to/deck.md";
const UNSUPPORTED_FORMAT_BODY: &str = "Unsupported format";

#[derive(Clone)]
pub struct HttpState {
    pub decks: Arc<DeckService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/svg", get(page_svg))
        .route("/html", get(deck_html))
        .route("/md", get(markdown_embed))
        .route("/sb", get(bracket_embed))
        .route("/generate", get(generate))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeckQuery {
    url: Option<String>,
    page: Option<String>,
    format: Option<String>,
}

async fn index() -> Response {
    render_template_response(IndexTemplate, StatusCode::OK)
}

async fn page_svg(State(state): State<HttpState>, Query(query): Query<DeckQuery>) -> Response {
    let Some(url) = query.url.as_deref() else {
        return missing_url_response();
    };

    let index = parse_page_param(query.page.as_deref());
    match state.decks.page(url, index).await {
        Ok(markup) => svg_response(markup),
        Err(err) => err.into_response(),
    }
}

async fn deck_html(State(state): State<HttpState>, Query(query): Query<DeckQuery>) -> Response {
    let Some(url) = query.url.as_deref() else {
        return missing_url_response();
    };

    match state.decks.document(url).await {
        Ok(document) => render_template_response(
            DeckTemplate {
                stylesheet: document.stylesheet,
                markup: document.markup,
            },
            StatusCode::OK,
        ),
        Err(err) => err.into_response(),
    }
}

async fn markdown_embed(State(state): State<HttpState>, Query(query): Query<DeckQuery>) -> Response {
    embed_response(&state, query.url.as_deref(), EmbedStyle::Image).await
}

async fn bracket_embed(State(state): State<HttpState>, Query(query): Query<DeckQuery>) -> Response {
    embed_response(&state, query.url.as_deref(), EmbedStyle::Bracket).await
}

async fn embed_response(state: &HttpState, url: Option<&str>, style: EmbedStyle) -> Response {
    let Some(url) = url else {
        return missing_url_response();
    };

    match state.decks.embed_lines(url, style).await {
        Ok(lines) => plain_response(lines),
        Err(err) => err.into_response(),
    }
}

async fn generate(State(state): State<HttpState>, Query(query): Query<DeckQuery>) -> Response {
    let Some(url) = query.url.as_deref() else {
        return missing_url_response();
    };

    match query.format.as_deref().unwrap_or("html") {
        "html" => render_template_response(
            GenerateLinkTemplate {
                link: format!("/html?url={url}"),
            },
            StatusCode::OK,
        ),
        "svg" => {
            let page = parse_page_selection(query.page.as_deref());
            render_template_response(
                GenerateLinkTemplate {
                    link: format!("/svg?url={url}&page={page}.svg"),
                },
                StatusCode::OK,
            )
        }
        "md" => generated_code_response(&state, url, EmbedStyle::Image).await,
        "sb" => generated_code_response(&state, url, EmbedStyle::Bracket).await,
        _ => unsupported_format_response(),
    }
}

async fn generated_code_response(state: &HttpState, url: &str, style: EmbedStyle) -> Response {
    match state.decks.embed_lines(url, style).await {
        Ok(code) => render_template_response(GenerateCodeTemplate { code }, StatusCode::OK),
        Err(err) => err.into_response(),
    }
}

/// Page index for `/svg`. Embed lines reference pages as `page=i.svg`, so a
/// single trailing `.svg` suffix is accepted before integer parsing;
/// anything unparsable falls through to the out-of-range bound error.
fn parse_page_param(raw: Option<&str>) -> i64 {
    let raw = raw.unwrap_or("0");
    let raw = raw.strip_suffix(".svg").unwrap_or(raw);
    raw.trim().parse().unwrap_or(-1)
}

/// Page selection on `/generate`, defaulting to the first page.
fn parse_page_selection(raw: Option<&str>) -> i64 {
    let raw = raw.unwrap_or("0");
    let raw = raw.strip_suffix(".svg").unwrap_or(raw);
    raw.trim().parse().unwrap_or(0)
}

fn missing_url_response() -> Response {
    let mut response = (StatusCode::BAD_REQUEST, MISSING_URL_BODY).into_response();
    ErrorReport::from_message(
        "infra::http::public::missing_url",
        StatusCode::BAD_REQUEST,
        MISSING_URL_BODY,
    )
    .attach(&mut response);
    response
}

fn unsupported_format_response() -> Response {
    let mut response = (StatusCode::BAD_REQUEST, UNSUPPORTED_FORMAT_BODY).into_response();
    ErrorReport::from_message(
        "infra::http::public::generate",
        StatusCode::BAD_REQUEST,
        UNSUPPORTED_FORMAT_BODY,
    )
    .attach(&mut response);
    response
}

fn svg_response(markup: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "image/svg+xml; charset=utf-8")
        .body(Body::from(markup))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn plain_response(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_param_accepts_the_svg_suffix_from_embed_lines() {
        assert_eq!(parse_page_param(Some("2.svg")), 2);
        assert_eq!(parse_page_param(Some("2")), 2);
        assert_eq!(parse_page_param(None), 0);
    }

    #[test]
    fn unparsable_page_param_maps_onto_the_out_of_range_path() {
        assert_eq!(parse_page_param(Some("two")), -1);
        assert_eq!(parse_page_param(Some("")), -1);
    }
}
