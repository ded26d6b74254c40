//! Markdown-to-slides rendering engine.
//!
//! The engine turns deck markdown into one combined markup tree holding a
//! page-marked `<svg>` element per slide, plus one aggregated stylesheet.
//! It sits behind [`SlideRenderer`] so the rest of the pipeline (and tests)
//! can swap the implementation.

mod config;
mod theme;

use std::fmt::Write as _;
use std::time::Instant;

use metrics::histogram;
use thiserror::Error;

/// Attribute marking a top-level element as one slide's root.
pub const PAGE_MARKER_ATTRIBUTE: &str = "data-marpit-svg";

/// Transient output of the rendering engine, consumed by the page extractor
/// (or embedded directly into the full-document response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedRendering {
    pub markup: String,
    pub stylesheet: String,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to render deck: {message}")]
    Engine { message: String },
}

impl RenderError {
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }
}

pub trait SlideRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<CombinedRendering, RenderError>;
}

/// Comrak-based engine with emoji-shortcode expansion and Ammonia
/// sanitisation. Raw HTML in slide bodies is kept; script never survives.
pub struct ComrakSlideRenderer {
    options: comrak::Options<'static>,
    sanitizer: ammonia::Builder<'static>,
}

impl ComrakSlideRenderer {
    pub fn new() -> Self {
        Self {
            options: config::default_options(),
            sanitizer: config::build_slide_sanitizer(),
        }
    }
}

impl Default for ComrakSlideRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideRenderer for ComrakSlideRenderer {
    fn render(&self, markdown: &str) -> Result<CombinedRendering, RenderError> {
        let started = Instant::now();
        let slides = split_slides(markdown);

        let mut markup = String::from(r#"<div class="marpit">"#);
        for (position, source) in slides.iter().enumerate() {
            let body = comrak::markdown_to_html(source, &self.options);
            let body = self.sanitizer.clean(&body).to_string();
            let _ = write!(
                markup,
                r#"<svg {marker}="" viewBox="0 0 {width} {height}"><foreignObject width="{width}" height="{height}"><section id="{id}">{body}</section></foreignObject></svg>"#,
                marker = PAGE_MARKER_ATTRIBUTE,
                width = theme::PAGE_WIDTH,
                height = theme::PAGE_HEIGHT,
                id = position + 1,
            );
        }
        markup.push_str("</div>");

        histogram!("sfoglia_deck_render_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        Ok(CombinedRendering {
            markup,
            stylesheet: theme::STYLESHEET.to_string(),
        })
    }
}

/// Split deck markdown into per-slide sources on top-level `---` rulers.
/// Rulers inside fenced code blocks do not split, a dash run directly under
/// text is a setext heading underline rather than a ruler, and a leading
/// front matter block holds deck directives and never becomes a slide.
fn split_slides(markdown: &str) -> Vec<String> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut start = 0;

    if lines.first().map(|l| l.trim_end() == "---").unwrap_or(false) {
        if let Some(close) = lines.iter().skip(1).position(|l| l.trim_end() == "---") {
            start = close + 2;
        }
    }

    let mut slides = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut fence: Option<(char, usize)> = None;
    let mut prev_blank = true;

    for line in &lines[start..] {
        if let Some((open_char, open_len)) = fence {
            current.push(line);
            prev_blank = false;
            if let Some((close_char, close_len)) = fence_marker(line) {
                let only_fence = line.trim().chars().all(|c| c == close_char);
                if close_char == open_char && close_len >= open_len && only_fence {
                    fence = None;
                }
            }
            continue;
        }

        if let Some(marker) = fence_marker(line) {
            fence = Some(marker);
            current.push(line);
            prev_blank = false;
            continue;
        }

        if prev_blank && is_ruler(line) {
            slides.push(current.join("\n"));
            current.clear();
            prev_blank = true;
            continue;
        }

        current.push(line);
        prev_blank = line.trim().is_empty();
    }

    slides.push(current.join("\n"));
    slides
}

fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run = trimmed.chars().take_while(|&c| c == first).count();
    (run >= 3).then_some((first, run))
}

fn is_ruler(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}
