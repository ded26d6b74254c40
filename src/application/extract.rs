//! Page extraction: split the combined rendering into standalone fragments.
//!
//! Extraction is a pure function of the combined markup and stylesheet, so
//! identical input always yields byte-identical fragments.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::application::render::{CombinedRendering, PAGE_MARKER_ATTRIBUTE};
use crate::domain::deck::PageFragment;
use crate::domain::markup::{Document, Element, MarkupError, Node};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Wrapper element embedding HTML content inside a vector-graphics page.
const FOREIGN_CONTENT_CONTAINER: &str = "foreignObject";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to extract pages: {0}")]
    Markup(#[from] MarkupError),
}

/// The fixed selector prefix the engine uses to scope per-page rules inside
/// the combined markup. It refers to ancestor structure that no longer
/// exists once a page element is extracted standalone.
static SCOPED_SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"div\.marpit\s*>\s*svg\s*>\s*foreignObject\s*>")
        .expect("scoped selector pattern compiles")
});

/// Strict SVG consumers reject the bare form of the line-break tag.
static BARE_LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<br\s*>").expect("line break pattern compiles"));

/// Remove every occurrence of the cross-fragment selector prefix. A literal
/// textual substitution, not a CSS parse; idempotent, and rules that do not
/// carry the prefix pass through untouched.
pub fn strip_scoped_selector(css: &str) -> String {
    SCOPED_SELECTOR.replace_all(css, "").into_owned()
}

fn normalize_line_breaks(markup: &str) -> String {
    BARE_LINE_BREAK.replace_all(markup, "<br/>").into_owned()
}

/// Isolate each page-marked element of the combined markup into standalone
/// fragment text. The selection order defines page indexes 0..N-1; zero
/// page-marked elements yields an empty sequence.
pub fn extract_pages(combined: &CombinedRendering) -> Result<Vec<PageFragment>, ExtractError> {
    let mut document = Document::parse(&combined.markup)?;
    let local_css = strip_scoped_selector(&combined.stylesheet);

    let pages = document.matching_elements_mut(|el| el.has_attribute(PAGE_MARKER_ATTRIBUTE));

    let mut fragments = Vec::with_capacity(pages.len());
    for (index, page) in pages.into_iter().enumerate() {
        isolate_page(page, &local_css);
        let markup = normalize_line_breaks(&page.to_markup());
        fragments.push(PageFragment { index, markup });
    }
    Ok(fragments)
}

/// Make one page element valid standalone markup: declare the SVG namespace
/// when absent, and rewrap the foreign content in an XHTML-namespaced
/// wrapper carrying the locally-scoped styles.
fn isolate_page(page: &mut Element, local_css: &str) {
    if !page.has_attribute("xmlns") {
        page.set_attribute("xmlns", SVG_NAMESPACE);
    }

    let Some(container) = page.find_descendant_mut(FOREIGN_CONTENT_CONTAINER) else {
        return;
    };

    let Some(position) = container.single_element_position() else {
        return;
    };
    let Node::Element(body) = container.children.remove(position) else {
        return;
    };

    let mut style = Element::new("style");
    style.children.push(Node::Text(local_css.to_string()));

    let mut wrapper = Element::new("div");
    wrapper.set_attribute("xmlns", XHTML_NAMESPACE);
    wrapper.children.push(Node::Element(style));
    wrapper.children.push(Node::Element(body));

    container.children = vec![Node::Element(wrapper)];
}
