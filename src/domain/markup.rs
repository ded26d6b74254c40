//! Typed markup tree for the combined deck rendering.
//!
//! The page extractor works on an explicit tree of typed nodes rather than
//! late-bound selector queries, so the transformation logic stays statically
//! checkable and independent of the parsing crate. Parsing folds quick-xml
//! events into the tree; text and attribute values are kept in source
//! (escaped) form so serialization writes them back verbatim.

use std::fmt::Write as _;
use std::str;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// HTML void elements accepted without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("markup is not parseable: {0}")]
    Parse(#[from] quick_xml::Error),
    #[error("markup attribute is malformed: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("markup is not valid UTF-8: {0}")]
    Encoding(#[from] str::Utf8Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Replace an existing attribute value, or append the attribute.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// First descendant element with the given tag name, depth-first.
    pub fn find_descendant_mut(&mut self, name: &str) -> Option<&mut Element> {
        for child in &mut self.children {
            if let Node::Element(element) = child {
                if element.name == name {
                    return Some(element);
                }
                if let Some(found) = element.find_descendant_mut(name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Position of the single element child, ignoring interleaved text.
    /// `None` when the element has zero or more than one child element.
    pub fn single_element_position(&self) -> Option<usize> {
        let mut elements = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, Node::Element(_)));
        let (position, _) = elements.next()?;
        match elements.next() {
            Some(_) => None,
            None => Some(position),
        }
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, self);
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    /// Parse markup into a typed tree. Void elements may appear without a
    /// closing tag; unmatched end tags are dropped and unclosed elements are
    /// closed at end of input.
    pub fn parse(input: &str) -> Result<Self, MarkupError> {
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Vec<Node> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let element = element_from_start(&start)?;
                    if is_void(&element.name) {
                        attach(&mut stack, &mut root, Node::Element(element));
                    } else {
                        stack.push(element);
                    }
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, Node::Element(element));
                }
                Event::End(end) => {
                    let name = str::from_utf8(end.name().as_ref())?.to_string();
                    if stack.iter().any(|element| element.name == name) {
                        while let Some(closed) = stack.pop() {
                            let done = closed.name == name;
                            attach(&mut stack, &mut root, Node::Element(closed));
                            if done {
                                break;
                            }
                        }
                    }
                }
                Event::Text(text) => {
                    let raw = str::from_utf8(text.as_ref())?.to_string();
                    attach(&mut stack, &mut root, Node::Text(raw));
                }
                Event::GeneralRef(entity) => {
                    let name = str::from_utf8(entity.as_ref())?;
                    attach(&mut stack, &mut root, Node::Text(format!("&{name};")));
                }
                Event::CData(data) => {
                    let raw = str::from_utf8(data.as_ref())?;
                    attach(&mut stack, &mut root, Node::Text(format!("<![CDATA[{raw}]]>")));
                }
                Event::Comment(comment) => {
                    let raw = str::from_utf8(comment.as_ref())?.to_string();
                    attach(&mut stack, &mut root, Node::Comment(raw));
                }
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        while let Some(unclosed) = stack.pop() {
            attach(&mut stack, &mut root, Node::Element(unclosed));
        }

        Ok(Self { children: root })
    }

    /// Matching elements in document order. Does not descend into a match,
    /// so matches are guaranteed disjoint.
    pub fn matching_elements_mut<F>(&mut self, matches: F) -> Vec<&mut Element>
    where
        F: Fn(&Element) -> bool,
    {
        let mut found = Vec::new();
        collect_matching(&mut self.children, &matches, &mut found);
        found
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            write_node(&mut out, node);
        }
        out
    }
}

fn collect_matching<'a, F>(nodes: &'a mut [Node], matches: &F, found: &mut Vec<&'a mut Element>)
where
    F: Fn(&Element) -> bool,
{
    for node in nodes {
        if let Node::Element(element) = node {
            if matches(element) {
                found.push(element);
            } else {
                collect_matching(&mut element.children, matches, found);
            }
        }
    }
}

fn attach(stack: &mut [Element], root: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, MarkupError> {
    let name = str::from_utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attribute in start.attributes().with_checks(false) {
        let attribute = attribute?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = str::from_utf8(&attribute.value)?.to_string();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| name.eq_ignore_ascii_case(void))
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => out.push_str(text),
        Node::Comment(comment) => {
            let _ = write!(out, "<!--{comment}-->");
        }
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        let _ = write!(out, " {key}=\"{value}\"");
    }
    if element.children.is_empty() && is_void(&element.name) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(out, child);
    }
    let _ = write!(out, "</{}>", element.name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_escaped_text_and_attributes() {
        let input = r#"<div class="a"><p title="x &amp; y">1 &lt; 2</p></div>"#;
        let document = Document::parse(input).expect("parse");
        assert_eq!(document.to_markup(), input);
    }

    #[test]
    fn bare_void_elements_are_accepted_and_self_closed() {
        let document = Document::parse("<p>a<br>b<hr></p>").expect("parse");
        assert_eq!(document.to_markup(), "<p>a<br/>b<hr/></p>");
    }

    #[test]
    fn unmatched_end_tags_are_dropped() {
        let document = Document::parse("<div>a</span></div>").expect("parse");
        assert_eq!(document.to_markup(), "<div>a</div>");
    }

    #[test]
    fn unclosed_elements_are_closed_at_end_of_input() {
        let document = Document::parse("<div><p>a").expect("parse");
        assert_eq!(document.to_markup(), "<div><p>a</p></div>");
    }

    #[test]
    fn set_attribute_replaces_or_appends() {
        let mut element = Element::new("svg");
        element.set_attribute("xmlns", "ns-one");
        element.set_attribute("xmlns", "ns-two");
        assert_eq!(element.attribute("xmlns"), Some("ns-two"));
        assert_eq!(element.attributes.len(), 1);
    }

    #[test]
    fn matching_elements_come_back_in_document_order_without_nesting() {
        let mut document =
            Document::parse(r#"<div><svg data-p=""><svg data-p=""/></svg><svg data-p=""/></div>"#)
                .expect("parse");
        let pages = document.matching_elements_mut(|el| el.has_attribute("data-p"));
        // the nested svg belongs to the first match and is not reported separately
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn single_element_position_ignores_whitespace_text() {
        let mut document = Document::parse("<fo>\n  <section>x</section>\n</fo>").expect("parse");
        let mut matches = document.matching_elements_mut(|el| el.name == "fo");
        let fo = matches.remove(0);
        let position = fo.single_element_position().expect("one child element");
        assert!(matches!(&fo.children[position], Node::Element(el) if el.name == "section"));
    }

    #[test]
    fn single_element_position_is_none_for_several_children() {
        let mut document = Document::parse("<fo><a>1</a><b>2</b></fo>").expect("parse");
        let mut matches = document.matching_elements_mut(|el| el.name == "fo");
        assert!(matches.remove(0).single_element_position().is_none());
    }

    #[test]
    fn find_descendant_is_depth_first() {
        let mut document =
            Document::parse("<svg><g><foreignObject id=\"a\"/></g><foreignObject id=\"b\"/></svg>")
                .expect("parse");
        let mut matches = document.matching_elements_mut(|el| el.name == "svg");
        let fo = matches
            .remove(0)
            .find_descendant_mut("foreignObject")
            .expect("found");
        assert_eq!(fo.attribute("id"), Some("a"));
    }

    #[test]
    fn entity_references_survive_roundtrip() {
        let document = Document::parse("<p>a&nbsp;b</p>").expect("parse");
        assert_eq!(document.to_markup(), "<p>a&nbsp;b</p>");
    }
}
