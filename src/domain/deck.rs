//! Deck records shared across the pipeline.

/// Standalone SVG markup for exactly one slide. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFragment {
    /// Position within the deck, 0-based, in document order.
    pub index: usize,
    pub markup: String,
}

/// The cached state for one source URL: the raw markdown last seen there and
/// the fragment sequence derived from it.
///
/// Invariant: `fragments[i].index == i`, and the length equals the number of
/// page-marked elements the combined rendering of `raw_markdown` contains.
/// Snapshots are replaced wholesale on any content change, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSnapshot {
    pub url: String,
    pub raw_markdown: String,
    pub fragments: Vec<PageFragment>,
}

impl DeckSnapshot {
    pub fn page_count(&self) -> usize {
        self.fragments.len()
    }
}
