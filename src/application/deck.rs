//! Deck service: the operations behind every public endpoint.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::application::cache::{DeckCache, DeckStore};
use crate::application::error::DeckError;
use crate::application::fetch::Fetcher;
use crate::application::render::SlideRenderer;
use crate::domain::error::DomainError;

/// Shape of one embed-code line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedStyle {
    /// `![](…)` markdown image lines.
    Image,
    /// `[…]` bracketed link lines.
    Bracket,
}

/// Combined rendering of a whole deck, for the full-document response.
#[derive(Debug, Clone)]
pub struct DeckDocument {
    pub markup: String,
    pub stylesheet: String,
}

pub struct DeckService {
    cache: DeckCache,
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn SlideRenderer>,
    embed_base_url: String,
}

impl DeckService {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn SlideRenderer>,
        store: Arc<dyn DeckStore>,
        embed_base_url: impl Into<String>,
    ) -> Self {
        let cache = DeckCache::new(Arc::clone(&fetcher), Arc::clone(&renderer), store);
        Self {
            cache,
            fetcher,
            renderer,
            embed_base_url: embed_base_url.into(),
        }
    }

    /// Fragment markup for one page, or the out-of-range error naming the
    /// valid bound `[0, N)`.
    pub async fn page(&self, url: &str, index: i64) -> Result<String, DeckError> {
        let snapshot = self.cache.snapshot(url).await?;
        let count = snapshot.page_count();
        if index < 0 || index as u64 >= count as u64 {
            return Err(DomainError::page_out_of_range(index, count).into());
        }
        Ok(snapshot.fragments[index as usize].markup.clone())
    }

    pub async fn page_count(&self, url: &str) -> Result<usize, DeckError> {
        Ok(self.cache.snapshot(url).await?.page_count())
    }

    /// One embed line per page, referencing the `/svg` endpoint. Knowing N
    /// requires the full extraction pipeline, so this shares the cache.
    pub async fn embed_lines(&self, url: &str, style: EmbedStyle) -> Result<String, DeckError> {
        let snapshot = self.cache.snapshot(url).await?;
        let mut lines = String::new();
        for fragment in &snapshot.fragments {
            let target = format!(
                "{}/svg?url={}&page={}.svg",
                self.embed_base_url, url, fragment.index
            );
            match style {
                EmbedStyle::Image => {
                    let _ = writeln!(lines, "![]({target})");
                }
                EmbedStyle::Bracket => {
                    let _ = writeln!(lines, "[{target}]");
                }
            }
        }
        Ok(lines)
    }

    /// Fresh fetch + render of the whole deck. Deliberately uncached: only
    /// the fragment pipeline goes through the snapshot store.
    pub async fn document(&self, url: &str) -> Result<DeckDocument, DeckError> {
        let raw_markdown = self.fetcher.fetch(url).await?;
        let combined = self.renderer.render(&raw_markdown)?;
        Ok(DeckDocument {
            markup: combined.markup,
            stylesheet: combined.stylesheet,
        })
    }
}
