//! Deck cache: per-URL snapshots with a full-content staleness check.

use std::sync::Arc;

use dashmap::DashMap;
use metrics::counter;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::extract::{ExtractError, extract_pages};
use crate::application::fetch::{FetchError, Fetcher};
use crate::application::render::{RenderError, SlideRenderer};
use crate::domain::deck::DeckSnapshot;

#[derive(Debug, Error)]
pub enum DeckCacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Pluggable snapshot store keyed by source URL. The in-memory store is the
/// only implementation today; snapshots are immutable `Arc`s swapped
/// atomically, so readers never observe a half-written replacement.
pub trait DeckStore: Send + Sync {
    fn get(&self, url: &str) -> Option<Arc<DeckSnapshot>>;
    fn put(&self, url: &str, snapshot: Arc<DeckSnapshot>);
}

/// Unbounded in-memory store, one entry per distinct URL ever requested.
#[derive(Default)]
pub struct MemoryDeckStore {
    entries: DashMap<String, Arc<DeckSnapshot>>,
}

impl MemoryDeckStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeckStore for MemoryDeckStore {
    fn get(&self, url: &str) -> Option<Arc<DeckSnapshot>> {
        self.entries.get(url).map(|entry| Arc::clone(&entry))
    }

    fn put(&self, url: &str, snapshot: Arc<DeckSnapshot>) {
        self.entries.insert(url.to_string(), snapshot);
    }
}

/// The render-and-cache pipeline behind every page request.
///
/// Every call re-fetches the raw markdown; the cache only short-circuits the
/// render/extract work, not the network round trip. Staleness is full byte
/// equality of the fetched content against the stored snapshot.
pub struct DeckCache {
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn SlideRenderer>,
    store: Arc<dyn DeckStore>,
    gates: DashMap<String, Arc<Mutex<()>>>,
}

impl DeckCache {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn SlideRenderer>,
        store: Arc<dyn DeckStore>,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            store,
            gates: DashMap::new(),
        }
    }

    /// Current snapshot for `url`: the stored one when the freshly fetched
    /// content is byte-identical, otherwise a wholesale replacement.
    ///
    /// A per-URL gate serializes concurrent callers so simultaneous misses
    /// for the same URL collapse into a single render.
    pub async fn snapshot(&self, url: &str) -> Result<Arc<DeckSnapshot>, DeckCacheError> {
        let gate = self.gate(url);
        let _guard = gate.lock().await;

        let raw_markdown = self.fetcher.fetch(url).await?;

        if let Some(stored) = self.store.get(url) {
            if stored.raw_markdown == raw_markdown {
                counter!("sfoglia_deck_cache_hit_total").increment(1);
                return Ok(stored);
            }
        }
        counter!("sfoglia_deck_cache_miss_total").increment(1);

        let combined = self.renderer.render(&raw_markdown)?;
        counter!("sfoglia_deck_render_total").increment(1);
        let fragments = extract_pages(&combined)?;
        debug!(
            target = "sfoglia::cache",
            url,
            pages = fragments.len(),
            "stored fresh deck snapshot"
        );

        let snapshot = Arc::new(DeckSnapshot {
            url: url.to_string(),
            raw_markdown,
            fragments,
        });
        self.store.put(url, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    fn gate(&self, url: &str) -> Arc<Mutex<()>> {
        self.gates
            .entry(url.to_string())
            .or_default()
            .clone()
    }
}
