use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use sfoglia::application::cache::{DeckCache, MemoryDeckStore};
use sfoglia::application::deck::{DeckService, EmbedStyle};
use sfoglia::application::fetch::{FetchError, Fetcher};
use sfoglia::application::render::{
    CombinedRendering, ComrakSlideRenderer, RenderError, SlideRenderer,
};
use sfoglia::domain::error::DomainError;

const DECK_URL: &str = "https://example.com/deck.md";
const THREE_SLIDES: &str = "# One\n\n---\n\n# Two\n\n---\n\n# Three\n";

struct ScriptedFetcher {
    content: Mutex<String>,
}

impl ScriptedFetcher {
    fn new(content: &str) -> Self {
        Self {
            content: Mutex::new(content.to_string()),
        }
    }

    async fn set_content(&self, content: &str) {
        *self.content.lock().await = content.to_string();
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.content.lock().await.clone())
    }
}

struct CountingRenderer {
    inner: ComrakSlideRenderer,
    invocations: AtomicUsize,
}

impl CountingRenderer {
    fn new() -> Self {
        Self {
            inner: ComrakSlideRenderer::new(),
            invocations: AtomicUsize::new(0),
        }
    }

    fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl SlideRenderer for CountingRenderer {
    fn render(&self, markdown: &str) -> Result<CombinedRendering, RenderError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.inner.render(markdown)
    }
}

#[tokio::test]
async fn unchanged_content_reuses_the_stored_snapshot() {
    let fetcher = Arc::new(ScriptedFetcher::new(THREE_SLIDES));
    let renderer = Arc::new(CountingRenderer::new());
    let cache = DeckCache::new(
        fetcher.clone(),
        renderer.clone(),
        Arc::new(MemoryDeckStore::new()),
    );

    let first = cache.snapshot(DECK_URL).await.expect("first snapshot");
    let second = cache.snapshot(DECK_URL).await.expect("second snapshot");

    assert_eq!(first.page_count(), 3);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(renderer.invocations(), 1);
}

#[tokio::test]
async fn changed_content_replaces_the_snapshot_wholesale() {
    let fetcher = Arc::new(ScriptedFetcher::new(THREE_SLIDES));
    let renderer = Arc::new(CountingRenderer::new());
    let cache = DeckCache::new(
        fetcher.clone(),
        renderer.clone(),
        Arc::new(MemoryDeckStore::new()),
    );

    let first = cache.snapshot(DECK_URL).await.expect("first snapshot");
    assert_eq!(first.page_count(), 3);

    fetcher.set_content("# Only\n").await;
    let second = cache.snapshot(DECK_URL).await.expect("second snapshot");

    assert_eq!(second.page_count(), 1);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(renderer.invocations(), 2);
}

#[tokio::test]
async fn every_request_refetches_even_on_a_hit() {
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(THREE_SLIDES.to_string())
        }
    }

    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
    });
    let cache = DeckCache::new(
        fetcher.clone(),
        Arc::new(ComrakSlideRenderer::new()),
        Arc::new(MemoryDeckStore::new()),
    );

    cache.snapshot(DECK_URL).await.expect("first snapshot");
    cache.snapshot(DECK_URL).await.expect("second snapshot");

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fragments_are_indexed_in_document_order() {
    let fetcher = Arc::new(ScriptedFetcher::new(THREE_SLIDES));
    let cache = DeckCache::new(
        fetcher,
        Arc::new(ComrakSlideRenderer::new()),
        Arc::new(MemoryDeckStore::new()),
    );

    let snapshot = cache.snapshot(DECK_URL).await.expect("snapshot");
    let indices: Vec<usize> = snapshot
        .fragments
        .iter()
        .map(|fragment| fragment.index)
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);

    assert!(snapshot.fragments[0].markup.contains("One"));
    assert!(snapshot.fragments[2].markup.contains("Three"));
}

fn deck_service(fetcher: Arc<dyn Fetcher>) -> DeckService {
    DeckService::new(
        fetcher,
        Arc::new(ComrakSlideRenderer::new()),
        Arc::new(MemoryDeckStore::new()),
        "http://localhost:3000",
    )
}

#[tokio::test]
async fn page_lookup_rejects_out_of_range_indices() {
    let service = deck_service(Arc::new(ScriptedFetcher::new(THREE_SLIDES)));

    let error = service.page(DECK_URL, 3).await.expect_err("index 3 of 3");
    assert_eq!(
        error.to_string(),
        "Invalid page index. Must be 0 <= page < 3"
    );

    let error = service.page(DECK_URL, -1).await.expect_err("negative index");
    assert!(matches!(
        error,
        sfoglia::application::error::DeckError::Domain(DomainError::PageOutOfRange { .. })
    ));

    let last = service.page(DECK_URL, 2).await.expect("last valid index");
    assert!(last.contains("Three"));
}

#[tokio::test]
async fn embed_lines_cover_every_page_once() {
    let service = deck_service(Arc::new(ScriptedFetcher::new(THREE_SLIDES)));

    let markdown = service
        .embed_lines(DECK_URL, EmbedStyle::Image)
        .await
        .expect("markdown embed lines");
    let lines: Vec<&str> = markdown.lines().collect();
    assert_eq!(lines.len(), 3);
    for (index, line) in lines.iter().enumerate() {
        assert_eq!(
            *line,
            format!("![](http://localhost:3000/svg?url={DECK_URL}&page={index}.svg)")
        );
    }

    let bracket = service
        .embed_lines(DECK_URL, EmbedStyle::Bracket)
        .await
        .expect("bracket embed lines");
    let lines: Vec<&str> = bracket.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        format!("[http://localhost:3000/svg?url={DECK_URL}&page=0.svg]")
    );
}

#[tokio::test]
async fn fetch_failure_surfaces_without_touching_the_store() {
    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Err(FetchError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }
    }

    let store = Arc::new(MemoryDeckStore::new());
    let cache = DeckCache::new(
        Arc::new(FailingFetcher),
        Arc::new(ComrakSlideRenderer::new()),
        store.clone(),
    );

    let error = cache.snapshot(DECK_URL).await.expect_err("fetch failure");
    assert!(
        error
            .to_string()
            .starts_with("Failed to fetch markdown: upstream returned")
    );

    use sfoglia::application::cache::DeckStore;
    assert!(store.get(DECK_URL).is_none());
}
