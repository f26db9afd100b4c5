//! Slug → page resolution.
//!
//! The resolver looks a slug up in the [`ContentStore`], counts the view,
//! and derives a [`PageViewModel`] ready for the presentation layer. Lookup
//! faults become [`Outcome::ServerError`] with the detail sent only to the
//! [`ErrorReporter`]; counter faults are logged and absorbed.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use slugpress_content::toc;
use slugpress_shared::{
    ContentStore, ErrorReporter, PageRecord, PageViewModel, SettingsProvider, keys,
};

use crate::meta;

/// Reason carried by [`Outcome::ServerError`]. Never includes fault detail.
pub const LOOKUP_FAILED: &str = "content lookup failed";

/// Result of resolving one slug.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An active page was found and fully prepared.
    Found(Box<PageViewModel>),
    /// No active page has this slug.
    NotFound,
    /// The store failed; the reason is safe to show.
    ServerError(String),
}

impl Outcome {
    /// HTTP status this outcome maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Outcome::Found(_) => 200,
            Outcome::NotFound => 404,
            Outcome::ServerError(_) => 500,
        }
    }
}

/// Turns slugs into page view models.
#[derive(Clone)]
pub struct PageResolver {
    store: Arc<dyn ContentStore>,
    settings: Arc<dyn SettingsProvider>,
    reporter: Arc<dyn ErrorReporter>,
    site_origin: String,
}

impl PageResolver {
    pub fn new(
        store: Arc<dyn ContentStore>,
        settings: Arc<dyn SettingsProvider>,
        reporter: Arc<dyn ErrorReporter>,
        site_origin: impl Into<String>,
    ) -> Self {
        Self {
            store,
            settings,
            reporter,
            site_origin: site_origin.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn site_origin(&self) -> &str {
        &self.site_origin
    }

    pub fn settings(&self) -> &dyn SettingsProvider {
        self.settings.as_ref()
    }

    /// Resolve `slug` to a page.
    ///
    /// Empty slugs are a miss. Every successful resolution increments the
    /// page's view count once; a failed increment still returns `Found`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, slug: &str) -> Outcome {
        if slug.is_empty() {
            debug!("empty slug");
            return Outcome::NotFound;
        }

        let page = match self.store.find_active_by_slug(slug).await {
            Ok(Some(page)) if page.is_active => page,
            Ok(_) => {
                debug!("no active page");
                return Outcome::NotFound;
            }
            Err(e) => {
                self.reporter
                    .log_error(&format!("page lookup failed for slug '{slug}': {e}"));
                return Outcome::ServerError(LOOKUP_FAILED.to_string());
            }
        };

        let view_count = match self.store.increment_view_count(&page.id).await {
            Ok(()) => page.view_count.saturating_add(1),
            Err(e) => {
                warn!(page_id = %page.id, error = %e, "view count increment failed");
                page.view_count
            }
        };

        let site_name = self.settings.get(keys::SITE_NAME, "");
        let view = prepare_view(&page, &self.site_origin, &site_name, view_count);
        debug!(
            page_id = %page.id,
            toc_entries = view.table_of_contents.len(),
            "page resolved"
        );
        Outcome::Found(Box::new(view))
    }
}

/// Derive the view model for `page`.
pub fn prepare_view(
    page: &PageRecord,
    site_origin: &str,
    site_name: &str,
    view_count: u64,
) -> PageViewModel {
    let extraction = toc::extract(&page.content);
    let meta_title = meta::effective_meta_title(page);
    let share_url = meta::share_url(site_origin, &page.slug);

    let share_text = if site_name.trim().is_empty() {
        meta_title.clone()
    } else {
        format!("{meta_title} | {}", site_name.trim())
    };

    PageViewModel {
        slug: page.slug.clone(),
        title: page.title.clone(),
        effective_meta_description: meta::effective_meta_description(page),
        effective_meta_title: meta_title,
        renderable_content: extraction.html,
        table_of_contents: extraction.toc,
        share_links: meta::share_links(&share_url, &share_text),
        share_url,
        view_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use slugpress_shared::{PageId, Result, SettingsMap, SlugpressError};

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct FakeStore {
        pages: Vec<PageRecord>,
        fail_lookup: bool,
        fail_increment: bool,
        lookups: AtomicUsize,
        increments: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for FakeStore {
        async fn find_active_by_slug(&self, slug: &str) -> Result<Option<PageRecord>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookup {
                return Err(SlugpressError::Storage("connection refused".into()));
            }
            Ok(self
                .pages
                .iter()
                .find(|p| p.slug == slug && p.is_active)
                .cloned())
        }

        async fn increment_view_count(&self, _id: &PageId) -> Result<()> {
            self.increments.fetch_add(1, Ordering::SeqCst);
            if self.fail_increment {
                return Err(SlugpressError::Storage("disk I/O error".into()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl ErrorReporter for RecordingReporter {
        fn log_error(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn make_page(slug: &str, title: &str, content: &str, active: bool) -> PageRecord {
        let now = Utc::now();
        PageRecord {
            id: PageId::new(),
            slug: slug.into(),
            title: title.into(),
            meta_title: None,
            content: content.into(),
            meta_description: None,
            is_active: active,
            view_count: 7,
            created_at: now,
            updated_at: now,
        }
    }

    fn resolver_with(store: Arc<FakeStore>, reporter: Arc<RecordingReporter>) -> PageResolver {
        let mut settings = SettingsMap::new();
        settings.set(keys::SITE_NAME, "Example Co");
        PageResolver::new(store, Arc::new(settings), reporter, "https://mysite.example/")
    }

    fn about_page() -> PageRecord {
        make_page(
            "about",
            "About Us",
            "<h1>A</h1><h2>B</h2><h2>C</h2><h2>D</h2>",
            true,
        )
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn found_page_is_fully_prepared() {
        let store = Arc::new(FakeStore {
            pages: vec![about_page()],
            ..Default::default()
        });
        let reporter = Arc::new(RecordingReporter::default());
        let resolver = resolver_with(store.clone(), reporter.clone());

        let outcome = resolver.resolve("about").await;
        assert_eq!(outcome.status_code(), 200);
        let Outcome::Found(view) = outcome else {
            panic!("expected Found");
        };

        assert_eq!(view.title, "About Us");
        assert_eq!(view.effective_meta_title, "About Us");
        assert_eq!(view.effective_meta_description, "A B C D");
        assert_eq!(view.table_of_contents.len(), 4);
        assert!(view.renderable_content.contains(r#"<h2 id="heading-3">D</h2>"#));
        assert_eq!(view.share_url, "https://mysite.example/about");
        assert!(view.share_links[0].url.contains("About+Us+%7C+Example+Co"));
        assert_eq!(view.view_count, 8);

        assert_eq!(store.increments.load(Ordering::SeqCst), 1);
        assert!(reporter.messages().is_empty());
    }

    #[tokio::test]
    async fn missing_and_empty_slugs_are_not_found() {
        let store = Arc::new(FakeStore {
            pages: vec![about_page()],
            ..Default::default()
        });
        let resolver = resolver_with(store.clone(), Arc::new(RecordingReporter::default()));

        for slug in ["", "missing", "About", "about/"] {
            assert_eq!(resolver.resolve(slug).await, Outcome::NotFound, "slug {slug:?}");
        }
        assert_eq!(store.increments.load(Ordering::SeqCst), 0);
        // The empty slug never reaches the store.
        assert_eq!(store.lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn inactive_pages_are_not_found() {
        let store = Arc::new(FakeStore {
            pages: vec![make_page("draft", "Draft", "<p>x</p>", false)],
            ..Default::default()
        });
        let resolver = resolver_with(store.clone(), Arc::new(RecordingReporter::default()));

        assert_eq!(resolver.resolve("draft").await, Outcome::NotFound);
        assert_eq!(store.increments.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_fault_is_server_error_reported_once() {
        let store = Arc::new(FakeStore {
            fail_lookup: true,
            ..Default::default()
        });
        let reporter = Arc::new(RecordingReporter::default());
        let resolver = resolver_with(store.clone(), reporter.clone());

        let outcome = resolver.resolve("about").await;
        assert_eq!(outcome, Outcome::ServerError(LOOKUP_FAILED.to_string()));
        assert_eq!(outcome.status_code(), 500);

        let messages = reporter.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("connection refused"));
        // Fault detail stays out of the outcome.
        if let Outcome::ServerError(reason) = outcome {
            assert!(!reason.contains("connection refused"));
        }
        assert_eq!(store.increments.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn counter_fault_does_not_block_rendering() {
        let store = Arc::new(FakeStore {
            pages: vec![about_page()],
            fail_increment: true,
            ..Default::default()
        });
        let reporter = Arc::new(RecordingReporter::default());
        let resolver = resolver_with(store.clone(), reporter.clone());

        let Outcome::Found(view) = resolver.resolve("about").await else {
            panic!("expected Found despite counter failure");
        };
        assert_eq!(view.view_count, 7);
        assert_eq!(store.increments.load(Ordering::SeqCst), 1);
        assert!(reporter.messages().is_empty());
    }

    #[tokio::test]
    async fn every_resolution_counts_once() {
        let store = Arc::new(FakeStore {
            pages: vec![about_page()],
            ..Default::default()
        });
        let resolver = resolver_with(store.clone(), Arc::new(RecordingReporter::default()));

        for _ in 0..5 {
            assert_eq!(resolver.resolve("about").await.status_code(), 200);
        }
        assert_eq!(store.increments.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn resolves_against_libsql_storage() {
        use slugpress_storage::Storage;

        let tmp = std::env::temp_dir().join(format!("sp_resolve_{}.db", uuid::Uuid::now_v7()));
        let storage = Arc::new(Storage::open(&tmp).await.expect("open db"));
        let mut page = about_page();
        page.view_count = 0;
        storage.upsert_page(&page).await.unwrap();

        let reporter = Arc::new(RecordingReporter::default());
        let resolver = PageResolver::new(
            storage.clone(),
            Arc::new(SettingsMap::new()),
            reporter.clone(),
            "https://mysite.example",
        );

        let Outcome::Found(view) = resolver.resolve("about").await else {
            panic!("expected Found");
        };
        assert_eq!(view.effective_meta_title, "About Us");
        assert_eq!(view.table_of_contents.len(), 4);
        assert_eq!(view.view_count, 1);

        resolver.resolve("about").await;
        let stored = storage.get_page_by_slug("about").await.unwrap().unwrap();
        assert_eq!(stored.view_count, 2);
        assert_eq!(resolver.resolve("nope").await, Outcome::NotFound);
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn short_pages_have_no_toc_and_untouched_content() {
        let page = make_page("short", "Short", "<h1>Only</h1><p>Body text</p>", true);
        let view = prepare_view(&page, "https://mysite.example", "", 1);

        assert!(view.table_of_contents.is_empty());
        assert_eq!(view.renderable_content, page.content);
        assert_eq!(view.effective_meta_description, "Only Body text");
        assert!(view.share_links[0].url.ends_with("&text=Short"));
    }

    #[test]
    fn meta_overrides_flow_into_view() {
        let mut page = make_page("about", "About Us", "<p>Body</p>", true);
        page.meta_title = Some("About the Team".into());
        page.meta_description = Some("Who we are.".into());

        let view = prepare_view(&page, "https://mysite.example", "Example Co", 1);
        assert_eq!(view.title, "About Us");
        assert_eq!(view.effective_meta_title, "About the Team");
        assert_eq!(view.effective_meta_description, "Who we are.");
    }
}
