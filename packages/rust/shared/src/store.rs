//! Seams between the resolver and the systems it talks to.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{PageId, PageRecord};

/// Persistence for pages keyed by slug.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Look up the active page with exactly this slug.
    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<PageRecord>>;

    /// Add one to the page's view count in a single storage-side statement.
    async fn increment_view_count(&self, id: &PageId) -> Result<()>;
}

/// Fire-and-forget sink for faults that must not reach the caller.
pub trait ErrorReporter: Send + Sync {
    fn log_error(&self, message: &str);
}

/// Reports errors as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn log_error(&self, message: &str) {
        tracing::error!(target: "slugpress::errors", "{message}");
    }
}
