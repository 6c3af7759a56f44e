//! Shorten and resolve operations used by the HTTP layer.

use std::sync::Arc;

use crate::application::services::allocator::{AllocationError, CodeAllocator};
use crate::domain::repositories::{CodeStore, StoreError};
use crate::utils::url_normalizer::{try_fix_target, validate_target};

/// Result of a successful shorten call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenedLink {
    pub code: String,
    pub long_url: String,
}

/// Facade over the allocator and the code store.
///
/// Repairs and validates URLs before allocation so the allocator only ever
/// sees absolute URLs.
pub struct LinkService {
    allocator: Arc<CodeAllocator>,
    store: Arc<dyn CodeStore>,
    base_url: String,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        allocator: Arc<CodeAllocator>,
        store: Arc<dyn CodeStore>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            allocator,
            store,
            base_url: base_url.into(),
        }
    }

    /// Normalizes `long_url` and assigns it a new short code.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvalidUrl`] if the repaired URL is still not
    /// an absolute http, https or ftp URL, or any other allocation failure.
    pub async fn shorten(&self, long_url: &str) -> Result<ShortenedLink, AllocationError> {
        let (fixed, _) = try_fix_target(long_url);
        validate_target(&fixed).map_err(|reason| AllocationError::InvalidUrl {
            reason: reason.to_string(),
        })?;

        let code = self.allocator.assign(&fixed).await?;

        Ok(ShortenedLink {
            code,
            long_url: fixed,
        })
    }

    /// Resolves a code to its long URL, counting the access.
    ///
    /// `Ok(None)` means the code is unknown.
    pub async fn resolve(&self, code: &str) -> Result<Option<String>, StoreError> {
        self.store.lookup(code).await
    }

    /// Builds the public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), code)
    }

    /// The allocator behind this service.
    pub fn allocator(&self) -> &CodeAllocator {
        &self.allocator
    }

    /// The store behind this service.
    pub fn store(&self) -> &Arc<dyn CodeStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::allocator::AllocatorSettings;
    use crate::domain::repositories::MockCodeStore;
    use crate::infrastructure::persistence::InMemoryCodeStore;

    fn service_with(store: Arc<dyn CodeStore>) -> LinkService {
        let allocator = Arc::new(CodeAllocator::start(
            store.clone(),
            AllocatorSettings::default(),
        ));
        LinkService::new(allocator, store, "https://tny.wtf/")
    }

    #[tokio::test]
    async fn test_shorten_repairs_url_before_assigning() {
        let store = Arc::new(InMemoryCodeStore::new());
        let service = service_with(store.clone());

        let link = service.shorten("  example.com/page ").await.unwrap();

        assert_eq!(link.long_url, "http://example.com/page");
        assert_eq!(
            store.get(&link.code).await.unwrap().long_url,
            "http://example.com/page"
        );
    }

    #[tokio::test]
    async fn test_shorten_rejects_unrepairable_url() {
        let mut store = MockCodeStore::new();
        store.expect_insert().times(0);
        let service = service_with(Arc::new(store));

        let result = service.shorten("not a url").await;

        assert!(matches!(result, Err(AllocationError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_shorten_adds_scheme_to_host_and_port() {
        let store = Arc::new(InMemoryCodeStore::new());
        let service = service_with(store.clone());

        let link = service.shorten("example.com:8080/path").await.unwrap();
        assert_eq!(link.long_url, "http://example.com:8080/path");

        let link = service.shorten("localhost:3000").await.unwrap();
        assert_eq!(link.long_url, "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_shorten_rejects_non_web_schemes() {
        let mut store = MockCodeStore::new();
        store.expect_insert().times(0);
        let service = service_with(Arc::new(store));

        for bad in [
            "javascript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "file:///etc/passwd",
        ] {
            let result = service.shorten(bad).await;
            assert!(
                matches!(result, Err(AllocationError::InvalidUrl { .. })),
                "'{bad}' should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_resolve_counts_access() {
        let store = Arc::new(InMemoryCodeStore::new());
        let service = service_with(store.clone());
        let link = service.shorten("https://example.com").await.unwrap();

        assert_eq!(
            service.resolve(&link.code).await.unwrap().as_deref(),
            Some("https://example.com")
        );
        assert_eq!(service.resolve("missing").await.unwrap(), None);
        assert_eq!(store.get(&link.code).await.unwrap().access_count, 1);
    }

    #[tokio::test]
    async fn test_short_url_joins_base() {
        let service = service_with(Arc::new(InMemoryCodeStore::new()));
        assert_eq!(service.short_url("aB3"), "https://tny.wtf/aB3");
    }
}
