#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use chrono::{Duration, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;

use tny_shortener::application::services::{AllocatorSettings, CodeAllocator, LinkService};
use tny_shortener::domain::entities::ShortUrlRecord;
use tny_shortener::domain::pageview_event::PageViewEvent;
use tny_shortener::domain::repositories::{CodeStore, StoreError};
use tny_shortener::infrastructure::persistence::InMemoryCodeStore;
use tny_shortener::state::AppState;

pub const TEST_BASE_URL: &str = "https://tny.wtf";

/// Builds state over an arbitrary store with a small candidate pool.
pub fn create_state_with_store(
    store: Arc<dyn CodeStore>,
    queue_capacity: usize,
) -> (AppState, mpsc::Receiver<PageViewEvent>) {
    let settings = AllocatorSettings {
        pool_size: 256,
        ..AllocatorSettings::default()
    };
    let allocator = Arc::new(CodeAllocator::start(store.clone(), settings));
    let link_service = Arc::new(LinkService::new(allocator, store, TEST_BASE_URL));
    let (tx, rx) = mpsc::channel(queue_capacity);

    (AppState::new(link_service, tx), rx)
}

/// Builds state over a fresh in-memory store.
pub fn create_test_state() -> (
    AppState,
    Arc<InMemoryCodeStore>,
    mpsc::Receiver<PageViewEvent>,
) {
    let store = Arc::new(InMemoryCodeStore::new());
    let (state, rx) = create_state_with_store(store.clone(), 100);
    (state, store, rx)
}

pub async fn seed_record(
    store: &InMemoryCodeStore,
    code: &str,
    url: &str,
    access_count: i32,
    age_days: i64,
) {
    let now = Utc::now();
    store
        .put_record(ShortUrlRecord {
            code: code.to_string(),
            long_url: url.to_string(),
            access_count,
            created: now - Duration::days(age_days),
            last_accessed: now,
        })
        .await;
}

/// Store whose every operation fails as if the database were down.
pub struct UnavailableStore;

fn down() -> StoreError {
    StoreError::Unavailable(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl CodeStore for UnavailableStore {
    async fn initialize_schema(&self) -> Result<(), StoreError> {
        Err(down())
    }
    async fn insert(&self, _code: &str, _long_url: &str) -> Result<(), StoreError> {
        Err(down())
    }
    async fn lookup(&self, _code: &str) -> Result<Option<String>, StoreError> {
        Err(down())
    }
    async fn scan_all(&self) -> Result<Vec<ShortUrlRecord>, StoreError> {
        Err(down())
    }
    async fn update(&self, _code: &str, _long_url: &str) -> Result<bool, StoreError> {
        Err(down())
    }
    async fn delete(&self, _code: &str) -> Result<bool, StoreError> {
        Err(down())
    }
    async fn count(&self) -> Result<i64, StoreError> {
        Err(down())
    }
}

/// Inserts a fixed `ConnectInfo` so handlers and the rate limiter see a peer address.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
