#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::{
    Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use linkgate::api::handlers::{health_handler, redirect_handler, shorten_handler, unlock_handler};
use linkgate::application::services::{AuthService, QuotaService, RedeemService, ShortenService};
use linkgate::domain::entities::NewShortUrl;
use linkgate::domain::repositories::{RateLimitStore, UrlRepository};
use linkgate::domain::usage_worker::run_usage_worker;
use linkgate::infrastructure::cache::{HotSetCache, MemoryHotSetCache};
use linkgate::infrastructure::persistence::MemoryUrlRepository;
use linkgate::infrastructure::rate_limit::MemoryRateLimitStore;
use linkgate::state::AppState;
use linkgate::utils::password::HmacPasswordVerifier;

pub const TEST_SIGNING_SECRET: &str = "test-signing-secret";
pub const TEST_PEPPER: &str = "test-pepper";
pub const TEST_BASE_URL: &str = "https://s.example.com";

/// Everything a test needs: the wired state plus direct handles on the
/// process-local backends for seeding and assertions.
pub struct TestContext {
    pub state: AppState,
    pub urls: Arc<MemoryUrlRepository>,
    pub cache: Arc<MemoryHotSetCache>,
    pub passwords: Arc<HmacPasswordVerifier>,
}

/// Builds an app state over in-memory backends with the usage worker running.
pub fn create_test_state(anonymous_limit: u64, authenticated_limit: u64) -> TestContext {
    let urls = Arc::new(MemoryUrlRepository::new());
    let cache = Arc::new(MemoryHotSetCache::new());
    let passwords = Arc::new(HmacPasswordVerifier::new(TEST_PEPPER.to_string()));
    let rate_limits = Arc::new(MemoryRateLimitStore::new());

    let (usage_tx, usage_rx) = mpsc::channel(100);
    tokio::spawn(run_usage_worker(
        usage_rx,
        urls.clone() as Arc<dyn UrlRepository>,
    ));

    let shorten_service = Arc::new(ShortenService::new(
        urls.clone() as Arc<dyn UrlRepository>,
        passwords.clone(),
        TEST_BASE_URL.to_string(),
    ));
    let redeem_service = Arc::new(RedeemService::new(
        urls.clone() as Arc<dyn UrlRepository>,
        cache.clone() as Arc<dyn HotSetCache>,
        passwords.clone(),
        usage_tx.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(TEST_SIGNING_SECRET.to_string()));
    let quota_service = Arc::new(QuotaService::new(
        rate_limits as Arc<dyn RateLimitStore>,
        anonymous_limit,
        authenticated_limit,
    ));

    let state = AppState {
        shorten_service,
        redeem_service,
        auth_service,
        quota_service,
        urls: urls.clone() as Arc<dyn UrlRepository>,
        cache: cache.clone() as Arc<dyn HotSetCache>,
        usage_sender: usage_tx,
        behind_proxy: false,
    };

    TestContext {
        state,
        urls,
        cache,
        passwords,
    }
}

/// Router exposing the JSON API the way the app wires it.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/shorten", post(shorten_handler))
        .route("/api/health", get(health_handler))
        .layer(MockConnectInfoLayer)
        .with_state(state)
}

/// Router exposing the redemption endpoints.
pub fn redirect_router(state: AppState) -> Router {
    Router::new()
        .route("/{identifier}", get(redirect_handler).post(unlock_handler))
        .with_state(state)
}

/// Issues a bearer token the test auth service accepts.
pub fn bearer_token(user_id: &str) -> String {
    AuthService::new(TEST_SIGNING_SECRET.to_string()).issue_token(user_id)
}

/// Seeds an open record.
pub async fn create_test_url(ctx: &TestContext, identifier: &str, target_url: &str) {
    seed(ctx, identifier, target_url, 0, None, None, None).await;
}

/// Seeds a record with a finite usage cap.
pub async fn create_limited_url(ctx: &TestContext, identifier: &str, max_uses: i64) {
    seed(
        ctx,
        identifier,
        "https://example.com/limited",
        max_uses,
        None,
        None,
        None,
    )
    .await;
}

/// Seeds a record with a validity window.
pub async fn create_window_url(
    ctx: &TestContext,
    identifier: &str,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
) {
    seed(
        ctx,
        identifier,
        "https://example.com/window",
        0,
        None,
        valid_from,
        valid_to,
    )
    .await;
}

/// Seeds a password-protected record.
pub async fn create_protected_url(ctx: &TestContext, identifier: &str, password: &str) {
    let hash = ctx.passwords.hash(password);
    seed(
        ctx,
        identifier,
        "https://example.com/protected",
        0,
        Some(hash),
        None,
        None,
    )
    .await;
}

async fn seed(
    ctx: &TestContext,
    identifier: &str,
    target_url: &str,
    max_uses: i64,
    password_hash: Option<String>,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
) {
    ctx.urls
        .create(NewShortUrl {
            identifier: identifier.to_string(),
            target_url: target_url.to_string(),
            max_uses,
            password_hash,
            valid_from,
            valid_to,
        })
        .await
        .unwrap();
}

/// Blocks until the background worker has counted `expected` uses.
pub async fn wait_for_uses(ctx: &TestContext, identifier: &str, expected: i64) {
    for _ in 0..200 {
        let uses = ctx
            .urls
            .find_by_identifier(identifier)
            .await
            .unwrap()
            .map(|r| r.current_uses)
            .unwrap_or_default();

        if uses >= expected {
            return;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("usage counter for {identifier} did not reach {expected}");
}

/// Injects a fixed peer address so handlers using `ConnectInfo` work under
/// the test server.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> tower::Layer<S> for MockConnectInfoLayer {
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
