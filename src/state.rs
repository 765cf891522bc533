//! Shared application state handed to request handlers.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{AuthService, QuotaService, RedeemService, ShortenService};
use crate::domain::repositories::UrlRepository;
use crate::domain::usage_event::UsageEvent;
use crate::infrastructure::cache::HotSetCache;

/// Application state shared across handlers.
///
/// Services own the business logic; the raw repository and cache handles are
/// kept only for the health endpoint's reachability probes. `usage_sender` is
/// held so the health check can report on the accounting queue without going
/// through a service.
#[derive(Clone)]
pub struct AppState {
    pub shorten_service: Arc<ShortenService>,
    pub redeem_service: Arc<RedeemService>,
    pub auth_service: Arc<AuthService>,
    pub quota_service: Arc<QuotaService>,
    pub urls: Arc<dyn UrlRepository>,
    pub cache: Arc<dyn HotSetCache>,
    pub usage_sender: mpsc::Sender<UsageEvent>,
    /// Trust forwarded-for headers when resolving quota actors.
    pub behind_proxy: bool,
}
