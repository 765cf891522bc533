//! Application services orchestrating the domain.

pub mod auth_service;
pub mod hot_set;
pub mod quota_service;
pub mod redeem_service;
pub mod shorten_service;

pub use auth_service::AuthService;
pub use hot_set::HotSetRebuilder;
pub use quota_service::QuotaService;
pub use redeem_service::RedeemService;
pub use shorten_service::{CreateShortUrl, CreatedShortUrl, ShortenService};
