//! Core business entities.

pub mod actor;
pub mod short_url;

pub use actor::Actor;
pub use short_url::{NewShortUrl, ShortUrl};
