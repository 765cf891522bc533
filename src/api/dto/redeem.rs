//! DTOs for the redemption endpoints.

use serde::Deserialize;

/// Optional query parameters on `GET /{identifier}`.
#[derive(Debug, Default, Deserialize)]
pub struct RedeemQuery {
    pub password: Option<String>,
}

/// Form body posted from the password prompt page.
#[derive(Debug, Deserialize)]
pub struct UnlockForm {
    pub password: String,
}
