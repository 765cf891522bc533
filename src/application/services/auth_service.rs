//! Request authentication and actor resolution.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::net::IpAddr;

use crate::domain::entities::Actor;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Resolves the quota actor for a creation request.
///
/// Bearer tokens have the shape `{user_id}.{hex hmac(user_id)}`, signed with
/// the server-side secret, standing in for the external identity provider.
/// A present-but-invalid token is rejected; an absent token degrades to the
/// anonymous actor keyed by client address.
pub struct AuthService {
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value tokens were issued with.
    pub fn new(signing_secret: String) -> Self {
        Self { signing_secret }
    }

    /// Issues a bearer token for a user id.
    ///
    /// Exposed for operational tooling and tests; the service itself never
    /// mints tokens during request handling.
    pub fn issue_token(&self, user_id: &str) -> String {
        format!("{}.{}", user_id, self.sign(user_id))
    }

    /// Verifies a bearer token and returns the embedded user id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] on malformed or forged tokens.
    pub fn verify_token(&self, token: &str) -> Result<String, AppError> {
        let Some((user_id, signature)) = token.rsplit_once('.') else {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Malformed token" }),
            ));
        };

        let Ok(expected) = hex::decode(signature) else {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Malformed token signature" }),
            ));
        };

        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(user_id.as_bytes());

        if mac.verify_slice(&expected).is_err() {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Invalid token" }),
            ));
        }

        Ok(user_id.to_string())
    }

    /// Resolves the actor for a request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] when an Authorization header is
    /// present but does not verify. Requests without the header are
    /// anonymous, not errors.
    pub fn actor_for_request(
        &self,
        headers: &HeaderMap,
        client_ip: IpAddr,
    ) -> Result<Actor, AppError> {
        match bearer_token(headers) {
            Some(token) => Ok(Actor::User(self.verify_token(token)?)),
            None => Ok(Actor::Anonymous(client_ip)),
        }
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}
