//! Rate-limit actor identity.

use std::fmt;
use std::net::IpAddr;

/// The identity a daily creation quota is tracked against.
///
/// Authenticated requests are keyed by user id, anonymous requests by the
/// originating network address. The two populations carry independently
/// configured limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    User(String),
    Anonymous(IpAddr),
}

impl Actor {
    /// Returns true for authenticated actors.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user:{id}"),
            Actor::Anonymous(ip) => write!(f, "ip:{ip}"),
        }
    }
}
