//! Usage accounting event.

/// A successful redemption pending its counter increment.
///
/// Sent over a bounded channel to the usage worker so the redirect response
/// never waits on the store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEvent {
    pub identifier: String,
}

impl UsageEvent {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}
