use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of opaque session identities. Every call must return a token that has not been
/// handed out before in this process.
pub trait IdentityProvider: Send + Sync {
    fn new_identity(&self) -> SessionId;
}

#[derive(Clone, Debug, Default)]
pub struct UuidIdentityProvider;

impl IdentityProvider for UuidIdentityProvider {
    fn new_identity(&self) -> SessionId {
        SessionId(Uuid::new_v4().to_string())
    }
}

/// Deterministic identities (`<prefix>-1`, `<prefix>-2`, ...) for replays and tests.
#[derive(Debug)]
pub struct SequentialIdentityProvider {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdentityProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next: AtomicU64::new(1) }
    }
}

impl Default for SequentialIdentityProvider {
    fn default() -> Self {
        Self::new("session")
    }
}

impl IdentityProvider for SequentialIdentityProvider {
    fn new_identity(&self) -> SessionId {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("{}-{value}", self.prefix))
    }
}
