use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Token captured when async work starts; compared when its result is drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic counter that invalidates in-flight work when bumped.
///
/// Clones share the same counter so a background task can cheaply report
/// whether it is still wanted before doing expensive work.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate everything issued so far and return a fresh token.
    pub fn bump(&self) -> GenerationToken {
        GenerationToken(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> GenerationToken {
        GenerationToken(self.0.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, token: GenerationToken) -> bool {
        self.current() == token
    }
}
