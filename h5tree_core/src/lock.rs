//! Mutual exclusion around engine calls.
//!
//! The storage engine's client library is not safe for concurrent calls, even
//! on different handles, so every public operation runs while holding an
//! [`EngineLock`]. The process-wide lock is the default; tests and embedders
//! can inject their own.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// A non-reentrant lock serializing engine access.
#[derive(Debug, Default)]
pub struct EngineLock {
    inner: Mutex<()>,
}

/// Proof that the engine lock is held. Released on drop.
pub type EngineGuard<'a> = MutexGuard<'a, ()>;

static GLOBAL: OnceLock<Arc<EngineLock>> = OnceLock::new();

impl EngineLock {
    /// Create an independent lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide lock shared by every [`crate::Hierarchy::new`].
    pub fn global() -> Arc<EngineLock> {
        GLOBAL.get_or_init(|| Arc::new(EngineLock::new())).clone()
    }

    /// Block until the lock is held.
    ///
    /// A poisoned lock is taken over: it guards no data, only the right to
    /// call the engine.
    pub fn acquire(&self) -> EngineGuard<'_> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take the lock if nobody holds it.
    pub fn try_acquire(&self) -> Option<EngineGuard<'_>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(std::sync::TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}
