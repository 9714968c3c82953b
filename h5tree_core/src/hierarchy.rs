//! The hierarchy manager facade.
//!
//! [`Hierarchy`] owns a storage engine and the lock that serializes access to
//! it. Each public operation takes the lock once and runs to completion
//! inside a [`Session`]; the component modules (`registry`, `oracle`,
//! `builder`, `children`, `attrs`) implement their logic on `Session` so that
//! nested calls never try to take the lock again.

use crate::engine::StorageEngine;
use crate::lock::{EngineGuard, EngineLock};
use std::sync::Arc;

/// Path-based manager for groups, datasets, handles and attributes.
#[derive(Debug)]
pub struct Hierarchy<E: StorageEngine> {
    engine: E,
    lock: Arc<EngineLock>,
}

impl<E: StorageEngine> Hierarchy<E> {
    /// Wrap an engine, serializing calls through the process-wide lock.
    pub fn new(engine: E) -> Self {
        Self::with_lock(engine, EngineLock::global())
    }

    /// Wrap an engine, serializing calls through `lock`.
    pub fn with_lock(engine: E, lock: Arc<EngineLock>) -> Self {
        Self { engine, lock }
    }

    /// The wrapped engine.
    ///
    /// Calls made directly on the engine bypass the lock.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The lock guarding engine calls.
    pub fn lock(&self) -> &Arc<EngineLock> {
        &self.lock
    }

    /// Take the lock for the duration of one public operation.
    pub(crate) fn session(&self) -> Session<'_, E> {
        Session {
            engine: &self.engine,
            _guard: self.lock.acquire(),
        }
    }
}

/// Engine access while the lock is held.
pub(crate) struct Session<'a, E: StorageEngine> {
    pub(crate) engine: &'a E,
    _guard: EngineGuard<'a>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::memory::MemoryEngine;

    /// A hierarchy over a fresh in-memory engine with its own lock.
    pub(crate) fn hierarchy() -> Hierarchy<MemoryEngine> {
        Hierarchy::with_lock(MemoryEngine::new(), Arc::new(EngineLock::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::hierarchy;

    #[test]
    fn test_session_holds_lock() {
        let h = hierarchy();
        let session = h.session();
        assert!(h.lock().try_acquire().is_none());
        drop(session);
        assert!(h.lock().try_acquire().is_some());
    }
}
