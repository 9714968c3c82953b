//! Raw engine handles and the owned handle wrapper.

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::registry::CloseReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque identifier issued by the storage engine for one open resource.
///
/// Only strictly positive values refer to open resources; [`Hid::INVALID`]
/// and any other non-positive value mean "not open".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hid(i64);

impl Hid {
    /// The "not open" sentinel.
    pub const INVALID: Hid = Hid(-1);

    /// Wrap a raw engine identifier.
    pub const fn new(raw: i64) -> Self {
        Hid(raw)
    }

    /// The raw engine identifier.
    pub fn raw(self) -> i64 {
        self.0
    }

    /// True if this value may refer to an open resource.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Hid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Container,
    Object,
}

/// An open engine resource owned by the caller.
///
/// The handle is closed exactly once: explicitly with [`Handle::close`], or
/// on drop. Containers are closed with the leak sweep of
/// [`Hierarchy::close_container`]. Use [`Handle::into_raw`] to hand the
/// resource over to code that closes it itself.
pub struct Handle<'h, E: StorageEngine> {
    id: Hid,
    role: Role,
    owner: &'h Hierarchy<E>,
}

impl<'h, E: StorageEngine> Handle<'h, E> {
    pub(crate) fn container(id: Hid, owner: &'h Hierarchy<E>) -> Self {
        Self {
            id,
            role: Role::Container,
            owner,
        }
    }

    pub(crate) fn object(id: Hid, owner: &'h Hierarchy<E>) -> Self {
        Self {
            id,
            role: Role::Object,
            owner,
        }
    }

    /// The underlying engine identifier, still owned by this handle.
    pub fn id(&self) -> Hid {
        self.id
    }

    /// True if this handle owns a container.
    pub fn is_container(&self) -> bool {
        self.role == Role::Container
    }

    /// Give up ownership without closing.
    pub fn into_raw(mut self) -> Hid {
        std::mem::replace(&mut self.id, Hid::INVALID)
    }

    /// Close the resource, reporting any failure.
    pub fn close(mut self) -> Result<()> {
        let id = std::mem::replace(&mut self.id, Hid::INVALID);
        self.release(id).map(|_| ())
    }

    /// Close a container handle and return what the leak sweep found.
    ///
    /// For a non-container handle this is a plain close with an empty report.
    pub fn close_container(mut self) -> Result<CloseReport> {
        let id = std::mem::replace(&mut self.id, Hid::INVALID);
        self.release(id)
    }

    fn release(&self, id: Hid) -> Result<CloseReport> {
        match self.role {
            Role::Container => self.owner.close_container(id),
            Role::Object => self
                .owner
                .close(id)
                .map(|_| CloseReport::default()),
        }
    }
}

impl<E: StorageEngine> Drop for Handle<'_, E> {
    fn drop(&mut self) {
        if !self.id.is_valid() {
            return;
        }
        let id = std::mem::replace(&mut self.id, Hid::INVALID);
        if let Err(err) = self.release(id) {
            tracing::error!(handle = %id, "failed to close handle on drop: {}", err);
        }
    }
}

impl<E: StorageEngine> fmt::Debug for Handle<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hid_validity() {
        assert!(!Hid::INVALID.is_valid());
        assert!(!Hid::new(0).is_valid());
        assert!(Hid::new(7).is_valid());
        assert_eq!(Hid::new(7).raw(), 7);
        assert_eq!(Hid::new(7).to_string(), "7");
    }
}
