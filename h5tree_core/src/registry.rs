//! Opening and closing engine handles.
//!
//! Handles are opened with the primitive that matches the object's kind and
//! closed with the primitive that matches the handle's runtime kind. Closing a
//! container first sweeps every descendant handle still open against it.

use crate::engine::{FileMode, StorageEngine, VersionBounds};
use crate::error::{Error, Result};
use crate::handle::{Handle, Hid};
use crate::hierarchy::{Hierarchy, Session};
use crate::kind::{HandleKind, NodeKind, OpenObjectFilter};
use crate::path;
use tracing::{debug, error, warn};

/// A handle found open while its container was being closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakedHandle {
    pub id: Hid,
    pub kind: HandleKind,
    /// Resolved path of the object, for diagnostics.
    pub path: String,
}

/// Outcome of closing a container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseReport {
    /// Handles that were still open and got force-closed.
    pub leaked: Vec<LeakedHandle>,
}

impl CloseReport {
    /// True if nothing had to be reclaimed.
    pub fn is_clean(&self) -> bool {
        self.leaked.is_empty()
    }
}

impl<E: StorageEngine> Session<'_, E> {
    pub(crate) fn create_file(&self, file_path: &str) -> Result<Hid> {
        let id = self.engine.create_file(file_path, VersionBounds::COMPAT)?;
        debug!(file = %id, path = file_path, "created container");
        Ok(id)
    }

    pub(crate) fn open_file(&self, file_path: &str, mode: FileMode) -> Result<Hid> {
        let id = self
            .engine
            .open_file(file_path, mode, VersionBounds::COMPAT)?;
        debug!(file = %id, path = file_path, ?mode, "opened container");
        Ok(id)
    }

    /// Open a group or dataset by path.
    pub(crate) fn open(&self, root: Hid, object_path: &str) -> Result<Hid> {
        match self.kind_of(root, object_path)? {
            NodeKind::Group => self.engine.open_group(root, object_path),
            NodeKind::Dataset => self.engine.open_dataset(root, object_path),
            other => {
                warn!(path = object_path, kind = %other, "cannot open object of this kind");
                Err(Error::unsupported_kind(object_path, other.as_str()))
            }
        }
    }

    /// Close any handle by its runtime kind. Invalid handles are a no-op.
    pub(crate) fn close(&self, id: Hid) -> Result<()> {
        if !id.is_valid() {
            return Ok(());
        }

        let object_path = self.engine.handle_path(id).map_err(|err| {
            error!(handle = %id, "cannot resolve the name of a handle being closed: {}", err);
            Error::engine("close", format!("cannot resolve handle {}: {}", id, err))
        })?;

        match self.engine.handle_kind(id)? {
            HandleKind::File => self.engine.close_file(id),
            HandleKind::Group => self.engine.close_group(id),
            HandleKind::Dataset => self.engine.close_dataset(id),
            HandleKind::Attribute => self.engine.close_attribute(id),
            HandleKind::Datatype => self.engine.close_datatype(id),
            HandleKind::Dataspace => self.engine.close_dataspace(id),
            HandleKind::Other(kind) => {
                error!(handle = %id, path = %object_path, kind = %kind, "unknown handle kind");
                if let Err(err) = self.engine.release(id) {
                    error!(handle = %id, "forced release failed: {}", err);
                }
                Err(Error::unknown_handle_kind(id.raw(), kind))
            }
        }
    }

    /// Close a container after force-closing every descendant still open.
    pub(crate) fn close_container(&self, file: Hid) -> Result<CloseReport> {
        let mut report = CloseReport::default();
        if !file.is_valid() {
            return Ok(report);
        }

        let open = self
            .engine
            .open_object_ids(file, OpenObjectFilter::DESCENDANTS)?;
        if !open.is_empty() {
            warn!(file = %file, count = open.len(), "handles left open; closing them");
        }

        for id in open {
            let object_path = self.engine.handle_path(id).inspect_err(|err| {
                error!(handle = %id, "cannot resolve the name of a leaked handle: {}", err);
            })?;
            let kind = self.engine.handle_kind(id)?;
            warn!(handle = %id, kind = %kind, path = %object_path, "object left open");

            if let Err(err) = self.close(id) {
                error!(handle = %id, path = %object_path, "failed to close leaked handle: {}", err);
            }
            report.leaked.push(LeakedHandle {
                id,
                kind,
                path: object_path,
            });
        }

        let remaining = self
            .engine
            .open_object_ids(file, OpenObjectFilter::DESCENDANTS)?;
        if !remaining.is_empty() {
            error!(
                file = %file,
                remaining = remaining.len(),
                "container left open; descendants could not be closed"
            );
            return Err(Error::container_busy(file.raw(), remaining.len()));
        }

        self.engine.close_file(file).inspect_err(|err| {
            error!(file = %file, "error closing container: {}", err);
        })?;
        debug!(file = %file, leaked = report.leaked.len(), "closed container");
        Ok(report)
    }

    /// Resolved path of the object behind a handle, without the leading `/`.
    pub(crate) fn object_path(&self, id: Hid) -> Result<String> {
        let resolved = self.engine.handle_path(id)?;
        Ok(path::trim_object_path(&resolved).to_string())
    }
}

impl<E: StorageEngine> Hierarchy<E> {
    /// Create (truncating) a container with the fixed version bounds.
    pub fn create_file(&self, file_path: &str) -> Result<Handle<'_, E>> {
        let id = self.session().create_file(file_path)?;
        Ok(Handle::container(id, self))
    }

    /// Open an existing container with the fixed version bounds.
    pub fn open_file(&self, file_path: &str, mode: FileMode) -> Result<Handle<'_, E>> {
        let id = self.session().open_file(file_path, mode)?;
        Ok(Handle::container(id, self))
    }

    /// Open the group or dataset at `path` relative to `root`.
    ///
    /// Named datatypes and anything else give [`Error::UnsupportedKind`].
    pub fn open(&self, root: Hid, object_path: &str) -> Result<Handle<'_, E>> {
        let id = self.session().open(root, object_path)?;
        Ok(Handle::object(id, self))
    }

    /// Close a raw handle by its runtime kind.
    ///
    /// Closing [`Hid::INVALID`] succeeds and does nothing.
    pub fn close(&self, id: Hid) -> Result<()> {
        self.session().close(id)
    }

    /// Close a raw container handle, reclaiming leaked descendants first.
    pub fn close_container(&self, file: Hid) -> Result<CloseReport> {
        self.session().close_container(file)
    }

    /// Path of the object behind `id`, relative to its container root.
    pub fn object_path(&self, id: Hid) -> Result<String> {
        self.session().object_path(id)
    }

    /// Parent path of the object behind `id` (see [`path::parent_of`]).
    pub fn parent_path(&self, id: Hid) -> Result<String> {
        let object_path = self.session().object_path(id)?;
        Ok(path::parent_of(&object_path).to_string())
    }
}
