//! Creating group hierarchies from paths.

use crate::engine::StorageEngine;
use crate::error::{Error, Result};
use crate::handle::{Handle, Hid};
use crate::hierarchy::{Hierarchy, Session};
use crate::path;
use tracing::{debug, error};

/// Progress of a multi-segment walk.
///
/// `Pending(i)` means segments `0..i` are ensured. `Creating` carries the
/// prefix rebuilt from `segments[..=index]`.
#[derive(Debug)]
enum BuildState {
    Pending(usize),
    Creating { index: usize, prefix: String },
    Done,
    Failed(Error),
}

impl<E: StorageEngine> Session<'_, E> {
    /// Open the group `name` under `root`, creating it if it does not exist.
    ///
    /// The probe and the create are separate engine calls; if another writer
    /// gets in between, the create fails and that failure is returned as is.
    pub(crate) fn ensure_group(&self, root: Hid, name: &str) -> Result<Hid> {
        match self.kind_of(root, name) {
            Ok(_) => self.engine.open_group(root, name).inspect_err(|err| {
                error!(root = %root, group = name, "error opening group: {}", err);
            }),
            Err(_) => {
                let id = self.engine.create_group(root, name).inspect_err(|err| {
                    error!(root = %root, group = name, "error creating group: {}", err);
                })?;
                debug!(root = %root, group = name, "created group");
                Ok(id)
            }
        }
    }

    pub(crate) fn ensure_path(&self, root: Hid, group_path: &str) -> Result<()> {
        if !root.is_valid() {
            return Err(Error::invalid_handle(root.raw()));
        }

        let segments = path::normalize(group_path);
        match segments.as_slice() {
            [] => return Err(Error::invalid_path(group_path, "path names no group")),
            [only] => {
                let id = self.ensure_group(root, only)?;
                return self.close(id);
            }
            _ => {}
        }

        let mut state = BuildState::Pending(0);
        loop {
            state = match state {
                BuildState::Pending(index) if index == segments.len() => BuildState::Done,
                BuildState::Pending(index) => BuildState::Creating {
                    index,
                    prefix: segments[..=index].join("/"),
                },
                BuildState::Creating { index, prefix } => {
                    match self
                        .ensure_group(root, &prefix)
                        .and_then(|id| self.close(id))
                    {
                        Ok(()) => BuildState::Pending(index + 1),
                        Err(err) => {
                            error!(root = %root, prefix = %prefix, "stopping group creation: {}", err);
                            BuildState::Failed(err)
                        }
                    }
                }
                BuildState::Done => return Ok(()),
                BuildState::Failed(err) => return Err(err),
            };
        }
    }

    pub(crate) fn ensure_groups_for_dataset(&self, root: Hid, dataset_path: &str) -> Result<()> {
        let parent = path::parent_of(dataset_path);
        if parent.is_empty() {
            return Ok(());
        }
        self.ensure_path(root, parent)
    }
}

impl<E: StorageEngine> Hierarchy<E> {
    /// Open or create a single group directly under `root`.
    pub fn ensure_group(&self, root: Hid, name: &str) -> Result<Handle<'_, E>> {
        let id = self.session().ensure_group(root, name)?;
        Ok(Handle::object(id, self))
    }

    /// Make sure every group along `group_path` exists under `root`.
    ///
    /// Existing groups are reused, missing ones created. The walk stops at the
    /// first failure and groups created before it are left in place.
    pub fn ensure_path(&self, root: Hid, group_path: &str) -> Result<()> {
        self.session().ensure_path(root, group_path)
    }

    /// Make sure the groups above `dataset_path` exist.
    ///
    /// A dataset directly under `root` needs nothing and succeeds.
    pub fn ensure_groups_for_dataset(&self, root: Hid, dataset_path: &str) -> Result<()> {
        self.session().ensure_groups_for_dataset(root, dataset_path)
    }

    /// Create a dataset, creating any missing parent groups first.
    pub fn create_dataset(
        &self,
        root: Hid,
        dataset_path: &str,
        shape: &[u64],
    ) -> Result<Handle<'_, E>> {
        let id = {
            let session = self.session();
            session.ensure_groups_for_dataset(root, dataset_path)?;
            let id = session.engine.create_dataset(root, dataset_path, shape)?;
            debug!(root = %root, dataset = dataset_path, ?shape, "created dataset");
            id
        };
        Ok(Handle::object(id, self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::test_support::hierarchy;
    use crate::kind::{KindFilter, NodeKind};

    #[test]
    fn test_ensure_group_creates_then_reuses() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();

        h.ensure_group(file.id(), "g").unwrap().close().unwrap();
        h.ensure_group(file.id(), "g").unwrap().close().unwrap();
        assert_eq!(h.engine().stats().groups_created, 1);
    }

    #[test]
    fn test_ensure_path_creates_each_level() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();

        assert!(h.kind_of(file.id(), "a").is_err());
        h.ensure_path(file.id(), "a/b/c").unwrap();

        for p in ["a", "a/b", "a/b/c"] {
            assert_eq!(h.kind_of(file.id(), p).unwrap(), NodeKind::Group);
        }
        assert_eq!(h.engine().stats().groups_created, 3);
        assert_eq!(h.engine().stats().open_handles, 1);
    }

    #[test]
    fn test_ensure_path_is_idempotent() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();

        h.ensure_path(file.id(), "a/b/c").unwrap();
        let before = h.list_children(file.id(), KindFilter::ANY).unwrap();
        h.ensure_path(file.id(), "/a/b/c/").unwrap();

        assert_eq!(h.engine().stats().groups_created, 3);
        assert_eq!(h.list_children(file.id(), KindFilter::ANY).unwrap(), before);
    }

    #[test]
    fn test_ensure_path_creates_only_missing() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();

        h.ensure_path(file.id(), "a/b").unwrap();
        h.ensure_path(file.id(), "a/b/c/d").unwrap();
        assert_eq!(h.engine().stats().groups_created, 4);
    }

    #[test]
    fn test_ensure_path_relative_to_group() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        h.ensure_path(file.id(), "top").unwrap();

        let top = h.open(file.id(), "top").unwrap();
        h.ensure_path(top.id(), "x/y").unwrap();
        assert!(h.is_group(file.id(), "top/x/y"));
    }

    #[test]
    fn test_ensure_path_rejects_root_and_bad_handle() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();

        assert!(matches!(
            h.ensure_path(file.id(), "/").unwrap_err(),
            Error::InvalidPath { .. }
        ));
        assert!(matches!(
            h.ensure_path(Hid::INVALID, "a").unwrap_err(),
            Error::InvalidHandle { .. }
        ));
    }

    #[test]
    fn test_ensure_path_stops_at_first_failure_without_rollback() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        h.create_dataset(file.id(), "a/blocker", &[1]).unwrap().close().unwrap();
        let created = h.engine().stats().groups_created;

        assert!(h.ensure_path(file.id(), "a/blocker/c/d").is_err());

        // "a" survives; nothing below the dataset was attempted.
        assert!(h.is_group(file.id(), "a"));
        assert!(!h.exists(file.id(), "a/blocker/c"));
        assert_eq!(h.engine().stats().groups_created, created);
        assert_eq!(h.engine().stats().open_handles, 1);
    }

    #[test]
    fn test_ensure_path_keeps_empty_inner_segment() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();

        assert!(h.ensure_path(file.id(), "a//b").is_err());
        // The first segment was created before the walk failed.
        assert!(h.is_group(file.id(), "a"));
    }

    #[test]
    fn test_ensure_groups_for_dataset() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();

        h.ensure_groups_for_dataset(file.id(), "data").unwrap();
        h.ensure_groups_for_dataset(file.id(), "/data").unwrap();
        assert_eq!(h.engine().stats().groups_created, 0);

        h.ensure_groups_for_dataset(file.id(), "/run/1/data").unwrap();
        assert!(h.is_group(file.id(), "run/1"));
        assert!(!h.exists(file.id(), "run/1/data"));
    }

    #[test]
    fn test_create_dataset_builds_parents() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();

        let ds = h.create_dataset(file.id(), "x/y/values", &[2, 3]).unwrap();
        assert_eq!(h.object_path(ds.id()).unwrap(), "x/y/values");
        ds.close().unwrap();
        assert_eq!(h.kind_of(file.id(), "x/y/values").unwrap(), NodeKind::Dataset);
    }
}
