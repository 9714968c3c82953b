//! Node kind and existence probes.

use crate::engine::StorageEngine;
use crate::error::{Error, Result};
use crate::handle::Hid;
use crate::hierarchy::{Hierarchy, Session};
use crate::kind::NodeKind;
use tracing::trace;

impl<E: StorageEngine> Session<'_, E> {
    /// Kind of the object at `path` under `root`.
    ///
    /// Any engine failure reads as [`Error::NotFound`].
    pub(crate) fn kind_of(&self, root: Hid, path: &str) -> Result<NodeKind> {
        match self.engine.object_info(root, path) {
            Ok(info) => Ok(info.kind),
            Err(err) => {
                trace!(root = %root, path, "metadata query failed: {}", err);
                Err(Error::not_found(path))
            }
        }
    }

    /// Existence through the engine's dedicated probe.
    pub(crate) fn exists(&self, root: Hid, path: &str) -> bool {
        match self.engine.object_exists(root, path) {
            Ok(found) => found,
            Err(err) => {
                trace!(root = %root, path, "existence probe failed: {}", err);
                false
            }
        }
    }

    pub(crate) fn is_group(&self, root: Hid, path: &str) -> bool {
        matches!(self.kind_of(root, path), Ok(NodeKind::Group))
    }
}

impl<E: StorageEngine> Hierarchy<E> {
    /// Kind of the object at `path` relative to `root`.
    ///
    /// Returns [`Error::NotFound`] when nothing is there (or the engine
    /// cannot say); that outcome is expected and not logged as an error.
    pub fn kind_of(&self, root: Hid, path: &str) -> Result<NodeKind> {
        self.session().kind_of(root, path)
    }

    /// True if the engine's existence probe finds an object at `path`.
    ///
    /// Unlike [`Hierarchy::kind_of`] this does not read object metadata, and
    /// the two may disagree for links the engine treats specially.
    pub fn exists(&self, root: Hid, path: &str) -> bool {
        self.session().exists(root, path)
    }

    /// True if `path` resolves to a group.
    pub fn is_group(&self, root: Hid, path: &str) -> bool {
        self.session().is_group(root, path)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::StorageEngine;
    use crate::hierarchy::test_support::hierarchy;
    use crate::kind::NodeKind;

    #[test]
    fn test_kind_of() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        h.ensure_path(file.id(), "a/b").unwrap();
        h.create_dataset(file.id(), "a/data", &[4]).unwrap().close().unwrap();
        h.engine().commit_named_type(file.id(), "t0").unwrap();

        assert_eq!(h.kind_of(file.id(), "a").unwrap(), NodeKind::Group);
        assert_eq!(h.kind_of(file.id(), "/a/b").unwrap(), NodeKind::Group);
        assert_eq!(h.kind_of(file.id(), "a/data").unwrap(), NodeKind::Dataset);
        assert_eq!(h.kind_of(file.id(), "t0").unwrap(), NodeKind::NamedType);
        assert!(h.kind_of(file.id(), "missing").unwrap_err().is_not_found());
        assert!(h.is_group(file.id(), "a"));
        assert!(!h.is_group(file.id(), "a/data"));
    }

    #[test]
    fn test_exists() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        h.ensure_path(file.id(), "a").unwrap();

        assert!(h.exists(file.id(), "a"));
        assert!(!h.exists(file.id(), "b"));
        // Probe errors on a missing intermediate are absorbed.
        assert!(!h.exists(file.id(), "b/c"));
    }

    #[test]
    fn test_dangling_link_is_absent_to_both_probes() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        h.engine()
            .create_soft_link(file.id(), "ghost", "/nowhere")
            .unwrap();

        assert!(!h.exists(file.id(), "ghost"));
        assert!(h.kind_of(file.id(), "ghost").is_err());
    }
}
