//! Listing the children of a group.

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::handle::Hid;
use crate::hierarchy::{Hierarchy, Session};
use crate::kind::KindFilter;
use tracing::{error, trace};

impl<E: StorageEngine> Session<'_, E> {
    pub(crate) fn list_children(&self, group: Hid, filter: KindFilter) -> Result<Vec<String>> {
        let count = self.engine.link_count(group)?;
        let mut names = Vec::with_capacity(count);

        for index in 0..count {
            let name = self.object_name_at(group, index)?;
            if filter.is_any() {
                names.push(name);
                continue;
            }
            match self.kind_of(group, &name) {
                Ok(kind) if filter.contains(kind) => names.push(name),
                Ok(_) => {}
                Err(_) => trace!(group = %group, child = %name, "skipping child of unknown kind"),
            }
        }

        Ok(names)
    }

    pub(crate) fn object_name_at(&self, group: Hid, index: usize) -> Result<String> {
        self.engine
            .link_name_by_index(group, index)
            .inspect_err(|err| {
                error!(group = %group, index, "cannot read child name: {}", err);
            })
    }
}

impl<E: StorageEngine> Hierarchy<E> {
    /// Names of the children of `group`, in the engine's native link order.
    ///
    /// With a filter other than [`KindFilter::ANY`] each child's kind is
    /// looked up and only matching names are kept; a child whose kind cannot
    /// be determined (a dangling link, say) is skipped.
    pub fn list_children(&self, group: Hid, filter: KindFilter) -> Result<Vec<String>> {
        self.session().list_children(group, filter)
    }

    /// Name of the child at `index` in native link order.
    pub fn object_name_at(&self, group: Hid, index: usize) -> Result<String> {
        self.session().object_name_at(group, index)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::StorageEngine;
    use crate::hierarchy::test_support::hierarchy;
    use crate::kind::KindFilter;

    /// Builds `/mix` holding, in order: g1, d1, g2, t1 (named type), d2, dangling.
    fn mixed(h: &crate::Hierarchy<crate::MemoryEngine>, file: crate::Hid) {
        h.ensure_path(file, "mix/g1").unwrap();
        h.create_dataset(file, "mix/d1", &[1]).unwrap().close().unwrap();
        h.ensure_path(file, "mix/g2").unwrap();
        h.engine().commit_named_type(file, "mix/t1").unwrap();
        h.create_dataset(file, "mix/d2", &[2]).unwrap().close().unwrap();
        h.engine()
            .create_soft_link(file, "mix/dangling", "/gone")
            .unwrap();
    }

    #[test]
    fn test_list_children_filtered() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        mixed(&h, file.id());
        let mix = h.open(file.id(), "mix").unwrap();

        assert_eq!(
            h.list_children(mix.id(), KindFilter::GROUP).unwrap(),
            vec!["g1", "g2"]
        );
        assert_eq!(
            h.list_children(mix.id(), KindFilter::DATASET).unwrap(),
            vec!["d1", "d2"]
        );
        assert_eq!(
            h.list_children(mix.id(), KindFilter::NAMED_TYPE).unwrap(),
            vec!["t1"]
        );
    }

    #[test]
    fn test_any_matches_union_plus_unresolvable() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        mixed(&h, file.id());
        let mix = h.open(file.id(), "mix").unwrap();

        let union = KindFilter::GROUP.union(KindFilter::DATASET);
        assert_eq!(
            h.list_children(mix.id(), union).unwrap(),
            vec!["g1", "d1", "g2", "d2"]
        );
        assert_eq!(
            h.list_children(mix.id(), KindFilter::ANY).unwrap(),
            vec!["g1", "d1", "g2", "t1", "d2", "dangling"]
        );
    }

    #[test]
    fn test_group_filter_never_returns_datasets() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        mixed(&h, file.id());
        let mix = h.open(file.id(), "mix").unwrap();

        for name in h.list_children(mix.id(), KindFilter::GROUP).unwrap() {
            assert!(h.is_group(mix.id(), &name));
        }
    }

    #[test]
    fn test_list_children_of_empty_group_and_dataset() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        assert!(h.list_children(file.id(), KindFilter::ANY).unwrap().is_empty());

        let ds = h.create_dataset(file.id(), "d", &[1]).unwrap();
        assert!(h.list_children(ds.id(), KindFilter::ANY).is_err());
    }

    #[test]
    fn test_object_name_at() {
        let h = hierarchy();
        let file = h.create_file("t.h5").unwrap();
        h.ensure_path(file.id(), "first").unwrap();
        h.ensure_path(file.id(), "second").unwrap();

        assert_eq!(h.object_name_at(file.id(), 1).unwrap(), "second");
        assert!(h.object_name_at(file.id(), 2).is_err());
    }
}
