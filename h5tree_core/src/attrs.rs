//! Attribute discovery.

use crate::engine::{AttrValue, StorageEngine};
use crate::error::{Error, Result};
use crate::handle::Hid;
use crate::hierarchy::{Hierarchy, Session};
use tracing::trace;

impl<E: StorageEngine> Session<'_, E> {
    pub(crate) fn list_attribute_names(&self, node: Hid) -> Result<Vec<String>> {
        if !node.is_valid() {
            return Err(Error::invalid_handle(node.raw()));
        }

        let info = self.engine.object_info(node, ".")?;
        let mut names = Vec::with_capacity(info.num_attrs);
        for index in 0..info.num_attrs {
            let attr = self.engine.open_attribute_by_index(node, index)?;
            let name = self.engine.attribute_name(attr);
            self.engine.close_attribute(attr)?;
            names.push(name?);
        }
        Ok(names)
    }

    pub(crate) fn list_attribute_names_at(&self, loc: Hid, object: &str) -> Result<Vec<String>> {
        let id = self.open(loc, object)?;
        let names = self.list_attribute_names(id);
        let closed = self.close(id);
        let names = names?;
        closed?;
        Ok(names)
    }

    /// Existence test through the attribute's rank. Any failure reads as
    /// "not present".
    pub(crate) fn probe_attribute(&self, loc: Hid, object: &str, name: &str) -> bool {
        match self.engine.attribute_rank(loc, object, name) {
            Ok(_) => true,
            Err(err) => {
                trace!(loc = %loc, object, attribute = name, "rank probe failed: {}", err);
                false
            }
        }
    }

    pub(crate) fn write_attribute(
        &self,
        loc: Hid,
        object: &str,
        name: &str,
        value: AttrValue,
    ) -> Result<()> {
        let id = self.open(loc, object)?;
        let written = self.engine.write_attribute(id, name, value);
        let closed = self.close(id);
        written?;
        closed
    }
}

impl<E: StorageEngine> Hierarchy<E> {
    /// Attribute names of the object behind `node`, in insertion order.
    pub fn list_attribute_names(&self, node: Hid) -> Result<Vec<String>> {
        self.session().list_attribute_names(node)
    }

    /// Attribute names of the group or dataset at `object` under `loc`.
    ///
    /// The object is opened for the listing and closed again.
    pub fn list_attribute_names_at(&self, loc: Hid, object: &str) -> Result<Vec<String>> {
        self.session().list_attribute_names_at(loc, object)
    }

    /// True if attribute `name` is attached to `object` under `loc`.
    ///
    /// Implemented as a rank query: a failure for any reason, including an
    /// unrelated engine error, answers `false`. Use
    /// [`Hierarchy::attribute_exists`] when that distinction matters.
    pub fn probe_attribute(&self, loc: Hid, object: &str, name: &str) -> bool {
        self.session().probe_attribute(loc, object, name)
    }

    /// Exact existence query for attribute `name` on `node`.
    pub fn attribute_exists(&self, node: Hid, name: &str) -> Result<bool> {
        self.session().engine.attribute_exists(node, name)
    }

    /// Create or replace attribute `name` on the group or dataset at `object`.
    pub fn write_attribute(
        &self,
        loc: Hid,
        object: &str,
        name: &str,
        value: AttrValue,
    ) -> Result<()> {
        self.session().write_attribute(loc, object, name, value)
    }
}
