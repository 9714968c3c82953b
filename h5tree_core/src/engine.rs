//! The storage engine capability interface.
//!
//! The engine owns the bytes, the on-disk datatypes and the handle table.
//! This crate only orchestrates it through [`StorageEngine`]; see
//! [`crate::MemoryEngine`] for the in-memory implementation.

use crate::error::Result;
use crate::handle::Hid;
use crate::kind::{HandleKind, NodeKind, OpenObjectFilter};
use serde::{Deserialize, Serialize};

/// Access mode for opening an existing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    ReadOnly,
    ReadWrite,
}

/// Container format compatibility levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LibVersion {
    Earliest,
    V18,
    V110,
    Latest,
}

/// Range of format versions an engine may use when writing objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionBounds {
    pub low: LibVersion,
    pub high: LibVersion,
}

impl VersionBounds {
    /// The fixed range used for every container this crate opens or creates.
    pub const COMPAT: VersionBounds = VersionBounds {
        low: LibVersion::V18,
        high: LibVersion::V18,
    };
}

/// Metadata returned by [`StorageEngine::object_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
    pub kind: NodeKind,
    pub num_attrs: usize,
}

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl AttrValue {
    /// Number of dimensions of the attribute's dataspace.
    pub fn rank(&self) -> usize {
        match self {
            AttrValue::Int(_) | AttrValue::Float(_) | AttrValue::Text(_) => 0,
            AttrValue::IntArray(_) | AttrValue::FloatArray(_) => 1,
        }
    }

    /// Parse a command-line value: integer, float, comma separated list of
    /// either, or text.
    pub fn parse(input: &str) -> AttrValue {
        if let Ok(v) = input.parse::<i64>() {
            return AttrValue::Int(v);
        }
        if let Ok(v) = input.parse::<f64>() {
            return AttrValue::Float(v);
        }
        if input.contains(',') {
            let parts: Vec<&str> = input.split(',').map(str::trim).collect();
            if let Ok(ints) = parts
                .iter()
                .map(|p| p.parse::<i64>())
                .collect::<std::result::Result<Vec<_>, _>>()
            {
                return AttrValue::IntArray(ints);
            }
            if let Ok(floats) = parts
                .iter()
                .map(|p| p.parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
            {
                return AttrValue::FloatArray(floats);
            }
        }
        AttrValue::Text(input.to_string())
    }
}

/// Primitive operations a storage engine must provide.
///
/// Names passed alongside a location handle are relative to that location and
/// may contain `/` to reach deeper objects; `"."` names the location itself.
/// Every method is a synchronous, blocking call. Callers serialize access with
/// [`crate::EngineLock`]; implementations need not be reentrant.
pub trait StorageEngine: Send + Sync {
    /// Create (truncating) a container and return its handle.
    fn create_file(&self, path: &str, bounds: VersionBounds) -> Result<Hid>;

    /// Open an existing container.
    fn open_file(&self, path: &str, mode: FileMode, bounds: VersionBounds) -> Result<Hid>;

    /// Release a container handle.
    fn close_file(&self, file: Hid) -> Result<()>;

    /// Create a group at `name` under `loc`. The parent must already exist.
    fn create_group(&self, loc: Hid, name: &str) -> Result<Hid>;

    fn open_group(&self, loc: Hid, name: &str) -> Result<Hid>;

    fn close_group(&self, group: Hid) -> Result<()>;

    /// Create a dataset with the given shape. The parent must already exist.
    fn create_dataset(&self, loc: Hid, name: &str, shape: &[u64]) -> Result<Hid>;

    fn open_dataset(&self, loc: Hid, name: &str) -> Result<Hid>;

    fn close_dataset(&self, dataset: Hid) -> Result<()>;

    /// Open the dataspace of a dataset.
    fn dataset_space(&self, dataset: Hid) -> Result<Hid>;

    /// Open the datatype of a dataset.
    fn dataset_type(&self, dataset: Hid) -> Result<Hid>;

    fn close_dataspace(&self, space: Hid) -> Result<()>;

    fn close_datatype(&self, datatype: Hid) -> Result<()>;

    /// Commit a named datatype at `name` under `loc`.
    fn commit_named_type(&self, loc: Hid, name: &str) -> Result<()>;

    /// Create a soft link at `name` pointing to `target` (not checked).
    fn create_soft_link(&self, loc: Hid, name: &str, target: &str) -> Result<()>;

    /// Kind and attribute count of the object at `name`, following links.
    fn object_info(&self, loc: Hid, name: &str) -> Result<ObjectInfo>;

    /// Existence probe distinct from [`StorageEngine::object_info`].
    fn object_exists(&self, loc: Hid, name: &str) -> Result<bool>;

    /// Number of links in a group.
    fn link_count(&self, group: Hid) -> Result<usize>;

    /// Name of the link at `index` in native iteration order.
    fn link_name_by_index(&self, group: Hid, index: usize) -> Result<String>;

    /// Create or replace an attribute on the object `loc` refers to.
    fn write_attribute(&self, loc: Hid, name: &str, value: AttrValue) -> Result<()>;

    /// Open the attribute at `index` in native (insertion) order.
    fn open_attribute_by_index(&self, loc: Hid, index: usize) -> Result<Hid>;

    fn attribute_name(&self, attr: Hid) -> Result<String>;

    fn close_attribute(&self, attr: Hid) -> Result<()>;

    /// Rank of attribute `attr_name` on the object at `object` under `loc`.
    fn attribute_rank(&self, loc: Hid, object: &str, attr_name: &str) -> Result<usize>;

    /// Precise existence query for an attribute on the object `loc` refers to.
    fn attribute_exists(&self, loc: Hid, name: &str) -> Result<bool>;

    /// Handles still open against the container `file`, filtered by kind.
    fn open_object_ids(&self, file: Hid, filter: OpenObjectFilter) -> Result<Vec<Hid>>;

    /// Runtime kind tag of an open handle.
    fn handle_kind(&self, id: Hid) -> Result<HandleKind>;

    /// Absolute path of the object a handle refers to.
    fn handle_path(&self, id: Hid) -> Result<String>;

    /// Drop a handle regardless of its kind.
    fn release(&self, id: Hid) -> Result<()>;
}
