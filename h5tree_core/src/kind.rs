//! Node kinds, kind filters and runtime handle kinds.

use std::fmt;

/// Kind of an object stored in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// An internal node holding named children.
    Group = 1,
    /// A leaf holding typed array data.
    Dataset = 2,
    /// A committed (named) datatype.
    NamedType = 4,
    /// A link that does not resolve to an object.
    Link = 8,
}

impl NodeKind {
    /// Bit of this kind inside a [`KindFilter`].
    pub fn bit(self) -> u8 {
        self as u8
    }

    /// Human readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Dataset => "dataset",
            NodeKind::NamedType => "named type",
            NodeKind::Link => "link",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of node kinds, stored as a bitmask.
///
/// [`KindFilter::ANY`] is the union of every concrete kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindFilter(u8);

impl KindFilter {
    pub const NONE: KindFilter = KindFilter(0);
    pub const GROUP: KindFilter = KindFilter(NodeKind::Group as u8);
    pub const DATASET: KindFilter = KindFilter(NodeKind::Dataset as u8);
    pub const NAMED_TYPE: KindFilter = KindFilter(NodeKind::NamedType as u8);
    pub const LINK: KindFilter = KindFilter(NodeKind::Link as u8);
    pub const ANY: KindFilter = KindFilter(
        NodeKind::Group as u8
            | NodeKind::Dataset as u8
            | NodeKind::NamedType as u8
            | NodeKind::Link as u8,
    );

    /// Build a filter from raw bits. Bits outside [`KindFilter::ANY`] are dropped.
    pub fn from_bits(bits: u8) -> Self {
        KindFilter(bits & Self::ANY.0)
    }

    /// Raw bitmask.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Set union.
    pub fn union(self, other: KindFilter) -> KindFilter {
        KindFilter(self.0 | other.0)
    }

    /// Set intersection.
    pub fn intersection(self, other: KindFilter) -> KindFilter {
        KindFilter(self.0 & other.0)
    }

    /// True if the two filters share at least one kind.
    pub fn intersects(self, other: KindFilter) -> bool {
        self.0 & other.0 != 0
    }

    /// True if `kind` is a member of this filter.
    pub fn contains(self, kind: NodeKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// True if every kind is selected.
    pub fn is_any(self) -> bool {
        self.0 == Self::ANY.0
    }

    /// True if no kind is selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<NodeKind> for KindFilter {
    fn from(kind: NodeKind) -> Self {
        KindFilter(kind.bit())
    }
}

impl FromIterator<NodeKind> for KindFilter {
    fn from_iter<I: IntoIterator<Item = NodeKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(KindFilter::NONE, |acc, kind| acc.union(kind.into()))
    }
}

/// Runtime kind tag of an open handle, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandleKind {
    File,
    Group,
    Dataset,
    Attribute,
    Datatype,
    Dataspace,
    /// Any kind the registry does not know how to close.
    Other(String),
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::File => f.write_str("file"),
            HandleKind::Group => f.write_str("group"),
            HandleKind::Dataset => f.write_str("dataset"),
            HandleKind::Attribute => f.write_str("attribute"),
            HandleKind::Datatype => f.write_str("datatype"),
            HandleKind::Dataspace => f.write_str("dataspace"),
            HandleKind::Other(name) => f.write_str(name),
        }
    }
}

/// Which open handles to report when asking the engine about a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenObjectFilter {
    pub datasets: bool,
    pub groups: bool,
    pub datatypes: bool,
    pub attributes: bool,
    pub dataspaces: bool,
}

impl OpenObjectFilter {
    /// Every descendant object kind that can leak past a container close.
    pub const DESCENDANTS: OpenObjectFilter = OpenObjectFilter {
        datasets: true,
        groups: true,
        datatypes: true,
        attributes: true,
        dataspaces: false,
    };

    /// True if a handle of `kind` passes the filter.
    pub fn accepts(&self, kind: &HandleKind) -> bool {
        match kind {
            HandleKind::Dataset => self.datasets,
            HandleKind::Group => self.groups,
            HandleKind::Datatype => self.datatypes,
            HandleKind::Attribute => self.attributes,
            HandleKind::Dataspace => self.dataspaces,
            HandleKind::File | HandleKind::Other(_) => false,
        }
    }
}
