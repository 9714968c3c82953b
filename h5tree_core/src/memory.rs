//! In-memory storage engine.
//!
//! [`MemoryEngine`] keeps named containers as node arenas and issues handles
//! from a single table, the way a real engine's client library does. It backs
//! the test suite and the `h5tree` CLI, which loads a container from a JSON
//! snapshot, works on it, and writes it back.

use crate::engine::{AttrValue, FileMode, ObjectInfo, StorageEngine, VersionBounds};
use crate::error::{Error, Result};
use crate::handle::Hid;
use crate::kind::{HandleKind, NodeKind, OpenObjectFilter};
use crate::path;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Soft links are followed at most this many times per lookup.
const MAX_LINK_DEPTH: usize = 16;

/// The root group is always node 0.
const ROOT: usize = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Body {
    Group { links: Vec<Link> },
    Dataset { shape: Vec<u64> },
    NamedType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Link {
    name: String,
    target: LinkTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LinkTarget {
    Hard(usize),
    Soft(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Attribute {
    name: String,
    value: AttrValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    #[serde(flatten)]
    body: Body,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attrs: Vec<Attribute>,
}

impl Node {
    fn kind(&self) -> NodeKind {
        match self.body {
            Body::Group { .. } => NodeKind::Group,
            Body::Dataset { .. } => NodeKind::Dataset,
            Body::NamedType => NodeKind::NamedType,
        }
    }

    fn links(&self) -> Option<&Vec<Link>> {
        match &self.body {
            Body::Group { links } => Some(links),
            _ => None,
        }
    }
}

/// One container: an arena of nodes rooted at node 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Container {
    bounds: VersionBounds,
    nodes: Vec<Node>,
}

impl Container {
    fn new(bounds: VersionBounds) -> Self {
        Self {
            bounds,
            nodes: vec![Node {
                body: Body::Group { links: Vec::new() },
                attrs: Vec::new(),
            }],
        }
    }

    /// Resolve `name` relative to node `start`, following soft links.
    fn resolve(&self, start: usize, name: &str) -> Result<usize> {
        self.resolve_depth(start, name, 0)
    }

    fn resolve_depth(&self, start: usize, name: &str, depth: usize) -> Result<usize> {
        if depth > MAX_LINK_DEPTH {
            return Err(Error::engine("resolve", format!("too many soft links: {}", name)));
        }
        if name == "." {
            return Ok(start);
        }
        let name = without_trailing_slash(name);
        let (mut current, rest) = match name.strip_prefix('/') {
            Some(rest) => (ROOT, rest),
            None => (start, name),
        };
        if rest.is_empty() {
            return Ok(current);
        }
        for segment in rest.split('/') {
            if segment.is_empty() {
                return Err(Error::not_found(name));
            }
            if segment == "." {
                continue;
            }
            let link = self.link(current, segment).ok_or_else(|| Error::not_found(name))?;
            current = match &link.target {
                LinkTarget::Hard(id) => *id,
                LinkTarget::Soft(target) => self
                    .resolve_depth(current, target, depth + 1)
                    .map_err(|_| Error::not_found(name))?,
            };
        }
        Ok(current)
    }

    /// First hard link whose target is outside the arena.
    fn dangling_hard_link(&self) -> Option<(&str, usize)> {
        self.nodes
            .iter()
            .filter_map(Node::links)
            .flatten()
            .find_map(|link| match link.target {
                LinkTarget::Hard(id) if id >= self.nodes.len() => Some((link.name.as_str(), id)),
                _ => None,
            })
    }

    fn link(&self, group: usize, name: &str) -> Option<&Link> {
        self.nodes[group]
            .links()
            .and_then(|links| links.iter().find(|l| l.name == name))
    }

    /// Resolve the parent of `name` and return it with the final segment.
    fn resolve_parent<'n>(&self, start: usize, name: &'n str) -> Result<(usize, &'n str)> {
        let name = without_trailing_slash(name);
        let leaf = path::name_of(name);
        if leaf.is_empty() || leaf == "." || leaf == "/" {
            return Err(Error::invalid_path(name, "missing final segment"));
        }
        let parent = match name.rfind('/') {
            Some(0) => "/",
            Some(_) => path::parent_of(name),
            None => ".",
        };
        let parent_node = self.resolve(start, parent)?;
        if self.nodes[parent_node].links().is_none() {
            return Err(Error::engine("resolve", format!("parent of {} is not a group", name)));
        }
        Ok((parent_node, leaf))
    }

    fn insert(&mut self, parent: usize, leaf: &str, target: LinkTarget) -> Result<()> {
        match &mut self.nodes[parent].body {
            Body::Group { links } => {
                if links.iter().any(|l| l.name == leaf) {
                    return Err(Error::engine(
                        "insert link",
                        format!("name already exists: {}", leaf),
                    ));
                }
                links.push(Link {
                    name: leaf.to_string(),
                    target,
                });
                Ok(())
            }
            _ => Err(Error::engine("insert link", "parent is not a group")),
        }
    }

    fn add_node(&mut self, start: usize, name: &str, body: Body) -> Result<usize> {
        let (parent, leaf) = self.resolve_parent(start, name)?;
        let id = self.nodes.len();
        self.insert(parent, leaf, LinkTarget::Hard(id))?;
        self.nodes.push(Node {
            body,
            attrs: Vec::new(),
        });
        Ok(id)
    }
}

/// What an open handle refers to.
#[derive(Debug, Clone)]
enum Target {
    File,
    Node(usize),
    Attribute { name: String },
    Dataspace,
    Datatype,
    PropertyList,
}

#[derive(Debug, Clone)]
struct OpenHandle {
    container: String,
    read_only: bool,
    kind: HandleKind,
    target: Target,
    path: String,
}

/// Counters exposed for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Groups created since the engine was built.
    pub groups_created: usize,
    /// Datasets created since the engine was built.
    pub datasets_created: usize,
    /// Handles currently open, all containers and kinds included.
    pub open_handles: usize,
}

#[derive(Debug, Default)]
struct State {
    containers: HashMap<String, Container>,
    handles: BTreeMap<i64, OpenHandle>,
    next_id: i64,
    stats: EngineStats,
}

impl State {
    fn issue(&mut self, handle: OpenHandle) -> Hid {
        self.next_id += 1;
        let id = self.next_id;
        self.handles.insert(id, handle);
        Hid::new(id)
    }

    fn handle(&self, id: Hid) -> Result<&OpenHandle> {
        self.handles
            .get(&id.raw())
            .ok_or_else(|| Error::invalid_handle(id.raw()))
    }

    fn container(&self, name: &str) -> Result<&Container> {
        self.containers
            .get(name)
            .ok_or_else(|| Error::not_found(name))
    }

    fn container_mut(&mut self, name: &str) -> Result<&mut Container> {
        self.containers
            .get_mut(name)
            .ok_or_else(|| Error::not_found(name))
    }

    /// The node a location handle refers to.
    fn location(&self, loc: Hid) -> Result<(OpenHandle, usize)> {
        let handle = self.handle(loc)?.clone();
        let node = match handle.target {
            Target::File => ROOT,
            Target::Node(node) => node,
            _ => {
                return Err(Error::engine(
                    "location",
                    format!("handle {} ({}) is not a location", loc, handle.kind),
                ));
            }
        };
        Ok((handle, node))
    }

    fn writable_location(&self, loc: Hid) -> Result<(OpenHandle, usize)> {
        let (handle, node) = self.location(loc)?;
        if handle.read_only {
            return Err(Error::read_only(handle.container.clone()));
        }
        Ok((handle, node))
    }

    fn remove(&mut self, id: Hid, expected: HandleKind) -> Result<()> {
        let kind = self.handle(id)?.kind.clone();
        if kind != expected {
            return Err(Error::engine(
                format!("close {}", expected),
                format!("handle {} is a {}", id, kind),
            ));
        }
        self.handles.remove(&id.raw());
        Ok(())
    }

    fn open_node(&mut self, loc: Hid, name: &str, want: NodeKind) -> Result<Hid> {
        let (base, start) = self.location(loc)?;
        let node = self.container(&base.container)?.resolve(start, name)?;
        let found = self.container(&base.container)?.nodes[node].kind();
        if found != want {
            return Err(Error::engine(
                format!("open {}", want),
                format!("{} is a {}", name, found),
            ));
        }
        let kind = match want {
            NodeKind::Group => HandleKind::Group,
            NodeKind::Dataset => HandleKind::Dataset,
            _ => HandleKind::Datatype,
        };
        Ok(self.issue(OpenHandle {
            path: absolute(&base.path, name),
            container: base.container,
            read_only: base.read_only,
            kind,
            target: Target::Node(node),
        }))
    }

    fn derived(&mut self, dataset: Hid, kind: HandleKind, target: Target) -> Result<Hid> {
        let base = self.handle(dataset)?.clone();
        if base.kind != HandleKind::Dataset {
            return Err(Error::engine(
                format!("get {}", kind),
                format!("handle {} is not a dataset", dataset),
            ));
        }
        Ok(self.issue(OpenHandle {
            kind,
            target,
            ..base
        }))
    }
}

/// Join a handle's absolute path with a relative name.
/// Drop one trailing `/`, so "a/b/" names the same object as "a/b".
fn without_trailing_slash(name: &str) -> &str {
    if name.len() > 1 {
        name.strip_suffix('/').unwrap_or(name)
    } else {
        name
    }
}

fn absolute(base: &str, name: &str) -> String {
    let name = without_trailing_slash(name);
    if name == "." {
        base.to_string()
    } else if name.starts_with('/') {
        name.to_string()
    } else {
        path::join(base, name)
    }
}

/// An in-memory [`StorageEngine`].
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: Mutex<State>,
}

impl MemoryEngine {
    /// Create an engine with no containers.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::engine("lock", "engine state poisoned"))
    }

    /// Current counters.
    pub fn stats(&self) -> EngineStats {
        match self.state() {
            Ok(state) => EngineStats {
                open_handles: state.handles.len(),
                ..state.stats
            },
            Err(_) => EngineStats::default(),
        }
    }

    /// True if a container with this name exists.
    pub fn has_container(&self, name: &str) -> bool {
        self.state()
            .map(|s| s.containers.contains_key(name))
            .unwrap_or(false)
    }

    /// Version bounds a container was created with.
    pub fn container_bounds(&self, name: &str) -> Option<VersionBounds> {
        let state = self.state().ok()?;
        state.containers.get(name).map(|c| c.bounds)
    }

    /// Open a handle of a kind the core does not model, bound to `file`'s
    /// container.
    pub fn create_property_list(&self, file: Hid) -> Result<Hid> {
        let mut state = self.state()?;
        let base = state.handle(file)?.clone();
        Ok(state.issue(OpenHandle {
            kind: HandleKind::Other("property list".to_string()),
            target: Target::PropertyList,
            ..base
        }))
    }

    /// Load a container from a JSON snapshot, replacing any container of the
    /// same name.
    pub fn load_snapshot<P: AsRef<Path>>(&self, name: &str, snapshot: P) -> Result<()> {
        let content = fs::read_to_string(snapshot.as_ref())?;
        let container: Container = serde_json::from_str(&content)?;
        if container.nodes.first().and_then(Node::links).is_none() {
            return Err(Error::engine(
                "load snapshot",
                format!("{}: root node is not a group", snapshot.as_ref().display()),
            ));
        }
        if let Some((name, target)) = container.dangling_hard_link() {
            return Err(Error::engine(
                "load snapshot",
                format!(
                    "{}: link {} points at missing node {}",
                    snapshot.as_ref().display(),
                    name,
                    target
                ),
            ));
        }
        self.state()?.containers.insert(name.to_string(), container);
        Ok(())
    }

    /// Write a container to a JSON snapshot atomically.
    pub fn save_snapshot<P: AsRef<Path>>(&self, name: &str, snapshot: P) -> Result<()> {
        let json = {
            let state = self.state()?;
            serde_json::to_string_pretty(state.container(name)?)?
        };

        let snapshot = snapshot.as_ref();
        let dir = match snapshot.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.write_all(b"\n")?;
        temp_file.flush()?;
        temp_file.persist(snapshot)?;

        Ok(())
    }
}

impl StorageEngine for MemoryEngine {
    fn create_file(&self, path: &str, bounds: VersionBounds) -> Result<Hid> {
        let mut state = self.state()?;
        if state.handles.values().any(|h| h.container == path) {
            return Err(Error::engine(
                "create file",
                format!("{} is currently open", path),
            ));
        }
        state
            .containers
            .insert(path.to_string(), Container::new(bounds));
        Ok(state.issue(OpenHandle {
            container: path.to_string(),
            read_only: false,
            kind: HandleKind::File,
            target: Target::File,
            path: "/".to_string(),
        }))
    }

    fn open_file(&self, path: &str, mode: FileMode, bounds: VersionBounds) -> Result<Hid> {
        let mut state = self.state()?;
        let container = state.container_mut(path)?;
        if mode == FileMode::ReadWrite {
            container.bounds = bounds;
        }
        Ok(state.issue(OpenHandle {
            container: path.to_string(),
            read_only: mode == FileMode::ReadOnly,
            kind: HandleKind::File,
            target: Target::File,
            path: "/".to_string(),
        }))
    }

    fn close_file(&self, file: Hid) -> Result<()> {
        self.state()?.remove(file, HandleKind::File)
    }

    fn create_group(&self, loc: Hid, name: &str) -> Result<Hid> {
        let mut state = self.state()?;
        let (base, start) = state.writable_location(loc)?;
        let node = state.container_mut(&base.container)?.add_node(
            start,
            name,
            Body::Group { links: Vec::new() },
        )?;
        state.stats.groups_created += 1;
        Ok(state.issue(OpenHandle {
            path: absolute(&base.path, name),
            container: base.container,
            read_only: false,
            kind: HandleKind::Group,
            target: Target::Node(node),
        }))
    }

    fn open_group(&self, loc: Hid, name: &str) -> Result<Hid> {
        self.state()?.open_node(loc, name, NodeKind::Group)
    }

    fn close_group(&self, group: Hid) -> Result<()> {
        self.state()?.remove(group, HandleKind::Group)
    }

    fn create_dataset(&self, loc: Hid, name: &str, shape: &[u64]) -> Result<Hid> {
        let mut state = self.state()?;
        let (base, start) = state.writable_location(loc)?;
        let node = state.container_mut(&base.container)?.add_node(
            start,
            name,
            Body::Dataset {
                shape: shape.to_vec(),
            },
        )?;
        state.stats.datasets_created += 1;
        Ok(state.issue(OpenHandle {
            path: absolute(&base.path, name),
            container: base.container,
            read_only: false,
            kind: HandleKind::Dataset,
            target: Target::Node(node),
        }))
    }

    fn open_dataset(&self, loc: Hid, name: &str) -> Result<Hid> {
        self.state()?.open_node(loc, name, NodeKind::Dataset)
    }

    fn close_dataset(&self, dataset: Hid) -> Result<()> {
        self.state()?.remove(dataset, HandleKind::Dataset)
    }

    fn dataset_space(&self, dataset: Hid) -> Result<Hid> {
        self.state()?
            .derived(dataset, HandleKind::Dataspace, Target::Dataspace)
    }

    fn dataset_type(&self, dataset: Hid) -> Result<Hid> {
        self.state()?
            .derived(dataset, HandleKind::Datatype, Target::Datatype)
    }

    fn close_dataspace(&self, space: Hid) -> Result<()> {
        self.state()?.remove(space, HandleKind::Dataspace)
    }

    fn close_datatype(&self, datatype: Hid) -> Result<()> {
        self.state()?.remove(datatype, HandleKind::Datatype)
    }

    fn commit_named_type(&self, loc: Hid, name: &str) -> Result<()> {
        let mut state = self.state()?;
        let (base, start) = state.writable_location(loc)?;
        state
            .container_mut(&base.container)?
            .add_node(start, name, Body::NamedType)?;
        Ok(())
    }

    fn create_soft_link(&self, loc: Hid, name: &str, target: &str) -> Result<()> {
        let mut state = self.state()?;
        let (base, start) = state.writable_location(loc)?;
        let container = state.container_mut(&base.container)?;
        let (parent, leaf) = container.resolve_parent(start, name)?;
        container.insert(parent, leaf, LinkTarget::Soft(target.to_string()))
    }

    fn object_info(&self, loc: Hid, name: &str) -> Result<ObjectInfo> {
        let state = self.state()?;
        let (base, start) = state.location(loc)?;
        let container = state.container(&base.container)?;
        let node = &container.nodes[container.resolve(start, name)?];
        Ok(ObjectInfo {
            kind: node.kind(),
            num_attrs: node.attrs.len(),
        })
    }

    fn object_exists(&self, loc: Hid, name: &str) -> Result<bool> {
        let state = self.state()?;
        let (base, start) = state.location(loc)?;
        let container = state.container(&base.container)?;
        if name == "." {
            return Ok(true);
        }
        // Intermediate segments must exist; only the final link may be missing.
        let (parent, leaf) = container.resolve_parent(start, name)?;
        match container.link(parent, leaf).map(|l| &l.target) {
            None => Ok(false),
            Some(LinkTarget::Hard(_)) => Ok(true),
            Some(LinkTarget::Soft(target)) => Ok(container.resolve(parent, target).is_ok()),
        }
    }

    fn link_count(&self, group: Hid) -> Result<usize> {
        let state = self.state()?;
        let (base, node) = state.location(group)?;
        state.container(&base.container)?.nodes[node]
            .links()
            .map(Vec::len)
            .ok_or_else(|| Error::engine("link count", format!("{} is not a group", base.path)))
    }

    fn link_name_by_index(&self, group: Hid, index: usize) -> Result<String> {
        let state = self.state()?;
        let (base, node) = state.location(group)?;
        state.container(&base.container)?.nodes[node]
            .links()
            .and_then(|links| links.get(index))
            .map(|l| l.name.clone())
            .ok_or_else(|| {
                Error::engine(
                    "link name",
                    format!("no link {} in {}", index, base.path),
                )
            })
    }

    fn write_attribute(&self, loc: Hid, name: &str, value: AttrValue) -> Result<()> {
        let mut state = self.state()?;
        let (base, node) = state.writable_location(loc)?;
        let attrs = &mut state.container_mut(&base.container)?.nodes[node].attrs;
        match attrs.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => attrs.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
        Ok(())
    }

    fn open_attribute_by_index(&self, loc: Hid, index: usize) -> Result<Hid> {
        let mut state = self.state()?;
        let (base, node) = state.location(loc)?;
        let name = state.container(&base.container)?.nodes[node]
            .attrs
            .get(index)
            .map(|a| a.name.clone())
            .ok_or_else(|| {
                Error::engine(
                    "open attribute",
                    format!("no attribute {} on {}", index, base.path),
                )
            })?;
        Ok(state.issue(OpenHandle {
            kind: HandleKind::Attribute,
            target: Target::Attribute { name },
            ..base
        }))
    }

    fn attribute_name(&self, attr: Hid) -> Result<String> {
        let state = self.state()?;
        match &state.handle(attr)?.target {
            Target::Attribute { name } => Ok(name.clone()),
            _ => Err(Error::engine(
                "attribute name",
                format!("handle {} is not an attribute", attr),
            )),
        }
    }

    fn close_attribute(&self, attr: Hid) -> Result<()> {
        self.state()?.remove(attr, HandleKind::Attribute)
    }

    fn attribute_rank(&self, loc: Hid, object: &str, attr_name: &str) -> Result<usize> {
        let state = self.state()?;
        let (base, start) = state.location(loc)?;
        let container = state.container(&base.container)?;
        let node = container.resolve(start, object)?;
        container.nodes[node]
            .attrs
            .iter()
            .find(|a| a.name == attr_name)
            .map(|a| a.value.rank())
            .ok_or_else(|| Error::not_found(format!("{}@{}", object, attr_name)))
    }

    fn attribute_exists(&self, loc: Hid, name: &str) -> Result<bool> {
        let state = self.state()?;
        let (base, node) = state.location(loc)?;
        Ok(state.container(&base.container)?.nodes[node]
            .attrs
            .iter()
            .any(|a| a.name == name))
    }

    fn open_object_ids(&self, file: Hid, filter: OpenObjectFilter) -> Result<Vec<Hid>> {
        let state = self.state()?;
        let base = state.handle(file)?;
        if base.kind != HandleKind::File {
            return Err(Error::engine(
                "open object ids",
                format!("handle {} is not a file", file),
            ));
        }
        Ok(state
            .handles
            .iter()
            .filter(|(_, h)| h.container == base.container && filter.accepts(&h.kind))
            .map(|(id, _)| Hid::new(*id))
            .collect())
    }

    fn handle_kind(&self, id: Hid) -> Result<HandleKind> {
        Ok(self.state()?.handle(id)?.kind.clone())
    }

    fn handle_path(&self, id: Hid) -> Result<String> {
        let state = self.state()?;
        let handle = state.handle(id)?;
        match &handle.target {
            Target::Attribute { name } => Ok(format!("{}@{}", handle.path, name)),
            _ => Ok(handle.path.clone()),
        }
    }

    fn release(&self, id: Hid) -> Result<()> {
        self.state()?
            .handles
            .remove(&id.raw())
            .map(|_| ())
            .ok_or_else(|| Error::invalid_handle(id.raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine_with_file() -> (MemoryEngine, Hid) {
        let engine = MemoryEngine::new();
        let file = engine.create_file("test.h5", VersionBounds::COMPAT).unwrap();
        (engine, file)
    }

    #[test]
    fn test_create_and_open_group() {
        let (engine, file) = engine_with_file();
        let g = engine.create_group(file, "a").unwrap();
        engine.close_group(g).unwrap();

        let g = engine.open_group(file, "a").unwrap();
        assert_eq!(engine.handle_kind(g).unwrap(), HandleKind::Group);
        assert_eq!(engine.handle_path(g).unwrap(), "/a");
        engine.close_group(g).unwrap();
        assert_eq!(engine.stats().groups_created, 1);
    }

    #[test]
    fn test_create_group_requires_parent() {
        let (engine, file) = engine_with_file();
        assert!(engine.create_group(file, "a/b").is_err());

        let a = engine.create_group(file, "a").unwrap();
        let b = engine.create_group(file, "a/b").unwrap();
        assert_eq!(engine.handle_path(b).unwrap(), "/a/b");
        engine.release(a).unwrap();
        engine.release(b).unwrap();
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (engine, file) = engine_with_file();
        let g = engine.create_group(file, "a").unwrap();
        engine.close_group(g).unwrap();
        assert!(engine.create_group(file, "a").is_err());
        assert!(engine.create_dataset(file, "a", &[3]).is_err());
    }

    #[test]
    fn test_open_group_on_dataset_fails() {
        let (engine, file) = engine_with_file();
        let ds = engine.create_dataset(file, "data", &[4]).unwrap();
        engine.close_dataset(ds).unwrap();
        assert!(engine.open_group(file, "data").is_err());
        let ds = engine.open_dataset(file, "/data").unwrap();
        engine.close_dataset(ds).unwrap();
    }

    #[test]
    fn test_close_with_wrong_kind_fails() {
        let (engine, file) = engine_with_file();
        let g = engine.create_group(file, "g").unwrap();
        assert!(engine.close_dataset(g).is_err());
        engine.close_group(g).unwrap();
        assert!(engine.close_group(g).is_err());
    }

    #[test]
    fn test_links_keep_creation_order() {
        let (engine, file) = engine_with_file();
        for name in ["zeta", "alpha", "mid"] {
            let g = engine.create_group(file, name).unwrap();
            engine.close_group(g).unwrap();
        }
        assert_eq!(engine.link_count(file).unwrap(), 3);
        let names: Vec<String> = (0..3)
            .map(|i| engine.link_name_by_index(file, i).unwrap())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert!(engine.link_name_by_index(file, 3).is_err());
    }

    #[test]
    fn test_soft_links() {
        let (engine, file) = engine_with_file();
        let g = engine.create_group(file, "real").unwrap();
        engine.close_group(g).unwrap();
        engine.create_soft_link(file, "alias", "/real").unwrap();
        engine.create_soft_link(file, "dangling", "/missing").unwrap();

        assert_eq!(engine.object_info(file, "alias").unwrap().kind, NodeKind::Group);
        assert!(engine.object_exists(file, "alias").unwrap());

        assert!(engine.object_info(file, "dangling").is_err());
        assert!(!engine.object_exists(file, "dangling").unwrap());
        assert!(!engine.object_exists(file, "nothing").unwrap());
        assert!(engine.object_exists(file, "nothing/deeper").is_err());
    }

    #[test]
    fn test_soft_link_cycle_is_an_error() {
        let (engine, file) = engine_with_file();
        engine.create_soft_link(file, "a", "b").unwrap();
        engine.create_soft_link(file, "b", "a").unwrap();
        assert!(engine.object_info(file, "a").is_err());
    }

    #[test]
    fn test_attributes_in_insertion_order() {
        let (engine, file) = engine_with_file();
        engine.write_attribute(file, "units", AttrValue::Text("m".into())).unwrap();
        engine.write_attribute(file, "axes", AttrValue::IntArray(vec![0, 1])).unwrap();
        engine.write_attribute(file, "units", AttrValue::Text("cm".into())).unwrap();

        assert_eq!(engine.object_info(file, ".").unwrap().num_attrs, 2);
        let attr = engine.open_attribute_by_index(file, 1).unwrap();
        assert_eq!(engine.attribute_name(attr).unwrap(), "axes");
        assert_eq!(engine.handle_kind(attr).unwrap(), HandleKind::Attribute);
        engine.close_attribute(attr).unwrap();

        assert_eq!(engine.attribute_rank(file, ".", "axes").unwrap(), 1);
        assert_eq!(engine.attribute_rank(file, ".", "units").unwrap(), 0);
        assert!(engine.attribute_rank(file, ".", "missing").is_err());
        assert!(engine.attribute_exists(file, "units").unwrap());
    }

    #[test]
    fn test_read_only_container() {
        let (engine, file) = engine_with_file();
        engine.close_file(file).unwrap();

        let ro = engine
            .open_file("test.h5", FileMode::ReadOnly, VersionBounds::COMPAT)
            .unwrap();
        let err = engine.create_group(ro, "a").unwrap_err();
        assert!(matches!(err, Error::ReadOnly { .. }));
        assert!(engine.write_attribute(ro, "x", AttrValue::Int(1)).is_err());
        engine.close_file(ro).unwrap();
    }

    #[test]
    fn test_open_missing_file() {
        let engine = MemoryEngine::new();
        let err = engine
            .open_file("nope.h5", FileMode::ReadWrite, VersionBounds::COMPAT)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_create_file_refuses_open_container() {
        let (engine, _file) = engine_with_file();
        assert!(engine.create_file("test.h5", VersionBounds::COMPAT).is_err());
    }

    #[test]
    fn test_open_object_ids_filtered_by_container_and_kind() {
        let (engine, file) = engine_with_file();
        let other = engine.create_file("other.h5", VersionBounds::COMPAT).unwrap();

        let g = engine.create_group(file, "g").unwrap();
        let ds = engine.create_dataset(file, "d", &[2, 2]).unwrap();
        let space = engine.dataset_space(ds).unwrap();
        let _elsewhere = engine.create_group(other, "x").unwrap();

        let ids = engine
            .open_object_ids(file, OpenObjectFilter::DESCENDANTS)
            .unwrap();
        assert_eq!(ids, vec![g, ds]);
        assert!(!ids.contains(&space));
        assert!(!ids.contains(&file));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = temp_dir.path().join("tree.json");

        let (engine, file) = engine_with_file();
        let g = engine.create_group(file, "a").unwrap();
        engine.write_attribute(g, "n", AttrValue::Int(3)).unwrap();
        engine.close_group(g).unwrap();
        let ds = engine.create_dataset(file, "a/data", &[10]).unwrap();
        engine.close_dataset(ds).unwrap();
        engine.create_soft_link(file, "link", "/a").unwrap();
        engine.close_file(file).unwrap();
        engine.save_snapshot("test.h5", &snapshot).unwrap();

        let restored = MemoryEngine::new();
        restored.load_snapshot("copy.h5", &snapshot).unwrap();
        let file = restored
            .open_file("copy.h5", FileMode::ReadOnly, VersionBounds::COMPAT)
            .unwrap();
        assert_eq!(
            restored.object_info(file, "a/data").unwrap().kind,
            NodeKind::Dataset
        );
        assert_eq!(restored.object_info(file, "link").unwrap().num_attrs, 1);
        assert_eq!(restored.container_bounds("copy.h5"), Some(VersionBounds::COMPAT));
    }

    #[test]
    fn test_load_snapshot_rejects_bad_root() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = temp_dir.path().join("bad.json");
        fs::write(
            &snapshot,
            r#"{"bounds":{"low":"V18","high":"V18"},"nodes":[{"kind":"named_type"}]}"#,
        )
        .unwrap();

        let engine = MemoryEngine::new();
        assert!(engine.load_snapshot("bad", &snapshot).is_err());
        assert!(!engine.has_container("bad"));
    }

    #[test]
    fn test_load_snapshot_rejects_out_of_range_hard_link() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = temp_dir.path().join("corrupt.json");
        fs::write(
            &snapshot,
            r#"{"bounds":{"low":"V18","high":"V18"},"nodes":[{"kind":"group","links":[{"name":"x","target":{"hard":99}}]}]}"#,
        )
        .unwrap();

        let engine = MemoryEngine::new();
        let err = engine.load_snapshot("corrupt", &snapshot).unwrap_err();
        assert!(matches!(err, Error::EngineFailure { .. }));
        assert!(!engine.has_container("corrupt"));

        // The engine stays usable afterwards.
        let file = engine.create_file("fresh.h5", VersionBounds::COMPAT).unwrap();
        assert_eq!(engine.link_count(file).unwrap(), 0);
    }

    #[test]
    fn test_trailing_slash_names_same_object() {
        let (engine, file) = engine_with_file();
        let a = engine.create_group(file, "a").unwrap();
        let b = engine.create_group(file, "a/b/").unwrap();
        engine.close_group(a).unwrap();
        assert_eq!(engine.handle_path(b).unwrap(), "/a/b");
        engine.close_group(b).unwrap();

        for name in ["a/b", "a/b/", "/a/b", "/a/b/"] {
            assert_eq!(engine.object_info(file, name).unwrap().kind, NodeKind::Group);
            assert!(engine.object_exists(file, name).unwrap());
            let g = engine.open_group(file, name).unwrap();
            assert_eq!(engine.handle_path(g).unwrap(), "/a/b");
            engine.close_group(g).unwrap();
        }
        assert!(engine.object_info(file, "a//b").is_err());
    }
}
