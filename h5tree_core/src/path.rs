//! Slash-delimited object paths.
//!
//! Paths are plain `&str` values relative to some root node. These helpers
//! only decompose them; they never touch the engine.

/// Split a path into its segments.
///
/// A single leading and a single trailing `/` are ignored, so `"/a/b"`,
/// `"a/b/"` and `"a/b"` all give `["a", "b"]`. `"/"` and `""` give no
/// segments (the root). Nothing else is cleaned up: `"a//b"` keeps its empty
/// middle segment and the engine will reject it.
pub fn normalize(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        return Vec::new();
    }
    path.split('/').collect()
}

/// Everything before the last `/`.
///
/// Returns `""` when there is no `/` at all and also for top-level paths such
/// as `"/a"`. Callers treat the empty string as "no parent to create"; it is
/// never `"/"`.
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// The last segment of a path.
///
/// Returns the whole path when it contains no `/`, and `"/"` for the root.
pub fn name_of(path: &str) -> &str {
    if path == "/" {
        return path;
    }
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Append `name` to `parent`.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Strip the leading `/` from an engine-resolved path, keeping `"/"` itself.
pub fn trim_object_path(path: &str) -> &str {
    if path != "/" {
        path.strip_prefix('/').unwrap_or(path)
    } else {
        path
    }
}
