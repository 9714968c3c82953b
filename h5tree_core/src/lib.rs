//! # h5tree Core
//!
//! Path-based management of hierarchical containers: trees of named groups
//! and typed datasets carrying attributes, addressed by slash-delimited
//! paths.
//!
//! The byte-level storage engine is reached through the [`StorageEngine`]
//! trait. On top of it this library:
//!
//! - creates nested group hierarchies from a path, reusing what exists
//! - opens and closes handles by kind, and reclaims handles left open when a
//!   container is closed
//! - lists the children of a group, filtered by [`KindFilter`]
//! - lists and probes attributes
//!
//! Every operation holds an [`EngineLock`] for its whole duration, since
//! engine client libraries are generally not safe for concurrent calls.
//!
//! ## Example
//!
//! ```
//! use h5tree_core::{Hierarchy, KindFilter, MemoryEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let h5 = Hierarchy::new(MemoryEngine::new());
//! let file = h5.create_file("scan.h5")?;
//!
//! // Creates "run", "run/1" and "run/1/raw" as needed
//! h5.ensure_path(file.id(), "/run/1/raw")?;
//! h5.create_dataset(file.id(), "run/1/raw/frames", &[16, 512, 512])?
//!     .close()?;
//!
//! let groups = h5.list_children(file.id(), KindFilter::GROUP)?;
//! assert_eq!(groups, vec!["run"]);
//!
//! // Reclaims anything still open, then closes the container
//! let report = file.close_container()?;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

mod attrs;
mod builder;
mod children;
mod engine;
mod error;
mod handle;
mod hierarchy;
mod kind;
mod lock;
mod memory;
mod oracle;
pub mod path;
mod registry;

pub use engine::{AttrValue, FileMode, LibVersion, ObjectInfo, StorageEngine, VersionBounds};
pub use error::{Error, Result};
pub use handle::{Handle, Hid};
pub use hierarchy::Hierarchy;
pub use kind::{HandleKind, KindFilter, NodeKind, OpenObjectFilter};
pub use lock::{EngineGuard, EngineLock};
pub use memory::{EngineStats, MemoryEngine};
pub use registry::{CloseReport, LeakedHandle};
