//! FDD Registry
//!
//! Everything between "a path on disk" and "the set of artifacts it must be
//! checked against":
//!
//! - **root**: project root discovery by walking upward for the marker file
//! - **config**: optional project configuration stored in the marker file
//! - **registry**: `(system, kind) -> entries` index and parent chains
//! - **resolve**: worklist resolver over the static kind template

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod registry;
pub mod resolve;
pub mod root;

// Re-exports
pub use config::{CommentSyntaxConfig, ProjectConfig, TraceabilityConfig};
pub use error::{RegistryError, RegistryResult};
pub use registry::{
    ArtifactFormat, ChainIssue, ParentChain, PathMatch, Registry, RegistryDiagnostic,
    RegistryEntry, DEFAULT_REGISTRY_PATH,
};
pub use resolve::{DependencyResolver, MissingDependency, ResolvedDependencies};
pub use root::{find_project_root, normalize, ROOT_MARKER};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
