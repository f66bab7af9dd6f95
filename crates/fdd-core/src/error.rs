//! Error types for FDD core
//!
//! Only foundational failures are errors:
//! - Project root or registry problems
//! - The validated artifact itself is missing or unreadable
//! - The worker pool cannot be built
//!
//! Everything else becomes an [`crate::Issue`] in the report.

use fdd_registry::RegistryError;
use std::path::PathBuf;

/// Foundational validation failure
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Root discovery, config or registry loading failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Validated path does not exist
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    /// Validated artifact could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker pool could not be created
    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl CoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path the failure is about, when there is one
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            CoreError::Registry(RegistryError::Io { path, .. } | RegistryError::Parse { path, .. })
            | CoreError::PathNotFound(path)
            | CoreError::Io { path, .. } => Some(path),
            CoreError::Registry(RegistryError::RootNotFound { start, .. }) => Some(start),
            CoreError::Pool(_) => None,
        }
    }
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
