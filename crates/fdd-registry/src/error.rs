//! Error types for registry loading
//!
//! Only foundational failures are errors here: a project without a root
//! marker, or a registry or config file that cannot be read or parsed.
//! Everything an author can get wrong inside a well-formed registry is a
//! diagnostic.

use std::path::PathBuf;

/// Errors while locating the project or loading its registry and config
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No ancestor directory carries the root marker
    #[error("project root not found: no '{marker}' in {start} or any parent directory")]
    RootNotFound { start: PathBuf, marker: &'static str },

    /// IO error while reading the registry
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry or config file is not valid JSON or does not match the schema
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RegistryError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create parse error for path
    pub fn parse_error(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_not_found_display() {
        let err = RegistryError::RootNotFound {
            start: PathBuf::from("/tmp/x"),
            marker: ".fdd-config.json",
        };
        assert!(err.to_string().contains("'.fdd-config.json'"));
    }
}
