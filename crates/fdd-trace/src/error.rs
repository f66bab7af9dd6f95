//! Error types for traceability scanning

use std::path::PathBuf;

/// Errors that stop a traceability scan before any file is read
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// Code root is missing or not a directory
    #[error("code root not found: {0}")]
    CodeRootNotFound(PathBuf),
}

/// Result type alias for traceability operations
pub type TraceResult<T> = Result<T, TraceError>;
