//! FDD Traceability
//!
//! Verifies that checked design steps have matching, correctly paired code
//! tags in the implementation corpus.
//!
//! # Overview
//!
//! - **syntax**: per-extension comment delimiters
//! - **mask**: line classes and `!no-fdd-begin` opt-out regions
//! - **tags**: the begin/end pairing automaton for one file
//! - **corpus**: file enumeration and the parallel per-file scan
//! - **scanner**: expected sets and reconciliation
//!
//! Each per-file pass returns its own accumulator; the corpus layer reduces
//! them after all workers finish, so no state is shared during the scan.

#![warn(missing_docs)]

pub mod corpus;
pub mod error;
pub mod mask;
pub mod scanner;
pub mod syntax;
pub mod tags;

// Re-exports
pub use corpus::{enumerate, scan_file, scan_files, CorpusScan, FileScan, LocatedTagError};
pub use error::{TraceError, TraceResult};
pub use mask::{LexicalMask, LineClass};
pub use scanner::{reconcile, ExpectedSet, TraceabilityReport, TraceabilityScanner};
pub use syntax::CommentSyntax;
pub use tags::{has_tag_marker, scan_text, TagError, TagErrorKind, TagPair, TagScan};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
