//! FDD Core - cascading artifact validation
//!
//! Ties the artifact model, the registry and the traceability scanner
//! together:
//! - Resolves the dependencies of an artifact and loads them bottom-up
//! - Runs structural, identifier, placeholder and cross-reference checks
//! - Evaluates the cross-artifact status rules on the features manifest
//! - Scans the code corpus for the tags a feature design expects
//! - Answers identifier queries over every registered artifact
//!
//! # Example
//!
//! ```rust,ignore
//! use fdd_core::{Project, Validator};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let project = Project::discover(Path::new("architecture/PRD.md"))?;
//! let report = Validator::new(&project)?.validate(Path::new("architecture/PRD.md"))?;
//!
//! println!("{:?}: {} issues", report.status, report.issue_count());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod artifact;
pub mod checks;
pub mod error;
pub mod index;
pub mod issue;
pub mod project;
pub mod report;
pub mod status;
pub mod validate;

// Re-exports for convenience
pub use artifact::{DocumentCache, FeatureDir, SourceDocument, Sources};
pub use checks::{check_cross_references, check_identifiers, check_placeholders};
pub use error::{CoreError, CoreResult};
pub use index::{scan_ids, IdLocation, IdentifierIndex};
pub use issue::{Issue, IssueCategory, IssueType};
pub use project::{infer_kind, Project};
pub use report::{ArtifactReport, DependencyRef, Status};
pub use status::{check_status, feature_entries, FeatureEntry};
pub use validate::Validator;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for validating a project
    pub use crate::{ArtifactReport, CoreError, Issue, IssueType, Project, Status, Validator};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
