//! FDD Artifact Model
//!
//! Structural model for FDD documentation artifacts.
//!
//! # Overview
//!
//! - **ArtifactKind / EntityKind**: closed kind enums driving every dispatch
//! - **Identifier / ScopeRef**: structured identifier tokens and step addresses
//! - **Document**: line-indexed sections, fields, identifiers and FDL steps
//! - **rules**: canonical section sets and the generic structure check
//!
//! The model never builds a markdown AST; a single lexer pass classifies
//! each line and everything else is derived from that event list.

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod id;
pub mod kind;
pub mod lexer;
pub mod rules;

// Re-exports
pub use document::{
    Document, Field, IdOccurrence, MalformedId, Section, SectionLabel, Step, Subsection,
    UnknownHeading,
};
pub use error::IdentifierError;
pub use id::{instruction_tag, Identifier, ScopeRef};
pub use kind::{ArtifactKind, EntityKind};
pub use rules::{check_structure, StructuralFinding, StructuralFindingKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with artifacts
    pub use crate::{
        ArtifactKind, Document, EntityKind, IdOccurrence, Identifier, ScopeRef, SectionLabel,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
