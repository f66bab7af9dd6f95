//! Cross-artifact status checker
//!
//! Runs once PRD, DESIGN and the features manifest are all available:
//!
//! 1. A delivered (checked) PRD item linked from a manifest feature entry
//!    requires that feature to be delivered too.
//! 2. A delivered project-level DESIGN requirement must be covered by the
//!    entry of at least one delivered feature.
//!
//! A feature entry is the `### N.` subsection holding the feature's
//! definition, or, without subsections, the lines from the definition to
//! the next feature definition in the same section.

use crate::artifact::SourceDocument;
use crate::issue::{Issue, IssueType};
use fdd_artifact::{Document, EntityKind, IdOccurrence};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::Path;

/// One feature entry of the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureEntry<'a> {
    /// Feature definition occurrence
    pub definition: &'a IdOccurrence,
    /// Manifest file
    pub path: &'a Path,
    /// Identifiers referenced inside the entry
    pub links: BTreeSet<&'a str>,
}

fn entry_extent(doc: &Document, def: &IdOccurrence, next_def: Option<usize>) -> Range<usize> {
    let Some(section) = doc.section_at(def.line) else {
        return def.line..next_def.unwrap_or(doc.line_count() + 1);
    };
    if let Some(sub) = section.subsection_at(def.line) {
        return sub.lines();
    }
    let end = next_def
        .filter(|n| *n < section.end)
        .unwrap_or(section.end);
    def.line..end
}

/// Feature entries of the manifest with their links
#[must_use]
pub fn feature_entries(manifest: &[SourceDocument]) -> Vec<FeatureEntry<'_>> {
    let mut entries = Vec::new();
    for source in manifest {
        let defs: Vec<&IdOccurrence> = source
            .doc
            .definitions()
            .filter(|d| d.identifier.kind() == EntityKind::Feature)
            .collect();
        for (i, def) in defs.iter().enumerate() {
            let next = defs.get(i + 1).map(|d| d.line);
            let extent = entry_extent(&source.doc, def, next);
            let links = source
                .doc
                .references()
                .filter(|r| extent.contains(&r.line))
                .map(|r| r.identifier.as_str())
                .collect();
            entries.push(FeatureEntry {
                definition: def,
                path: &source.path,
                links,
            });
        }
    }
    entries
}

/// Evaluate both status rules
#[must_use]
pub fn check_status(
    prd: &[SourceDocument],
    design: &[SourceDocument],
    manifest: &[SourceDocument],
) -> Vec<Issue> {
    let mut issues = Vec::new();
    let entries = feature_entries(manifest);

    let delivered_prd: BTreeMap<&str, EntityKind> = prd
        .iter()
        .flat_map(|s| s.doc.definitions())
        .filter(|d| d.checked && d.identifier.kind() != EntityKind::Actor)
        .map(|d| (d.identifier.as_str(), d.identifier.kind()))
        .collect();

    for entry in &entries {
        if entry.definition.checked {
            continue;
        }
        for link in &entry.links {
            if let Some(kind) = delivered_prd.get(link) {
                issues.push(
                    Issue::new(
                        IssueType::StatusPropagation,
                        entry.path,
                        format!(
                            "{} '{link}' is delivered but linked feature '{}' is not",
                            kind.token(),
                            entry.definition.identifier
                        ),
                    )
                    .at(entry.definition.line, entry.definition.column),
                );
            }
        }
    }

    let covered: BTreeSet<&str> = entries
        .iter()
        .filter(|e| e.definition.checked)
        .flat_map(|e| e.links.iter().copied())
        .collect();

    for source in design {
        for def in source.doc.definitions() {
            let id = &def.identifier;
            if def.checked
                && id.kind() == EntityKind::Requirement
                && !id.is_feature_scoped()
                && !covered.contains(id.as_str())
            {
                issues.push(
                    Issue::new(
                        IssueType::StatusCoverage,
                        &source.path,
                        format!("requirement '{id}' is delivered but no delivered feature covers it"),
                    )
                    .at(def.line, def.column),
                );
            }
        }
    }

    issues
}
