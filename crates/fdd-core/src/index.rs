//! Identifier index
//!
//! Backs the read-only query commands. The index covers every registered
//! FDD-format artifact and is built concurrently, one task per file.

use crate::error::{CoreError, CoreResult};
use crate::project::{absolute, Project};
use dashmap::DashMap;
use fdd_artifact::{ArtifactKind, Document, IdOccurrence};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One identifier occurrence in an artifact file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct IdLocation {
    /// Identifier text
    pub id: String,
    /// Artifact file
    pub path: PathBuf,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// Artifact kind of the file
    pub kind: ArtifactKind,
    /// Definition rather than reference
    pub definition: bool,
    /// Checkbox state of a definition
    pub checked: bool,
}

impl IdLocation {
    fn new(path: &Path, kind: ArtifactKind, occ: &IdOccurrence) -> Self {
        Self {
            id: occ.identifier.to_string(),
            path: path.to_path_buf(),
            line: occ.line,
            column: occ.column,
            kind,
            definition: occ.definition,
            checked: occ.checked,
        }
    }
}

/// Identifier occurrences across a project, keyed by identifier
#[derive(Debug, Default)]
pub struct IdentifierIndex {
    by_id: DashMap<String, Vec<IdLocation>>,
}

impl IdentifierIndex {
    /// Create an empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every registered FDD-format artifact of `project`
    ///
    /// Unreadable artifacts are skipped.
    #[must_use]
    pub fn build(project: &Project) -> Self {
        let files: Vec<(PathBuf, ArtifactKind)> = project
            .registry()
            .all()
            .iter()
            .filter(|e| e.format.is_fdd())
            .flat_map(|e| project.artifact_files(e))
            .collect();

        let index = Self::new();
        files.par_iter().for_each(|(path, kind)| {
            match project.cache().get(path, *kind) {
                Ok(sources) => {
                    for source in sources.iter() {
                        index.insert(&source.path, *kind, &source.doc);
                    }
                }
                Err(issue) => tracing::debug!(%issue, "skipping unreadable artifact"),
            }
        });
        tracing::info!(files = files.len(), ids = index.len(), "built identifier index");
        index
    }

    /// Add every occurrence in `doc`
    pub fn insert(&self, path: &Path, kind: ArtifactKind, doc: &Document) {
        for occ in doc.ids() {
            self.by_id
                .entry(occ.identifier.to_string())
                .or_default()
                .push(IdLocation::new(path, kind, occ));
        }
    }

    fn lookup(&self, id: &str, definition: bool) -> Vec<IdLocation> {
        let mut found: Vec<IdLocation> = self
            .by_id
            .get(id)
            .map(|locs| {
                locs.iter()
                    .filter(|l| l.definition == definition)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        found.sort();
        found
    }

    /// Definitions of `id`, sorted by path and position
    #[must_use]
    pub fn where_defined(&self, id: &str) -> Vec<IdLocation> {
        self.lookup(id, true)
    }

    /// References to `id`, sorted by path and position
    #[must_use]
    pub fn where_used(&self, id: &str) -> Vec<IdLocation> {
        self.lookup(id, false)
    }

    /// Number of distinct identifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Index is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Every identifier occurrence in one file, in document order
///
/// The file is parsed as the kind the registry gives it, or the kind its
/// name suggests; anything else is parsed as an overall design.
///
/// # Errors
/// Returns [`CoreError`] when the file does not exist or cannot be read.
pub fn scan_ids(project: &Project, path: &Path) -> CoreResult<Vec<IdLocation>> {
    let path = absolute(path)?;
    let kind = project.kind_of(&path).unwrap_or_else(|| {
        tracing::debug!(path = %path.display(), "unknown artifact kind, parsing as DESIGN");
        ArtifactKind::OverallDesign
    });
    let text = std::fs::read_to_string(&path).map_err(|e| CoreError::io_error(&path, e))?;
    let doc = Document::parse(kind, text);
    Ok(doc
        .ids()
        .iter()
        .map(|occ| IdLocation::new(&path, kind, occ))
        .collect())
}
