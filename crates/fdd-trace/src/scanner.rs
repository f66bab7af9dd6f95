//! Code-to-design traceability scanner
//!
//! Expected sets come from checked definitions and checked steps of
//! feature designs; found sets come from the corpus scan. Reconciliation is
//! plain set difference.

use crate::corpus::{enumerate, scan_files, CorpusScan, LocatedTagError};
use crate::error::TraceResult;
use fdd_artifact::{instruction_tag, Document, EntityKind};
use fdd_registry::TraceabilityConfig;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// What the corpus must contain
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedSet {
    scopes: BTreeMap<String, EntityKind>,
    instructions: BTreeSet<String>,
}

impl ExpectedSet {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected scopes and instruction tags of one feature design
    ///
    /// A checked scope definition contributes its identifier; a checked step
    /// inside a checked scope contributes `<scope>:ph-N:inst-X`.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let mut expected = Self::new();
        for def in doc.definitions() {
            let kind = def.identifier.kind();
            if def.checked && kind.is_scope() {
                expected.scopes.insert(def.identifier.to_string(), kind);
            }
        }
        for step in doc.steps() {
            let Some(scope) = &step.scope else {
                continue;
            };
            if step.checked && step.scope_checked && scope.kind().is_scope() {
                expected.instructions.insert(instruction_tag(
                    scope.as_str(),
                    step.phase,
                    &step.instruction,
                ));
            }
        }
        expected
    }

    /// Merge another feature's expectations
    pub fn extend(&mut self, other: ExpectedSet) {
        self.scopes.extend(other.scopes);
        self.instructions.extend(other.instructions);
    }

    /// Expected scope identifiers with their kinds
    #[inline]
    #[must_use]
    pub fn scopes(&self) -> &BTreeMap<String, EntityKind> {
        &self.scopes
    }

    /// Expected instruction tags
    #[inline]
    #[must_use]
    pub fn instructions(&self) -> &BTreeSet<String> {
        &self.instructions
    }

    /// Nothing is expected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty() && self.instructions.is_empty()
    }
}

/// Outcome of one traceability run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceabilityReport {
    /// Zero tag errors and nothing missing
    pub passed: bool,
    /// Scanned root
    pub code_root: PathBuf,
    /// Files that contributed to the scan
    pub files_scanned: usize,
    /// Size of the expected scope set
    pub expected_scopes: usize,
    /// Size of the expected instruction set
    pub expected_instruction_tags: usize,
    /// Missing scope identifiers keyed by entity kind token
    pub missing_scopes: BTreeMap<String, Vec<String>>,
    /// Missing instruction tags
    pub missing_instruction_tags: Vec<String>,
    /// Tag diagnostics with file context
    pub errors: Vec<LocatedTagError>,
}

/// Reconcile expectations against a finished corpus scan
#[must_use]
pub fn reconcile(code_root: &Path, expected: &ExpectedSet, corpus: CorpusScan) -> TraceabilityReport {
    let mut missing_scopes: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (id, kind) in &expected.scopes {
        if !corpus.found_scopes.contains(id) {
            missing_scopes
                .entry(kind.token().to_string())
                .or_default()
                .push(id.clone());
        }
    }
    let missing_instruction_tags: Vec<String> = expected
        .instructions
        .difference(&corpus.found_instructions)
        .cloned()
        .collect();

    let passed =
        corpus.errors.is_empty() && missing_scopes.is_empty() && missing_instruction_tags.is_empty();

    TraceabilityReport {
        passed,
        code_root: code_root.to_path_buf(),
        files_scanned: corpus.files_scanned,
        expected_scopes: expected.scopes.len(),
        expected_instruction_tags: expected.instructions.len(),
        missing_scopes,
        missing_instruction_tags,
        errors: corpus.errors,
    }
}

/// Scanner bound to one traceability configuration
#[derive(Debug, Clone, Copy)]
pub struct TraceabilityScanner<'c> {
    config: &'c TraceabilityConfig,
}

impl<'c> TraceabilityScanner<'c> {
    /// Create a scanner
    #[must_use]
    pub fn new(config: &'c TraceabilityConfig) -> Self {
        Self { config }
    }

    /// Enumerate and scan `code_root`, then reconcile against `expected`
    ///
    /// File scanning runs on the current rayon pool.
    ///
    /// # Errors
    /// Returns [`crate::TraceError`] when the code root does not exist.
    pub fn scan(&self, code_root: &Path, expected: &ExpectedSet) -> TraceResult<TraceabilityReport> {
        let files = enumerate(code_root, self.config)?;
        tracing::debug!(root = %code_root.display(), files = files.len(), "enumerated corpus");
        let corpus = scan_files(&files, self.config);
        let report = reconcile(code_root, expected, corpus);
        tracing::info!(
            root = %code_root.display(),
            passed = report.passed,
            files = report.files_scanned,
            missing_instructions = report.missing_instruction_tags.len(),
            errors = report.errors.len(),
            "traceability scan finished"
        );
        Ok(report)
    }
}
