//! Validation reports
//!
//! An [`ArtifactReport`] always has a deterministic [`Status`]. Reports for
//! directories (feature roots, ADR sets, whole projects) hold one child
//! report per validated artifact, merged by path.

use crate::issue::{Issue, IssueType};
use fdd_artifact::{ArtifactKind, StructuralFinding, StructuralFindingKind};
use fdd_trace::TraceabilityReport;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Overall outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Nothing to fix
    Pass,
    /// At least one problem
    Fail,
}

impl Status {
    /// True for [`Status::Pass`]
    #[inline]
    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, Status::Pass)
    }

    /// Process exit code for this status
    #[inline]
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Pass => 0,
            Status::Fail => 2,
        }
    }
}

/// A dependency the artifact was checked against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRef {
    /// Dependency kind
    pub kind: ArtifactKind,
    /// System that provided it
    pub system: String,
    /// Resolved path
    pub path: PathBuf,
}

/// Report for one artifact, directory or project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    /// Outcome
    pub status: Status,
    /// Validated path
    pub artifact: PathBuf,
    /// Artifact kind, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ArtifactKind>,
    /// Owning system, when registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// True when the path is not registered and nothing was checked
    pub skipped: bool,
    /// Accumulated issues other than placeholders
    pub errors: Vec<Issue>,
    /// Placeholder text found in the artifact
    pub placeholder_hits: Vec<Issue>,
    /// Required sections that are absent
    pub missing_sections: Vec<String>,
    /// Resolved dependencies, bottom-up
    pub dependencies: Vec<DependencyRef>,
    /// Code traceability outcome, when a scan ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceability: Option<TraceabilityReport>,
    /// Child reports keyed by path
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ArtifactReport>,
}

impl ArtifactReport {
    /// Empty passing report for `artifact`
    pub fn new(artifact: impl Into<PathBuf>, kind: Option<ArtifactKind>) -> Self {
        Self {
            status: Status::Pass,
            artifact: artifact.into(),
            kind,
            system: None,
            skipped: false,
            errors: Vec::new(),
            placeholder_hits: Vec::new(),
            missing_sections: Vec::new(),
            dependencies: Vec::new(),
            traceability: None,
            children: Vec::new(),
        }
    }

    /// Report for a path the registry does not know
    pub fn skipped(artifact: impl Into<PathBuf>) -> Self {
        Self {
            skipped: true,
            ..Self::new(artifact, None)
        }
    }

    /// Failed report carrying one foundational error
    pub fn foundational(artifact: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        let artifact = artifact.into();
        let mut report = Self::new(artifact.clone(), None);
        report.errors.push(Issue::new(IssueType::File, artifact, message));
        report.finalize()
    }

    /// With owning system
    #[inline]
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Record an issue; placeholders go to `placeholder_hits`
    pub fn push(&mut self, issue: Issue) {
        match issue.kind {
            IssueType::Placeholder => self.placeholder_hits.push(issue),
            _ => self.errors.push(issue),
        }
    }

    /// Record structural findings; missing sections are also listed by label
    pub fn push_structure(&mut self, path: &Path, findings: &[StructuralFinding]) {
        for finding in findings {
            if finding.kind == StructuralFindingKind::MissingSection {
                let label = finding.section.clone().unwrap_or_default();
                if !self.missing_sections.contains(&label) {
                    self.missing_sections.push(label);
                }
            }
            self.push(Issue::structural(path, finding));
        }
    }

    /// Record many issues
    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Attach children, keeping the first report per path in input order
    pub fn merge_children(&mut self, children: impl IntoIterator<Item = ArtifactReport>) {
        let mut by_path: IndexMap<PathBuf, ArtifactReport> = self
            .children
            .drain(..)
            .map(|c| (c.artifact.clone(), c))
            .collect();
        for child in children {
            by_path.entry(child.artifact.clone()).or_insert(child);
        }
        self.children = by_path.into_values().collect();
    }

    /// Whether this report alone (children excluded) is clean
    fn own_pass(&self) -> bool {
        self.errors.is_empty()
            && self.placeholder_hits.is_empty()
            && self.missing_sections.is_empty()
            && self.traceability.as_ref().map_or(true, |t| t.passed)
    }

    /// Sort issues and compute the status
    #[must_use]
    pub fn finalize(mut self) -> Self {
        self.errors.sort();
        self.errors.dedup();
        self.placeholder_hits.sort();
        self.placeholder_hits.dedup();
        let children_pass = self.children.iter().all(|c| c.status.is_pass());
        self.status = if self.own_pass() && children_pass {
            Status::Pass
        } else {
            Status::Fail
        };
        self
    }

    /// Total issue count across the report tree
    #[must_use]
    pub fn issue_count(&self) -> usize {
        let own = self.errors.len()
            + self.placeholder_hits.len()
            + self
                .traceability
                .as_ref()
                .map_or(0, |t| t.errors.len() + t.missing_instruction_tags.len());
        own + self.children.iter().map(Self::issue_count).sum::<usize>()
    }

    /// Find a report in the tree by path
    #[must_use]
    pub fn find(&self, path: &Path) -> Option<&ArtifactReport> {
        if self.artifact == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }
}
