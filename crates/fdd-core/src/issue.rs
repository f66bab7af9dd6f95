//! Report issues
//!
//! Every author-caused problem is an [`Issue`] carrying enough position
//! information to jump to the offending text.

use fdd_artifact::{ArtifactKind, StructuralFinding, StructuralFindingKind};
use fdd_registry::{ChainIssue, MissingDependency, RegistryDiagnostic};
use fdd_trace::{LocatedTagError, TagErrorKind};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Issue category from the error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    /// Missing, misordered, unknown or duplicate sections
    Structural,
    /// Malformed, duplicate or misplaced identifiers
    Identifier,
    /// Reference to an identifier its defining artifact lacks
    CrossReference,
    /// Code tag diagnostics
    Tag,
    /// Registry resolution problems
    Dependency,
    /// Status propagation between artifacts
    Status,
    /// Unfilled template text
    Placeholder,
    /// Missing, unexpected or unreadable files
    File,
}

/// Concrete issue type, serialized as the report's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    /// Required section absent
    MissingSection,
    /// Section out of canonical order
    SectionOrder,
    /// Section letter or heading not in the kind's grammar
    UnknownSection,
    /// Section letter used twice
    DuplicateSection,
    /// `Change N` labels not consecutive from 1
    ChangeNumbering,
    /// `**ID**:` value that does not parse
    MalformedId,
    /// Identifier defined twice in one artifact
    DuplicateId,
    /// Feature-scoped identifier with another feature's slug
    SlugMismatch,
    /// Referenced identifier not defined where it should be
    UndefinedReference,
    /// Begin marker never closed
    BeginWithoutEnd,
    /// End marker without a matching begin
    EndWithoutBegin,
    /// Tagged block with no code
    EmptyBlock,
    /// Instruction tag outside a marker
    UnwrappedTag,
    /// Marker with an invalid scope reference
    MalformedTag,
    /// Required dependency kind not registered in the system chain
    MissingDependency,
    /// Parent chain revisits a system
    ParentCycle,
    /// Parent chain names an unknown system
    UnknownParent,
    /// Registry entry problem
    RegistryEntry,
    /// Delivered PRD item linked to an undelivered feature
    StatusPropagation,
    /// Delivered design requirement covered by no delivered feature
    StatusCoverage,
    /// Placeholder text
    Placeholder,
    /// File-level problem
    File,
}

impl IssueType {
    /// Category of this type
    #[must_use]
    pub fn category(self) -> IssueCategory {
        match self {
            IssueType::MissingSection
            | IssueType::SectionOrder
            | IssueType::UnknownSection
            | IssueType::DuplicateSection
            | IssueType::ChangeNumbering => IssueCategory::Structural,
            IssueType::MalformedId | IssueType::DuplicateId | IssueType::SlugMismatch => {
                IssueCategory::Identifier
            }
            IssueType::UndefinedReference => IssueCategory::CrossReference,
            IssueType::BeginWithoutEnd
            | IssueType::EndWithoutBegin
            | IssueType::EmptyBlock
            | IssueType::UnwrappedTag
            | IssueType::MalformedTag => IssueCategory::Tag,
            IssueType::MissingDependency
            | IssueType::ParentCycle
            | IssueType::UnknownParent
            | IssueType::RegistryEntry => IssueCategory::Dependency,
            IssueType::StatusPropagation | IssueType::StatusCoverage => IssueCategory::Status,
            IssueType::Placeholder => IssueCategory::Placeholder,
            IssueType::File => IssueCategory::File,
        }
    }
}

impl From<StructuralFindingKind> for IssueType {
    fn from(kind: StructuralFindingKind) -> Self {
        match kind {
            StructuralFindingKind::MissingSection => IssueType::MissingSection,
            StructuralFindingKind::SectionOrder => IssueType::SectionOrder,
            StructuralFindingKind::UnknownSection => IssueType::UnknownSection,
            StructuralFindingKind::DuplicateSection => IssueType::DuplicateSection,
            StructuralFindingKind::ChangeNumbering => IssueType::ChangeNumbering,
        }
    }
}

impl From<TagErrorKind> for IssueType {
    fn from(kind: TagErrorKind) -> Self {
        match kind {
            TagErrorKind::BeginWithoutEnd => IssueType::BeginWithoutEnd,
            TagErrorKind::EndWithoutBegin => IssueType::EndWithoutBegin,
            TagErrorKind::EmptyBlock => IssueType::EmptyBlock,
            TagErrorKind::UnwrappedTag => IssueType::UnwrappedTag,
            TagErrorKind::MalformedTag => IssueType::MalformedTag,
        }
    }
}

/// One reported problem
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Issue {
    /// Issue type
    #[serde(rename = "type")]
    pub kind: IssueType,
    /// Human-readable explanation
    pub message: String,
    /// File the issue points at
    pub path: PathBuf,
    /// 1-based line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Issue {
    /// File-level issue without a position
    pub fn new(kind: IssueType, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: path.into(),
            line: None,
            column: None,
        }
    }

    /// With line
    #[inline]
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// With line and column
    #[inline]
    #[must_use]
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Category of the issue
    #[inline]
    #[must_use]
    pub fn category(&self) -> IssueCategory {
        self.kind.category()
    }

    /// Issue from a structural finding
    #[must_use]
    pub fn structural(path: &Path, finding: &StructuralFinding) -> Self {
        let issue = Self::new(finding.kind.into(), path, finding.message.clone());
        match finding.line {
            Some(line) => issue.at_line(line),
            None => issue,
        }
    }

    /// Issue from a located tag diagnostic
    #[must_use]
    pub fn tag(error: &LocatedTagError) -> Self {
        Self::new(error.error.kind.into(), &error.path, error.error.message.clone())
            .at(error.error.line, error.error.column)
    }

    /// Issue for an unresolved dependency kind
    #[must_use]
    pub fn missing_dependency(path: &Path, missing: &MissingDependency) -> Self {
        let name = |kind: ArtifactKind| kind.registry_name().unwrap_or(kind.as_str());
        Self::new(
            IssueType::MissingDependency,
            path,
            format!(
                "no {} artifact registered for system '{}' or its ancestors (required by {})",
                name(missing.kind),
                missing.system,
                name(missing.required_by)
            ),
        )
    }

    /// Issue for a parent chain that stopped early
    #[must_use]
    pub fn chain(path: &Path, issue: &ChainIssue) -> Self {
        match issue {
            ChainIssue::ParentCycle { origin, system } => Self::new(
                IssueType::ParentCycle,
                path,
                format!("parent chain of '{origin}' revisits '{system}'"),
            ),
            ChainIssue::UnknownParent { system, parent } => Self::new(
                IssueType::UnknownParent,
                path,
                format!("system '{system}' names unknown parent '{parent}'"),
            ),
        }
    }

    /// Issue for a registry entry that loaded with a problem
    #[must_use]
    pub fn registry(path: &Path, diagnostic: &RegistryDiagnostic) -> Self {
        let message = match diagnostic {
            RegistryDiagnostic::UnknownKind { index, kind } => {
                format!("entry {index} has unknown kind '{kind}' and was ignored")
            }
            RegistryDiagnostic::ConflictingParent {
                system,
                kept,
                ignored,
            } => format!("system '{system}' names parent '{ignored}' but '{kept}' was declared first"),
        };
        Self::new(IssueType::RegistryEntry, path, message)
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        let kind = serde_json::to_value(self.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        write!(f, ": [{kind}] {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_serializes_with_type() {
        let issue = Issue::new(IssueType::SlugMismatch, "f/DESIGN.md", "bad slug").at(3, 7);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "slug-mismatch");
        assert_eq!(json["line"], 3);
        assert_eq!(json["column"], 7);
        assert_eq!(issue.category(), IssueCategory::Identifier);
        assert_eq!(issue.to_string(), "f/DESIGN.md:3:7: [slug-mismatch] bad slug");
    }

    #[test]
    fn missing_dependency_names_registry_kinds() {
        let missing = MissingDependency {
            kind: ArtifactKind::Prd,
            required_by: ArtifactKind::Adr,
            system: "A".into(),
        };
        let issue = Issue::missing_dependency(Path::new("adr/0001.md"), &missing);
        assert_eq!(issue.kind, IssueType::MissingDependency);
        assert_eq!(
            issue.message,
            "no PRD artifact registered for system 'A' or its ancestors (required by ADR)"
        );
    }

    #[test]
    fn positionless_issue_omits_fields() {
        let json = serde_json::to_value(Issue::new(IssueType::File, "x", "gone")).unwrap();
        assert!(json.get("line").is_none());
        assert!(json.get("column").is_none());
    }
}
