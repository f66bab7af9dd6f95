//! Per-artifact checks over the structural model
//!
//! Identifier rules, placeholder detection and cross-references. Each
//! function returns its own list of issues.

use crate::artifact::SourceDocument;
use crate::issue::{Issue, IssueType};
use fdd_artifact::lexer::LineEvent;
use fdd_artifact::{ArtifactKind, EntityKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:TODO|TBD|FIXME|XXX)\b|\{\{[^{}]*\}\}").expect("valid regex")
});

/// Malformed, duplicate and slug-mismatched identifiers
///
/// Duplicates are detected across all of `sources`. When `feature_slug`
/// is set, every feature-scoped identifier must carry that slug; feature
/// identifiers themselves are exempt since features reference each other.
#[must_use]
pub fn check_identifiers(sources: &[SourceDocument], feature_slug: Option<&str>) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut first_definition: HashMap<String, (&Path, usize)> = HashMap::new();

    for source in sources {
        for bad in source.doc.malformed_ids() {
            issues.push(
                Issue::new(
                    IssueType::MalformedId,
                    &source.path,
                    format!("malformed identifier '{}': {}", bad.text, bad.error),
                )
                .at(bad.line, bad.column),
            );
        }

        for occ in source.doc.ids() {
            let id = occ.identifier.as_str();
            if occ.definition {
                match first_definition.get(id) {
                    Some((path, line)) => issues.push(
                        Issue::new(
                            IssueType::DuplicateId,
                            &source.path,
                            format!(
                                "'{id}' is already defined at {}:{line}",
                                path.display()
                            ),
                        )
                        .at(occ.line, occ.column),
                    ),
                    None => {
                        first_definition.insert(id.to_string(), (&source.path, occ.line));
                    }
                }
            }

            let Some(slug) = feature_slug else { continue };
            if occ.identifier.kind() == EntityKind::Feature {
                continue;
            }
            if let Some(found) = occ.identifier.feature() {
                if found != slug {
                    issues.push(
                        Issue::new(
                            IssueType::SlugMismatch,
                            &source.path,
                            format!(
                                "'{id}' belongs to feature '{found}' but appears in feature '{slug}'"
                            ),
                        )
                        .at(occ.line, occ.column),
                    );
                }
            }
        }
    }

    issues
}

/// Placeholder text outside fenced code blocks
#[must_use]
pub fn check_placeholders(source: &SourceDocument) -> Vec<Issue> {
    let mut issues = Vec::new();
    for lexed in source.doc.events() {
        if matches!(lexed.event, LineEvent::Fence | LineEvent::FencedCode) {
            continue;
        }
        let Some(text) = source.doc.line(lexed.line) else {
            continue;
        };
        for m in PLACEHOLDER.find_iter(text) {
            issues.push(
                Issue::new(
                    IssueType::Placeholder,
                    &source.path,
                    format!("placeholder '{}'", m.as_str()),
                )
                .at(lexed.line, m.start() + 1),
            );
        }
    }
    issues
}

/// Identifier set of one resolved dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyIds {
    /// Dependency artifact path
    pub path: PathBuf,
    /// Defined identifiers
    pub ids: BTreeSet<String>,
    /// Whether references into it are checked (structured format and traceability enabled)
    pub checkable: bool,
}

/// Inputs for [`check_cross_references`]
#[derive(Debug, Clone, Copy)]
pub struct CrossRefContext<'a> {
    /// Kind being validated
    pub kind: ArtifactKind,
    /// Identifiers the validated artifact itself defines
    pub own_ids: &'a BTreeSet<String>,
    /// Slug of the enclosing feature directory
    pub feature_slug: Option<&'a str>,
    /// Resolved dependencies by kind
    pub dependencies: &'a BTreeMap<ArtifactKind, DependencyIds>,
}

/// References whose defining artifact lacks the definition
///
/// The defining kind follows from the identifier's entity kind. References
/// into kinds that are neither the artifact itself nor a resolved
/// dependency are not checked, nor are references into dependencies that
/// are free-form or have traceability disabled.
#[must_use]
pub fn check_cross_references(sources: &[SourceDocument], ctx: &CrossRefContext<'_>) -> Vec<Issue> {
    let mut issues = Vec::new();

    for source in sources {
        for occ in source.doc.references() {
            let id = &occ.identifier;
            let defining = id.kind().defining_artifact(id.is_feature_scoped());

            if defining == ctx.kind {
                if let (Some(slug), Some(found)) = (ctx.feature_slug, id.feature()) {
                    if found != slug {
                        continue;
                    }
                }
                if !ctx.own_ids.contains(id.as_str()) {
                    issues.push(
                        Issue::new(
                            IssueType::UndefinedReference,
                            &source.path,
                            format!("'{id}' is referenced but not defined in this {defining}"),
                        )
                        .at(occ.line, occ.column),
                    );
                }
                continue;
            }

            let Some(dep) = ctx.dependencies.get(&defining) else {
                continue;
            };
            if dep.checkable && !dep.ids.contains(id.as_str()) {
                issues.push(
                    Issue::new(
                        IssueType::UndefinedReference,
                        &source.path,
                        format!(
                            "'{id}' is not defined in {defining} {}",
                            dep.path.display()
                        ),
                    )
                    .at(occ.line, occ.column),
                );
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdd_artifact::Document;
    use pretty_assertions::assert_eq;

    fn source(kind: ArtifactKind, path: &str, text: &str) -> SourceDocument {
        SourceDocument {
            path: PathBuf::from(path),
            doc: Document::parse(kind, text),
        }
    }

    fn types(issues: &[Issue]) -> Vec<IssueType> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn duplicate_and_malformed() {
        let src = source(
            ArtifactKind::Prd,
            "PRD.md",
            "## B. Actors\n- [x] **ID**: `ns-actor-user`\n- [ ] **ID**: `ns-actor-user`\n- [ ] **ID**: `Bad Id`\n",
        );
        let issues = check_identifiers(&[src], None);
        assert_eq!(types(&issues), vec![IssueType::MalformedId, IssueType::DuplicateId]);
        assert_eq!(issues[1].line, Some(3));
    }

    #[test]
    fn slug_mismatch_in_feature() {
        let src = source(
            ArtifactKind::FeatureDesign,
            "feature-alpha/DESIGN.md",
            "## B. Actor Flows\n- [ ] **ID**: `ns-feature-alpha-flow-ok`\n- [ ] **ID**: `ns-feature-beta-flow-x`\nSee `ns-feature-beta`.\n",
        );
        let issues = check_identifiers(&[src], Some("alpha"));
        assert_eq!(types(&issues), vec![IssueType::SlugMismatch]);
        assert_eq!(issues[0].line, Some(3));
        assert!(issues[0].message.contains("'beta'"));
    }

    #[test]
    fn placeholders_skip_fences() {
        let src = source(
            ArtifactKind::Prd,
            "PRD.md",
            "## A. Vision\nTBD later\n```\nTODO in code\n```\nName: {{name}}\nTODOS are fine\n",
        );
        let issues = check_placeholders(&src);
        let lines: Vec<_> = issues.iter().map(|i| i.line.unwrap()).collect();
        assert_eq!(lines, vec![2, 6]);
        assert_eq!(issues[1].column, Some(7));
    }

    #[test]
    fn cross_references_against_dependencies() {
        let design = source(
            ArtifactKind::OverallDesign,
            "DESIGN.md",
            "## B. Requirements & Principles\n- [ ] **ID**: `ns-req-fast`\n**References**: `ns-capability-login`, `ns-capability-gone`, `ns-principle-missing`, `ns-adr-free`\n",
        );
        let own = crate::artifact::defined_ids(std::slice::from_ref(&design));
        let mut deps = BTreeMap::new();
        deps.insert(
            ArtifactKind::Prd,
            DependencyIds {
                path: PathBuf::from("PRD.md"),
                ids: ["ns-capability-login".to_string()].into_iter().collect(),
                checkable: true,
            },
        );
        deps.insert(
            ArtifactKind::Adr,
            DependencyIds {
                path: PathBuf::from("adr"),
                ids: BTreeSet::new(),
                checkable: false,
            },
        );
        let ctx = CrossRefContext {
            kind: ArtifactKind::OverallDesign,
            own_ids: &own,
            feature_slug: None,
            dependencies: &deps,
        };
        let issues = check_cross_references(&[design], &ctx);
        let messages: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(issues.len(), 2, "{messages:?}");
        assert!(messages[0].contains("ns-capability-gone"));
        assert!(messages[1].contains("ns-principle-missing"));
    }
}
