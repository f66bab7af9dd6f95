use fdd_core::{ArtifactReport, CoreError, IdentifierIndex, IssueType, Project, Status, Validator};
use fdd_test_utils::{
    empty_block_code, standard_project, tagged_code, ProjectFixture, EXPECTED_TAG, FEATURES,
};
use fdd_trace::TagErrorKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::{Path, PathBuf};

fn canonical(path: PathBuf) -> PathBuf {
    std::fs::canonicalize(path).unwrap()
}

fn dump(report: &ArtifactReport) -> String {
    serde_json::to_string_pretty(report).unwrap()
}

fn all_issue_types(report: &ArtifactReport) -> Vec<IssueType> {
    let mut types: Vec<IssueType> = report.errors.iter().map(|i| i.kind).collect();
    for child in &report.children {
        types.extend(all_issue_types(child));
    }
    types
}

fn validate(root: &Path, target: &Path) -> ArtifactReport {
    let project = Project::discover(root).unwrap();
    Validator::new(&project).unwrap().validate(target).unwrap()
}

#[test]
fn consistent_project_passes() {
    let fx = standard_project(&tagged_code());
    let report = validate(fx.root(), fx.root());
    assert_eq!(report.status, Status::Pass, "{}", dump(&report));

    let features = canonical(fx.path("architecture/features"));
    let trace = report
        .find(&features)
        .and_then(|r| r.traceability.as_ref())
        .expect("feature root carries a traceability scan");
    assert!(trace.passed);
    assert!(trace.missing_instruction_tags.is_empty());
    assert_eq!(trace.expected_instruction_tags, 1);
    assert_eq!(trace.files_scanned, 1);
}

#[test]
fn feature_design_file_gets_its_own_scan() {
    let fx = standard_project(&tagged_code());
    let design = fx.path("architecture/features/feature-login/DESIGN.md");
    let report = validate(fx.root(), &design);
    assert_eq!(report.status, Status::Pass, "{}", dump(&report));
    assert_eq!(report.kind, Some(fdd_artifact::ArtifactKind::FeatureDesign));
    assert!(report.traceability.as_ref().is_some_and(|t| t.passed));
    assert!(!report.dependencies.is_empty());
}

#[test]
fn empty_tag_block_fails_and_tag_is_missing() {
    let fx = standard_project(&empty_block_code());
    let report = validate(fx.root(), &fx.path("architecture/features/feature-login"));
    assert_eq!(report.status, Status::Fail);

    let trace = report.traceability.as_ref().unwrap();
    assert!(!trace.passed);
    let kinds: Vec<TagErrorKind> = trace.errors.iter().map(|e| e.error.kind).collect();
    assert_eq!(kinds, vec![TagErrorKind::EmptyBlock]);
    assert_eq!(trace.missing_instruction_tags, vec![EXPECTED_TAG.to_string()]);
    // documents themselves are clean
    assert!(report.children.iter().all(|c| c.status == Status::Pass));
}

#[test]
fn adr_without_prd_reports_missing_dependency() {
    let fx = ProjectFixture::new()
        .register("ADR", "A", "adr")
        .file(
            "adr/0001-first.md",
            "## A. Context\n- [x] **ID**: `ns-adr-first`\n\n## D. Decision Outcome\nChosen.\n",
        );
    let report = validate(fx.root(), &fx.path("adr"));
    assert_eq!(report.status, Status::Fail);
    assert_eq!(report.children.len(), 1);
    let child = &report.children[0];
    assert_eq!(
        child.errors.iter().map(|i| i.kind).collect::<Vec<_>>(),
        vec![IssueType::MissingDependency]
    );
    assert!(child.errors[0].message.contains("PRD"));

    let whole = validate(fx.root(), fx.root());
    assert!(all_issue_types(&whole).contains(&IssueType::MissingDependency));
}

#[test]
fn foreign_feature_slug_is_flagged() {
    let fx = ProjectFixture::new().register("FEATURE", "ns", "features").file(
        "features/feature-alpha/DESIGN.md",
        "## A. Feature Context\nAlpha.\n\n## B. Actor Flows\n- [ ] **ID**: `ns-feature-beta-flow-x`\n\n## C. Algorithms\nNone.\n\n## F. Requirements\nNone.\n",
    );
    let project = Project::discover(fx.root()).unwrap();
    let report = Validator::new(&project)
        .unwrap()
        .with_skip_code(true)
        .validate(&fx.path("features/feature-alpha/DESIGN.md"))
        .unwrap();

    let slug: Vec<_> = report
        .errors
        .iter()
        .filter(|i| i.kind == IssueType::SlugMismatch)
        .collect();
    assert_eq!(slug.len(), 1, "{}", dump(&report));
    assert_eq!(slug[0].line, Some(5));
    assert!(slug[0].message.contains("'beta'") && slug[0].message.contains("'alpha'"));
    assert!(report.traceability.is_none());
}

#[test]
fn unregistered_path_is_skipped() {
    let fx = standard_project(&tagged_code()).file("notes/README.md", "TODO everything\n");
    let report = validate(fx.root(), &fx.path("notes/README.md"));
    assert!(report.skipped);
    assert_eq!(report.status, Status::Pass);
    assert!(report.errors.is_empty());
}

#[test]
fn undelivered_feature_breaks_status_rules() {
    let manifest = FEATURES.replace(
        "- [x] **ID**: `app-feature-login`",
        "- [ ] **ID**: `app-feature-login`",
    );
    let fx = standard_project(&tagged_code()).file("architecture/features/FEATURES.md", &manifest);
    let report = validate(fx.root(), &fx.path("architecture/features/FEATURES.md"));
    assert_eq!(report.status, Status::Fail);

    let mut kinds: Vec<_> = report.errors.iter().map(|i| i.kind).collect();
    kinds.sort();
    assert_eq!(
        kinds,
        vec![IssueType::StatusPropagation, IssueType::StatusCoverage]
    );
}

#[test]
fn undefined_reference_into_prd() {
    let fx = standard_project(&tagged_code()).file(
        "architecture/DESIGN.md",
        "## A. Architecture Overview\nServes `app-capability-export`.\n\n## B. Requirements & Principles\n- [ ] **ID**: `app-req-auth`\n\n## C. Technical Architecture\nOne service.\n",
    );
    let report = validate(fx.root(), &fx.path("architecture/DESIGN.md"));
    let undefined: Vec<_> = report
        .errors
        .iter()
        .filter(|i| i.kind == IssueType::UndefinedReference)
        .collect();
    assert_eq!(undefined.len(), 1, "{}", dump(&report));
    assert_eq!((undefined[0].line, undefined[0].column), (Some(2), Some(9)));
}

#[test]
fn placeholders_and_missing_sections_fail() {
    let fx = standard_project(&tagged_code()).file(
        "architecture/PRD.md",
        "## A. Vision\nTBD\n\n## C. Capabilities\n- [ ] **ID**: `app-capability-login`\n",
    );
    let report = validate(fx.root(), &fx.path("architecture/PRD.md"));
    assert_eq!(report.status, Status::Fail);
    assert_eq!(report.missing_sections, vec!["B".to_string()]);
    assert_eq!(report.placeholder_hits.len(), 1);
    assert_eq!(report.placeholder_hits[0].line, Some(2));
}

#[test]
fn change_log_uses_sibling_design() {
    let fx = standard_project(&tagged_code()).file(
        "architecture/features/feature-login/CHANGES.md",
        "## Change 1: Check credentials\n- [x] **ID**: `app-feature-login-change-check`\n**Implements**: `app-feature-login-algo-check`, `app-feature-login-algo-gone`\n",
    );
    let changes = fx.path("architecture/features/feature-login/CHANGES.md");
    let report = validate(fx.root(), &changes);
    assert_eq!(report.kind, Some(fdd_artifact::ArtifactKind::FeatureChanges));
    let design = report
        .dependencies
        .iter()
        .find(|d| d.kind == fdd_artifact::ArtifactKind::FeatureDesign)
        .unwrap();
    assert_eq!(
        design.path,
        canonical(fx.path("architecture/features/feature-login/DESIGN.md"))
    );
    let undefined: Vec<_> = report
        .errors
        .iter()
        .filter(|i| i.kind == IssueType::UndefinedReference)
        .map(|i| i.message.as_str())
        .collect();
    assert_eq!(undefined.len(), 1, "{}", dump(&report));
    assert!(undefined[0].contains("algo-gone"));
    assert!(report.traceability.is_none());
}

#[test]
fn free_form_dependency_is_not_checked() {
    let fx = ProjectFixture::new()
        .register_entry(json!({ "kind": "PRD", "system": "app", "path": "PRD.md", "format": "markdown" }))
        .register("ADR", "app", "adr")
        .file("PRD.md", "Anything goes here.\n")
        .file(
            "adr/0001-a.md",
            "## A. Context\n- [x] **ID**: `app-adr-a`\nFor `app-capability-unknown`.\n\n## D. Decision Outcome\nDone.\n",
        );
    let report = validate(fx.root(), &fx.path("adr/0001-a.md"));
    assert_eq!(report.status, Status::Pass, "{}", dump(&report));
}

#[test]
fn identifier_queries() {
    let fx = standard_project(&tagged_code());
    let project = Project::discover(fx.root()).unwrap();
    let index = IdentifierIndex::build(&project);

    let defined = index.where_defined("app-req-auth");
    assert_eq!(defined.len(), 1);
    assert_eq!(defined[0].path, canonical(fx.path("architecture/DESIGN.md")));

    let used: Vec<PathBuf> = index
        .where_used("app-req-auth")
        .into_iter()
        .map(|l| l.path)
        .collect();
    assert_eq!(
        used,
        vec![
            canonical(fx.path("architecture/features/FEATURES.md")),
            canonical(fx.path("architecture/features/feature-login/DESIGN.md")),
        ]
    );

    let scanned = fdd_core::scan_ids(&project, &fx.path("architecture/PRD.md")).unwrap();
    let ids: Vec<_> = scanned.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["app-actor-user", "app-capability-login", "app-actor-user"]);
}

#[test]
fn setup_failures_are_errors() {
    let fx = standard_project(&tagged_code());
    let project = Project::discover(fx.root()).unwrap();
    let validator = Validator::new(&project).unwrap();
    let err = validator.validate(&fx.path("architecture/NOPE.md")).unwrap_err();
    assert!(matches!(err, CoreError::PathNotFound(_)));

    let bare = tempfile::tempdir().unwrap();
    assert!(matches!(
        Project::discover(bare.path()),
        Err(CoreError::Registry(_))
    ));
}

#[test]
fn jobs_and_code_root_overrides() {
    let fx = standard_project("").file("alt/login.rs", &tagged_code());
    let project = Project::discover_with(fx.root(), |config| {
        config.with_jobs(2).with_code_root("alt")
    })
    .unwrap();
    assert_eq!(project.config().jobs, 2);
    let report = Validator::new(&project).unwrap().validate_project();
    assert_eq!(report.status, Status::Pass, "{}", dump(&report));
}
