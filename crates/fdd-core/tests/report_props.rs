use fdd_artifact::ArtifactKind;
use fdd_core::{ArtifactReport, Issue, IssueType, Status};
use proptest::prelude::*;

const TYPES: [IssueType; 5] = [
    IssueType::Placeholder,
    IssueType::SlugMismatch,
    IssueType::UndefinedReference,
    IssueType::MissingDependency,
    IssueType::File,
];

fn issue_strategy() -> impl Strategy<Value = Issue> {
    (0..TYPES.len(), 0..2usize, 1..20usize, 1..5usize).prop_map(|(t, file, line, column)| {
        let path = if file == 0 { "PRD.md" } else { "DESIGN.md" };
        Issue::new(TYPES[t], path, format!("issue {t}")).at(line, column)
    })
}

fn report_with(issues: &[Issue]) -> ArtifactReport {
    let mut report = ArtifactReport::new("PRD.md", Some(ArtifactKind::Prd));
    report.extend(issues.iter().cloned());
    report
}

proptest! {
    #[test]
    fn prop_finalize_is_idempotent(issues in proptest::collection::vec(issue_strategy(), 0..20)) {
        let once = report_with(&issues).finalize();
        let twice = once.clone().finalize();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_push_order_does_not_matter(
        shuffled in proptest::collection::vec(issue_strategy(), 0..20)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
        let (original, permuted) = shuffled;
        let a = report_with(&original).finalize();
        let b = report_with(&permuted).finalize();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_status_follows_issues_and_children(
        own in proptest::collection::vec(issue_strategy(), 0..4),
        child_issues in proptest::collection::vec(proptest::collection::vec(issue_strategy(), 0..2), 0..4),
    ) {
        let mut report = report_with(&own);
        let children: Vec<ArtifactReport> = child_issues
            .iter()
            .enumerate()
            .map(|(i, issues)| {
                let mut child = ArtifactReport::new(format!("adr/{i}.md"), Some(ArtifactKind::Adr));
                child.extend(issues.iter().cloned());
                child.finalize()
            })
            .collect();
        report.merge_children(children);
        let report = report.finalize();

        let clean = own.is_empty() && child_issues.iter().all(Vec::is_empty);
        prop_assert_eq!(report.status == Status::Pass, clean);
        prop_assert_eq!(report.children.len(), child_issues.len());
        let placeholders = own.iter().filter(|i| i.kind == IssueType::Placeholder).count();
        prop_assert!(report.placeholder_hits.len() <= placeholders);
        prop_assert!(report.errors.iter().all(|i| i.kind != IssueType::Placeholder));
    }
}

#[test]
fn merged_children_keep_first_report_per_path() {
    let mut first = ArtifactReport::new("adr/0.md", Some(ArtifactKind::Adr));
    first.push(Issue::new(IssueType::File, "adr/0.md", "unreadable"));
    let first = first.finalize();
    let second = ArtifactReport::new("adr/0.md", Some(ArtifactKind::Adr)).finalize();

    let mut report = ArtifactReport::new("adr", None);
    report.merge_children([first, second]);
    let report = report.finalize();
    assert_eq!(report.children.len(), 1);
    assert_eq!(report.status, Status::Fail);
}
