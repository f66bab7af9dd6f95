//! Per-kind structural rules
//!
//! Canonical section sets, field vocabularies and the generic structure
//! check that every FDD-format artifact goes through.

use crate::document::{Document, SectionLabel};
use crate::kind::ArtifactKind;
use serde::Serialize;

/// One canonical section of an artifact kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRule {
    /// Section letter
    pub letter: char,
    /// Canonical title
    pub title: &'static str,
    /// Whether the section must be present
    pub required: bool,
}

const fn rule(letter: char, title: &'static str, required: bool) -> SectionRule {
    SectionRule {
        letter,
        title,
        required,
    }
}

const PRD_SECTIONS: &[SectionRule] = &[
    rule('A', "Vision", true),
    rule('B', "Actors", true),
    rule('C', "Capabilities", true),
    rule('D', "Use Cases", false),
    rule('E', "Non-Functional Requirements", false),
];

const ADR_SECTIONS: &[SectionRule] = &[
    rule('A', "Context", true),
    rule('B', "Decision Drivers", false),
    rule('C', "Considered Options", false),
    rule('D', "Decision Outcome", true),
    rule('E', "Related Design Elements", false),
];

const DESIGN_SECTIONS: &[SectionRule] = &[
    rule('A', "Architecture Overview", true),
    rule('B', "Requirements & Principles", true),
    rule('C', "Technical Architecture", true),
    rule('D', "Additional Context", false),
];

const FEATURES_SECTIONS: &[SectionRule] = &[
    rule('A', "Overview", true),
    rule('B', "Features", true),
];

const FEATURE_DESIGN_SECTIONS: &[SectionRule] = &[
    rule('A', "Feature Context", true),
    rule('B', "Actor Flows", true),
    rule('C', "Algorithms", true),
    rule('D', "States", false),
    rule('E', "Technical Details", false),
    rule('F', "Requirements", true),
    rule('G', "Testing Scenarios", false),
];

/// Canonical lettered sections for a kind; empty for change logs
#[must_use]
pub fn section_rules(kind: ArtifactKind) -> &'static [SectionRule] {
    match kind {
        ArtifactKind::Prd => PRD_SECTIONS,
        ArtifactKind::Adr => ADR_SECTIONS,
        ArtifactKind::OverallDesign => DESIGN_SECTIONS,
        ArtifactKind::FeaturesManifest => FEATURES_SECTIONS,
        ArtifactKind::FeatureDesign => FEATURE_DESIGN_SECTIONS,
        ArtifactKind::FeatureChanges => &[],
    }
}

const COMMON_FIELDS: &[&str] = &["ID", "Status", "Description", "References"];

/// Closed field vocabulary for a kind (in addition to the common names)
#[must_use]
pub fn field_vocabulary(kind: ArtifactKind) -> &'static [&'static str] {
    match kind {
        ArtifactKind::Prd => &[
            "Purpose",
            "Target Users",
            "Actors",
            "Role",
            "Capabilities",
            "Use Cases",
            "Priority",
            "Preconditions",
            "Flow",
            "Postconditions",
        ],
        ArtifactKind::Adr => &[
            "Date",
            "Deciders",
            "Decision",
            "Rationale",
            "Consequences",
            "Pros",
            "Cons",
            "Options",
            "Chosen Option",
        ],
        ArtifactKind::OverallDesign => &[
            "Purpose",
            "Actors",
            "Capabilities",
            "Use Cases",
            "ADRs",
            "Rationale",
            "Priority",
            "Type",
            "Version",
        ],
        ArtifactKind::FeaturesManifest => &[
            "Purpose",
            "Slug",
            "Priority",
            "Depends On",
            "Blocks",
            "Phases",
            "Requirements Covered",
            "Capabilities",
            "Scope",
        ],
        ArtifactKind::FeatureDesign => &[
            "Purpose",
            "Actors",
            "Feature",
            "Requirements Covered",
            "References",
            "Priority",
            "Implements",
            "Phases",
            "Inputs",
            "Outputs",
            "Testing",
        ],
        ArtifactKind::FeatureChanges => &[
            "Implements",
            "Requirements",
            "Files",
            "Phases",
            "Version",
            "Tasks",
        ],
    }
}

/// True when `name` is a recognized field name for `kind`
#[must_use]
pub fn is_known_field(kind: ArtifactKind, name: &str) -> bool {
    COMMON_FIELDS.contains(&name) || field_vocabulary(kind).contains(&name)
}

/// Kind of structural problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructuralFindingKind {
    /// Required section absent
    MissingSection,
    /// Section appears after a section that must follow it
    SectionOrder,
    /// Section label outside the kind's canonical set
    UnknownSection,
    /// Same section appears twice
    DuplicateSection,
    /// Change log sections not numbered 1..N
    ChangeNumbering,
}

/// One structural problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralFinding {
    /// Problem kind
    pub kind: StructuralFindingKind,
    /// Section label, when one is involved
    pub section: Option<String>,
    /// 1-based line; `None` for missing sections
    pub line: Option<usize>,
    /// Human-readable description
    pub message: String,
}

/// Check section presence, order and membership
#[must_use]
pub fn check_structure(doc: &Document) -> Vec<StructuralFinding> {
    let mut findings = Vec::new();

    for heading in doc.unknown_headings() {
        findings.push(StructuralFinding {
            kind: StructuralFindingKind::UnknownSection,
            section: None,
            line: Some(heading.line),
            message: format!("unknown top-level section '{}'", heading.title),
        });
    }

    if doc.kind() == ArtifactKind::FeatureChanges {
        check_change_numbering(doc, &mut findings);
        return findings;
    }

    let rules = section_rules(doc.kind());
    let mut last_index: Option<usize> = None;
    let mut seen = Vec::new();

    for section in doc.sections() {
        let SectionLabel::Letter(letter) = section.label else {
            findings.push(StructuralFinding {
                kind: StructuralFindingKind::UnknownSection,
                section: Some(section.label.to_string()),
                line: Some(section.line),
                message: format!("'{}' is not a section of a {}", section.label, doc.kind()),
            });
            continue;
        };

        let Some(index) = rules.iter().position(|r| r.letter == letter) else {
            findings.push(StructuralFinding {
                kind: StructuralFindingKind::UnknownSection,
                section: Some(letter.to_string()),
                line: Some(section.line),
                message: format!("section {letter} is not defined for a {}", doc.kind()),
            });
            continue;
        };

        if seen.contains(&letter) {
            findings.push(StructuralFinding {
                kind: StructuralFindingKind::DuplicateSection,
                section: Some(letter.to_string()),
                line: Some(section.line),
                message: format!("section {letter} appears more than once"),
            });
            continue;
        }
        seen.push(letter);

        if let Some(last) = last_index {
            if index < last {
                findings.push(StructuralFinding {
                    kind: StructuralFindingKind::SectionOrder,
                    section: Some(letter.to_string()),
                    line: Some(section.line),
                    message: format!(
                        "section {letter} must come before section {}",
                        rules[last].letter
                    ),
                });
            }
        }
        last_index = Some(last_index.map_or(index, |l| l.max(index)));
    }

    for r in rules.iter().filter(|r| r.required && !seen.contains(&r.letter)) {
        findings.push(StructuralFinding {
            kind: StructuralFindingKind::MissingSection,
            section: Some(r.letter.to_string()),
            line: None,
            message: format!("missing required section {}. {}", r.letter, r.title),
        });
    }

    findings
}

fn check_change_numbering(doc: &Document, findings: &mut Vec<StructuralFinding>) {
    let mut expected = 1;
    for section in doc.sections() {
        match section.label {
            SectionLabel::Change(n) => {
                if n != expected {
                    findings.push(StructuralFinding {
                        kind: StructuralFindingKind::ChangeNumbering,
                        section: Some(section.label.to_string()),
                        line: Some(section.line),
                        message: format!("expected Change {expected}, found Change {n}"),
                    });
                }
                expected = n + 1;
            }
            SectionLabel::Letter(_) => findings.push(StructuralFinding {
                kind: StructuralFindingKind::UnknownSection,
                section: Some(section.label.to_string()),
                line: Some(section.line),
                message: "change logs only contain 'Change N' sections".to_string(),
            }),
        }
    }

    if expected == 1 {
        findings.push(StructuralFinding {
            kind: StructuralFindingKind::MissingSection,
            section: Some("Change 1".to_string()),
            line: None,
            message: "change log has no 'Change N' sections".to_string(),
        });
    }
}
