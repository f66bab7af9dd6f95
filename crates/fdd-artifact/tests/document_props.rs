//! Property tests for the structural document model.

use fdd_artifact::{ArtifactKind, Document, Identifier};
use proptest::prelude::*;

fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("## A. Vision".to_string()),
        Just("## C. Algorithms".to_string()),
        Just("## Change 1: First".to_string()),
        Just("### 1. Entry".to_string()),
        Just("- [x] **ID**: `ns-feature-a-flow-b`".to_string()),
        Just("- [ ] **ID**: `ns-capability-export`".to_string()),
        Just("1. [x] - `ph-1` - Do it - `inst-do-it`".to_string()),
        Just("**Status**: DONE".to_string()),
        Just("```".to_string()),
        "[a-z `#*\\-\\[\\]:]{0,30}",
    ]
}

proptest! {
    #[test]
    fn prop_parse_is_deterministic(lines in proptest::collection::vec(line_strategy(), 0..40)) {
        let text = lines.join("\n");
        let a = Document::parse(ArtifactKind::FeatureDesign, text.clone());
        let b = Document::parse(ArtifactKind::FeatureDesign, text);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_sections_are_ordered_and_disjoint(lines in proptest::collection::vec(line_strategy(), 0..40)) {
        let doc = Document::parse(ArtifactKind::Prd, lines.join("\n"));
        let mut previous_end = 1;
        for section in doc.sections() {
            prop_assert!(section.line >= previous_end);
            prop_assert!(section.end > section.line);
            prop_assert!(section.end <= doc.line_count() + 1);
            previous_end = section.end;
        }
    }

    #[test]
    fn prop_occurrence_lines_point_at_their_token(lines in proptest::collection::vec(line_strategy(), 0..40)) {
        let doc = Document::parse(ArtifactKind::FeatureDesign, lines.join("\n"));
        for occ in doc.ids() {
            let text = doc.line(occ.line).unwrap_or_default();
            prop_assert!(text[occ.column - 1..].starts_with(occ.identifier.as_str()));
        }
    }

    #[test]
    fn prop_identifier_roundtrip(ns in "[a-z]{2,5}", slug in "[a-z]{1,6}", suffix in "[a-z]{1,6}") {
        let raw = format!("{ns}-feature-{slug}-flow-{suffix}");
        let id = Identifier::parse(&raw).unwrap();
        prop_assert_eq!(id.to_string(), raw);
    }
}
