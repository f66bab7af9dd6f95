use fdd_artifact::ArtifactKind;
use fdd_registry::{ChainIssue, DependencyResolver, Registry};
use proptest::prelude::*;
use std::fmt::Write as _;
use std::path::Path;

const KINDS: [&str; 5] = ["PRD", "ADR", "DESIGN", "FEATURES", "FEATURE"];

/// Registry JSON with `systems` systems `s0..sN`, arbitrary parents (cycles
/// included) and an arbitrary subset of kinds per system
fn registry_json(parents: &[Option<usize>], kinds: &[(usize, usize)]) -> String {
    let mut entries = Vec::new();
    for (i, &(system, kind)) in kinds.iter().enumerate() {
        let system = system % parents.len();
        let mut entry = format!(
            r#"{{"kind": "{}", "system": "s{system}", "path": "p{i}""#,
            KINDS[kind % KINDS.len()]
        );
        if let Some(parent) = parents[system] {
            write!(entry, r#", "parent": "s{parent}""#).unwrap();
        }
        entry.push('}');
        entries.push(entry);
    }
    format!(r#"{{"artifacts": [{}]}}"#, entries.join(","))
}

fn parent_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1..6usize).prop_flat_map(|n| proptest::collection::vec(proptest::option::of(0..n + 1), n))
}

proptest! {
    #[test]
    fn prop_parent_chain_terminates_without_repeats(
        parents in parent_strategy(),
        kinds in proptest::collection::vec((0..8usize, 0..5usize), 0..20),
    ) {
        let registry = Registry::from_json(Path::new("/r"), &registry_json(&parents, &kinds)).unwrap();
        for system in registry.systems() {
            let chain = registry.parent_chain(system);
            let mut seen = std::collections::HashSet::new();
            for s in &chain.systems {
                prop_assert!(seen.insert(s.clone()), "system {} visited twice", s);
            }
            prop_assert_eq!(chain.systems.first(), Some(system));
        }
    }

    #[test]
    fn prop_resolution_is_deterministic(
        parents in parent_strategy(),
        kinds in proptest::collection::vec((0..8usize, 0..5usize), 0..20),
    ) {
        let json = registry_json(&parents, &kinds);
        let a = Registry::from_json(Path::new("/r"), &json).unwrap();
        let b = Registry::from_json(Path::new("/r"), &json).unwrap();
        for system in a.systems() {
            for kind in ArtifactKind::REGISTERED {
                let left = DependencyResolver::new(&a).resolve(system, kind);
                let right = DependencyResolver::new(&b).resolve(system, kind);
                prop_assert_eq!(&left, &right);
                prop_assert_eq!(a.resolve_one_of_kind(system, kind), b.resolve_one_of_kind(system, kind));
                // Every kind is either resolved or missing, never both
                for missing in &left.missing {
                    prop_assert!(!left.resolved.contains_key(&missing.kind));
                }
            }
        }
    }
}

#[test]
fn transitive_self_parent_reports_cycle() {
    let json = registry_json(&[Some(1), Some(2), Some(0)], &[(0, 1), (1, 2), (2, 2)]);
    let registry = Registry::from_json(Path::new("/r"), &json).unwrap();
    let chain = registry.parent_chain("s0");
    assert_eq!(chain.systems, vec!["s0", "s1", "s2"]);
    assert_eq!(
        chain.issue,
        Some(ChainIssue::ParentCycle {
            origin: "s0".into(),
            system: "s0".into()
        })
    );

    let deps = DependencyResolver::new(&registry).resolve("s0", ArtifactKind::OverallDesign);
    assert_eq!(deps.get(ArtifactKind::Adr).unwrap().system, "s0");
    assert!(deps.missing.iter().any(|m| m.kind == ArtifactKind::Prd));
}
