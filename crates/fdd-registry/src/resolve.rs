//! Dependency graph resolver
//!
//! Instantiates the static kind template of [`ArtifactKind::dependencies`]
//! for one system. Each required kind is looked up along the parent chain
//! ("nearest ancestor wins"), then the dependency's own requirements are
//! pushed onto the worklist, resolved against the dependency's system.
//!
//! The visited set is keyed by kind, so a kind is resolved at most once per
//! call and the loop terminates on any registry, cyclic parents included.

use crate::registry::{ChainIssue, Registry, RegistryEntry};
use fdd_artifact::ArtifactKind;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A required kind that no system in the chain provides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDependency {
    /// Kind that could not be resolved
    pub kind: ArtifactKind,
    /// Kind whose template required it
    pub required_by: ArtifactKind,
    /// System whose parent chain was searched
    pub system: String,
}

/// Output of one resolver run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependencies {
    /// Kind that was resolved for
    pub target: ArtifactKind,
    /// System the walk started from
    pub system: String,
    /// Resolved entry per dependency kind
    pub resolved: BTreeMap<ArtifactKind, RegistryEntry>,
    /// Kinds with no entry anywhere in the relevant chain
    pub missing: Vec<MissingDependency>,
    /// Cycles and dead ends met while walking parent chains
    pub chain_issues: Vec<ChainIssue>,
}

impl ResolvedDependencies {
    /// Resolved entries in bottom-up validation order
    pub fn in_validation_order(&self) -> impl Iterator<Item = &RegistryEntry> {
        ArtifactKind::VALIDATION_ORDER
            .iter()
            .filter_map(|kind| self.resolved.get(kind))
    }

    /// Resolved entry for one kind
    #[inline]
    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> Option<&RegistryEntry> {
        self.resolved.get(&kind)
    }

    /// True when every required kind resolved
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Resolver over a loaded registry
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'r> {
    registry: &'r Registry,
}

impl<'r> DependencyResolver<'r> {
    /// Create a resolver
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Resolve every transitive dependency of `target` for `system`
    #[must_use]
    pub fn resolve(&self, system: &str, target: ArtifactKind) -> ResolvedDependencies {
        let mut out = ResolvedDependencies {
            target,
            system: system.to_string(),
            resolved: BTreeMap::new(),
            missing: Vec::new(),
            chain_issues: Vec::new(),
        };

        let mut visited: BTreeSet<ArtifactKind> = BTreeSet::new();
        let mut worklist: VecDeque<(ArtifactKind, String, ArtifactKind)> = target
            .dependencies()
            .iter()
            .map(|&dep| (dep, system.to_string(), target))
            .collect();

        while let Some((kind, from_system, required_by)) = worklist.pop_front() {
            if !visited.insert(kind) {
                continue;
            }

            let chain = self.registry.parent_chain(&from_system);
            if let Some(issue) = chain.issue {
                if !out.chain_issues.contains(&issue) {
                    tracing::warn!(?issue, "parent chain stopped early");
                    out.chain_issues.push(issue);
                }
            }

            let Some(entry) = self.registry.resolve_one_of_kind(&from_system, kind) else {
                tracing::debug!(%kind, system = %from_system, "dependency not found");
                out.missing.push(MissingDependency {
                    kind,
                    required_by,
                    system: from_system,
                });
                continue;
            };

            tracing::debug!(
                %kind,
                system = %entry.system,
                path = %entry.path.display(),
                "resolved dependency"
            );
            for &next in kind.dependencies() {
                if !visited.contains(&next) {
                    worklist.push_back((next, entry.system.clone(), kind));
                }
            }
            out.resolved.insert(kind, entry.clone());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn registry(json: &str) -> Registry {
        Registry::from_json(Path::new("/repo"), json).unwrap()
    }

    #[test]
    fn resolve_full_chain_in_order() {
        let r = registry(
            r#"{"artifacts": [
                {"kind": "PRD", "system": "core", "path": "PRD.md"},
                {"kind": "ADR", "system": "core", "path": "ADR"},
                {"kind": "DESIGN", "system": "core", "path": "DESIGN.md"},
                {"kind": "FEATURES", "system": "core", "path": "FEATURES.md"},
                {"kind": "FEATURE", "system": "core", "path": "features"}
            ]}"#,
        );
        let deps = DependencyResolver::new(&r).resolve("core", ArtifactKind::FeatureDesign);
        assert!(deps.is_complete());
        let order: Vec<_> = deps.in_validation_order().map(|e| e.kind).collect();
        assert_eq!(
            order,
            vec![
                ArtifactKind::Prd,
                ArtifactKind::Adr,
                ArtifactKind::OverallDesign,
                ArtifactKind::FeaturesManifest
            ]
        );
    }

    #[test]
    fn resolve_missing_prd_for_adr() {
        let r = registry(r#"{"artifacts": [{"kind": "ADR", "system": "A", "path": "adr"}]}"#);
        let deps = DependencyResolver::new(&r).resolve("A", ArtifactKind::Adr);
        assert!(deps.resolved.is_empty());
        assert_eq!(
            deps.missing,
            vec![MissingDependency {
                kind: ArtifactKind::Prd,
                required_by: ArtifactKind::Adr,
                system: "A".into()
            }]
        );
    }

    #[test]
    fn resolve_inherits_from_parent() {
        let r = registry(
            r#"{"artifacts": [
                {"kind": "PRD", "system": "root", "path": "PRD.md"},
                {"kind": "DESIGN", "system": "child", "path": "child/DESIGN.md", "parent": "root"}
            ]}"#,
        );
        let deps = DependencyResolver::new(&r).resolve("child", ArtifactKind::FeaturesManifest);
        assert_eq!(deps.get(ArtifactKind::OverallDesign).unwrap().system, "child");
        assert_eq!(deps.get(ArtifactKind::Prd).unwrap().system, "root");
        assert_eq!(deps.missing.len(), 1);
        assert_eq!(deps.missing[0].kind, ArtifactKind::Adr);
    }

    #[test]
    fn resolve_terminates_on_cycle() {
        let r = registry(
            r#"{"artifacts": [
                {"kind": "ADR", "system": "a", "path": "a/adr", "parent": "b"},
                {"kind": "ADR", "system": "b", "path": "b/adr", "parent": "a"}
            ]}"#,
        );
        let deps = DependencyResolver::new(&r).resolve("a", ArtifactKind::OverallDesign);
        assert_eq!(deps.get(ArtifactKind::Adr).unwrap().system, "a");
        assert!(deps
            .missing
            .iter()
            .any(|m| m.kind == ArtifactKind::Prd));
        assert!(deps
            .chain_issues
            .iter()
            .any(|i| matches!(i, ChainIssue::ParentCycle { .. })));
    }
}
