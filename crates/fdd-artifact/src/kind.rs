//! Artifact and entity kinds
//!
//! Both enums are closed: every dispatch on them (structural rules,
//! dependency template, defining-artifact lookup) is an exhaustive `match`.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of a documentation artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Product requirements document
    Prd,
    /// Architecture decision record (registry path is a directory)
    Adr,
    /// Overall system design
    OverallDesign,
    /// Features manifest listing every feature of a system
    FeaturesManifest,
    /// Per-feature design (registry path is the feature root directory)
    FeatureDesign,
    /// Per-feature change log, lives next to the feature design
    FeatureChanges,
}

impl ArtifactKind {
    /// Bottom-up validation order used by cascading checks
    pub const VALIDATION_ORDER: [ArtifactKind; 6] = [
        ArtifactKind::Prd,
        ArtifactKind::Adr,
        ArtifactKind::OverallDesign,
        ArtifactKind::FeaturesManifest,
        ArtifactKind::FeatureDesign,
        ArtifactKind::FeatureChanges,
    ];

    /// Kinds that can be declared in the registry file
    pub const REGISTERED: [ArtifactKind; 5] = [
        ArtifactKind::Prd,
        ArtifactKind::Adr,
        ArtifactKind::OverallDesign,
        ArtifactKind::FeaturesManifest,
        ArtifactKind::FeatureDesign,
    ];

    /// Stable kebab-case name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Prd => "prd",
            ArtifactKind::Adr => "adr",
            ArtifactKind::OverallDesign => "overall-design",
            ArtifactKind::FeaturesManifest => "features-manifest",
            ArtifactKind::FeatureDesign => "feature-design",
            ArtifactKind::FeatureChanges => "feature-changes",
        }
    }

    /// Name used for this kind in the registry file, if it can be registered
    #[inline]
    #[must_use]
    pub fn registry_name(self) -> Option<&'static str> {
        match self {
            ArtifactKind::Prd => Some("PRD"),
            ArtifactKind::Adr => Some("ADR"),
            ArtifactKind::OverallDesign => Some("DESIGN"),
            ArtifactKind::FeaturesManifest => Some("FEATURES"),
            ArtifactKind::FeatureDesign => Some("FEATURE"),
            ArtifactKind::FeatureChanges => None,
        }
    }

    /// Parse a registry kind name (`PRD`, `ADR`, `DESIGN`, `FEATURES`, `FEATURE`)
    #[must_use]
    pub fn from_registry_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "PRD" => Some(ArtifactKind::Prd),
            "ADR" => Some(ArtifactKind::Adr),
            "DESIGN" => Some(ArtifactKind::OverallDesign),
            "FEATURES" => Some(ArtifactKind::FeaturesManifest),
            "FEATURE" => Some(ArtifactKind::FeatureDesign),
            _ => None,
        }
    }

    /// Direct dependencies from the static kind template
    #[inline]
    #[must_use]
    pub fn dependencies(self) -> &'static [ArtifactKind] {
        match self {
            ArtifactKind::Prd => &[],
            ArtifactKind::Adr => &[ArtifactKind::Prd],
            ArtifactKind::OverallDesign => &[ArtifactKind::Prd, ArtifactKind::Adr],
            ArtifactKind::FeaturesManifest => &[ArtifactKind::OverallDesign],
            ArtifactKind::FeatureDesign => {
                &[ArtifactKind::FeaturesManifest, ArtifactKind::OverallDesign]
            }
            ArtifactKind::FeatureChanges => &[ArtifactKind::FeatureDesign],
        }
    }

    /// Whether the registry path for this kind names a directory
    #[inline]
    #[must_use]
    pub fn registry_path_is_dir(self) -> bool {
        matches!(self, ArtifactKind::Adr | ArtifactKind::FeatureDesign)
    }

    /// Position in [`Self::VALIDATION_ORDER`]
    #[inline]
    #[must_use]
    pub fn tier(self) -> usize {
        match self {
            ArtifactKind::Prd => 0,
            ArtifactKind::Adr => 1,
            ArtifactKind::OverallDesign => 2,
            ArtifactKind::FeaturesManifest => 3,
            ArtifactKind::FeatureDesign => 4,
            ArtifactKind::FeatureChanges => 5,
        }
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity an identifier names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Actor interacting with the system
    Actor,
    /// Product capability
    Capability,
    /// Use case
    Usecase,
    /// Requirement (project-level or feature-level)
    Requirement,
    /// Design principle
    Principle,
    /// Design constraint
    Constraint,
    /// Non-functional requirement
    Nfr,
    /// Architecture decision
    Adr,
    /// Feature
    Feature,
    /// Actor flow
    Flow,
    /// Algorithm
    Algo,
    /// State machine
    State,
    /// Test scenario
    Test,
    /// Change log entry
    Change,
    /// Design context
    Context,
}

impl EntityKind {
    /// Every entity kind, in declaration order
    pub const ALL: [EntityKind; 15] = [
        EntityKind::Actor,
        EntityKind::Capability,
        EntityKind::Usecase,
        EntityKind::Requirement,
        EntityKind::Principle,
        EntityKind::Constraint,
        EntityKind::Nfr,
        EntityKind::Adr,
        EntityKind::Feature,
        EntityKind::Flow,
        EntityKind::Algo,
        EntityKind::State,
        EntityKind::Test,
        EntityKind::Change,
        EntityKind::Context,
    ];

    /// Canonical token used inside identifiers
    #[inline]
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            EntityKind::Actor => "actor",
            EntityKind::Capability => "capability",
            EntityKind::Usecase => "usecase",
            EntityKind::Requirement => "req",
            EntityKind::Principle => "principle",
            EntityKind::Constraint => "constraint",
            EntityKind::Nfr => "nfr",
            EntityKind::Adr => "adr",
            EntityKind::Feature => "feature",
            EntityKind::Flow => "flow",
            EntityKind::Algo => "algo",
            EntityKind::State => "state",
            EntityKind::Test => "test",
            EntityKind::Change => "change",
            EntityKind::Context => "context",
        }
    }

    /// Parse an identifier segment; `requirement` is accepted as a long form of `req`
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "requirement" => Some(EntityKind::Requirement),
            other => Self::ALL.into_iter().find(|k| k.token() == other),
        }
    }

    /// Kinds that must carry a feature slug segment
    #[inline]
    #[must_use]
    pub fn requires_feature(self) -> bool {
        matches!(
            self,
            EntityKind::Flow
                | EntityKind::Algo
                | EntityKind::State
                | EntityKind::Test
                | EntityKind::Change
        )
    }

    /// Kinds that may follow a `feature-<slug>` segment
    #[inline]
    #[must_use]
    pub fn allows_feature(self) -> bool {
        self.requires_feature() || self == EntityKind::Requirement
    }

    /// Kinds whose definitions carry implementable steps
    #[inline]
    #[must_use]
    pub fn is_scope(self) -> bool {
        matches!(
            self,
            EntityKind::Flow
                | EntityKind::Algo
                | EntityKind::State
                | EntityKind::Requirement
                | EntityKind::Test
        )
    }

    /// Artifact kind expected to define identifiers of this entity kind
    #[must_use]
    pub fn defining_artifact(self, feature_scoped: bool) -> ArtifactKind {
        match self {
            EntityKind::Actor | EntityKind::Capability | EntityKind::Usecase | EntityKind::Nfr => {
                ArtifactKind::Prd
            }
            EntityKind::Adr => ArtifactKind::Adr,
            EntityKind::Requirement if feature_scoped => ArtifactKind::FeatureDesign,
            EntityKind::Requirement
            | EntityKind::Principle
            | EntityKind::Constraint
            | EntityKind::Context => ArtifactKind::OverallDesign,
            EntityKind::Feature => ArtifactKind::FeaturesManifest,
            EntityKind::Flow | EntityKind::Algo | EntityKind::State | EntityKind::Test => {
                ArtifactKind::FeatureDesign
            }
            EntityKind::Change => ArtifactKind::FeatureChanges,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_roundtrip() {
        for kind in ArtifactKind::REGISTERED {
            let name = kind.registry_name().unwrap();
            assert_eq!(ArtifactKind::from_registry_name(name), Some(kind));
        }
        assert_eq!(ArtifactKind::FeatureChanges.registry_name(), None);
        assert_eq!(ArtifactKind::from_registry_name("design"), Some(ArtifactKind::OverallDesign));
        assert_eq!(ArtifactKind::from_registry_name("README"), None);
    }

    #[test]
    fn dependency_template_points_down_the_tiers() {
        for kind in ArtifactKind::VALIDATION_ORDER {
            for dep in kind.dependencies() {
                assert!(dep.tier() < kind.tier(), "{kind} -> {dep}");
            }
        }
    }

    #[test]
    fn feature_scoping() {
        assert!(EntityKind::Flow.requires_feature());
        assert!(!EntityKind::Requirement.requires_feature());
        assert!(EntityKind::Requirement.allows_feature());
        assert!(!EntityKind::Actor.allows_feature());
    }

    #[test]
    fn token_aliases() {
        assert_eq!(EntityKind::from_token("req"), Some(EntityKind::Requirement));
        assert_eq!(EntityKind::from_token("requirement"), Some(EntityKind::Requirement));
        assert_eq!(EntityKind::from_token("widget"), None);
    }

    #[test]
    fn requirement_defined_by_scope() {
        assert_eq!(
            EntityKind::Requirement.defining_artifact(false),
            ArtifactKind::OverallDesign
        );
        assert_eq!(
            EntityKind::Requirement.defining_artifact(true),
            ArtifactKind::FeatureDesign
        );
    }
}
