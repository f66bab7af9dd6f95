//! Identifiers and scope references
//!
//! An identifier is `namespace-kind-suffix`, or
//! `namespace-feature-slug-kind-suffix` for feature-scoped kinds. A scope
//! reference addresses one step inside a definition:
//! `<identifier>[:ph-N][:inst-X]`.

use crate::error::IdentifierError;
use crate::kind::EntityKind;
use serde::{Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Parsed identifier token
///
/// Equality and hashing use the raw text, so two spellings of the same
/// kind token (`req`/`requirement`) stay distinct identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    raw: String,
    namespace: String,
    kind: EntityKind,
    feature: Option<String>,
    suffix: String,
}

impl Identifier {
    /// Parse an identifier token
    ///
    /// # Errors
    /// Returns [`IdentifierError`] when the token is not a well-formed identifier.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let segments: Vec<&str> = raw.split('-').collect();
        for segment in &segments {
            if !is_segment(segment) {
                return Err(IdentifierError::invalid_segment(raw, *segment));
            }
        }

        let Some(kind_at) = segments
            .iter()
            .skip(1)
            .position(|s| EntityKind::from_token(s).is_some())
            .map(|p| p + 1)
        else {
            return Err(IdentifierError::NoEntityKind(raw.to_string()));
        };

        let namespace = segments[..kind_at].join("-");
        let kind = EntityKind::from_token(segments[kind_at])
            .ok_or_else(|| IdentifierError::NoEntityKind(raw.to_string()))?;
        let rest = &segments[kind_at + 1..];

        if rest.is_empty() {
            return Err(IdentifierError::MissingSuffix(raw.to_string()));
        }

        if kind == EntityKind::Feature {
            // First scoped kind token leaving both a slug and a suffix wins.
            let scoped = (1..rest.len().saturating_sub(1)).find_map(|j| {
                EntityKind::from_token(rest[j])
                    .filter(|k| k.allows_feature())
                    .map(|k| (j, k))
            });

            return Ok(match scoped {
                Some((j, scoped_kind)) => Self {
                    raw: raw.to_string(),
                    namespace,
                    kind: scoped_kind,
                    feature: Some(rest[..j].join("-")),
                    suffix: rest[j + 1..].join("-"),
                },
                None => {
                    let slug = rest.join("-");
                    Self {
                        raw: raw.to_string(),
                        namespace,
                        kind,
                        feature: Some(slug.clone()),
                        suffix: slug,
                    }
                }
            });
        }

        if kind.requires_feature() {
            return Err(IdentifierError::MissingFeatureSlug {
                id: raw.to_string(),
                kind: kind.token().to_string(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            namespace,
            kind,
            feature: None,
            suffix: rest.join("-"),
        })
    }

    /// Original token text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Namespace prefix
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Entity kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Feature slug segment, also set for feature identifiers themselves
    #[inline]
    #[must_use]
    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    /// Free suffix after the entity kind
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// True for identifiers owned by a single feature (not the feature itself)
    #[inline]
    #[must_use]
    pub fn is_feature_scoped(&self) -> bool {
        self.feature.is_some() && self.kind != EntityKind::Feature
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Reference to a definition, optionally narrowed to a phase and instruction
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeRef {
    base: Identifier,
    phase: Option<u32>,
    instruction: Option<String>,
}

impl ScopeRef {
    /// Build a reference from parts
    #[inline]
    #[must_use]
    pub fn new(base: Identifier, phase: Option<u32>, instruction: Option<String>) -> Self {
        Self {
            base,
            phase,
            instruction,
        }
    }

    /// Parse `<id>[:ph-N][:inst-X]`
    ///
    /// # Errors
    /// Returns [`IdentifierError`] when the base id or a component is malformed.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let raw = raw.trim();
        let mut parts = raw.split(':');
        let base = Identifier::parse(parts.next().unwrap_or_default())?;
        let mut phase = None;
        let mut instruction = None;

        for component in parts {
            let invalid = || IdentifierError::InvalidScopeComponent {
                reference: raw.to_string(),
                component: component.to_string(),
            };

            if let Some(n) = component.strip_prefix("ph-") {
                if phase.is_some() || instruction.is_some() {
                    return Err(invalid());
                }
                phase = Some(n.parse::<u32>().map_err(|_| invalid())?);
            } else if let Some(slug) = component.strip_prefix("inst-") {
                if instruction.is_some() || !slug.split('-').all(is_segment) {
                    return Err(invalid());
                }
                instruction = Some(slug.to_string());
            } else {
                return Err(invalid());
            }
        }

        Ok(Self {
            base,
            phase,
            instruction,
        })
    }

    /// Base identifier
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Identifier {
        &self.base
    }

    /// Phase number (`ph-N`)
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Option<u32> {
        self.phase
    }

    /// Instruction slug (`inst-X`), without the prefix
    #[inline]
    #[must_use]
    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    /// True when the reference addresses a single instruction
    #[inline]
    #[must_use]
    pub fn is_instruction(&self) -> bool {
        self.instruction.is_some()
    }
}

impl FromStr for ScopeRef {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ScopeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(phase) = self.phase {
            write!(f, ":ph-{phase}")?;
        }
        if let Some(inst) = &self.instruction {
            write!(f, ":inst-{inst}")?;
        }
        Ok(())
    }
}

impl Serialize for ScopeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Format the canonical instruction tag `<scope>:ph-N:inst-X`
#[inline]
#[must_use]
pub fn instruction_tag(scope: &str, phase: u32, instruction: &str) -> String {
    format!("{scope}:ph-{phase}:inst-{instruction}")
}

fn is_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}
