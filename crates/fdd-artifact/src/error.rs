//! Error types for identifier and scope reference parsing

/// Errors produced when a token cannot be read as an identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// Empty token
    #[error("empty identifier")]
    Empty,

    /// A segment is empty or contains characters outside `[a-z0-9]`
    #[error("invalid segment '{segment}' in '{id}'")]
    InvalidSegment { id: String, segment: String },

    /// No segment names a known entity kind
    #[error("no entity kind in '{0}'")]
    NoEntityKind(String),

    /// Nothing follows the entity kind
    #[error("missing suffix after entity kind in '{0}'")]
    MissingSuffix(String),

    /// A feature-scoped kind without a `feature-<slug>` segment
    #[error("'{id}' is a {kind} identifier and needs a feature slug segment")]
    MissingFeatureSlug { id: String, kind: String },

    /// A scope reference component other than `ph-N` or `inst-X`
    #[error("invalid scope reference component '{component}' in '{reference}'")]
    InvalidScopeComponent { reference: String, component: String },
}

impl IdentifierError {
    /// Create an invalid segment error
    pub fn invalid_segment(id: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::InvalidSegment {
            id: id.into(),
            segment: segment.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_error_display() {
        let err = IdentifierError::invalid_segment("ns-Flow", "Flow");
        assert_eq!(err.to_string(), "invalid segment 'Flow' in 'ns-Flow'");
    }
}
