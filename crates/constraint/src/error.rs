//! Analysis and configuration errors
//!
//! Two families of problems exist in this crate and they never mix:
//!
//! - A value that does not satisfy a criterion is a
//!   [`ValidationFailure`](crate::foundation::ValidationFailure), returned by
//!   evaluation.
//! - A schema or constraint definition that cannot be analysed or compiled is
//!   an [`AnalysisError`], returned by tree building and compilation. It names
//!   the location, the constraint and the type involved.
//!
//! ```rust,ignore
//! use nebula_constraint::error::AnalysisError;
//!
//! let err = AnalysisError::unknown_constraint("positiv");
//! assert_eq!(err.to_string(), "unknown constraint kind 'positiv'");
//! ```

// ============================================================================
// ANALYSIS ERROR
// ============================================================================

/// A schema or constraint definition that cannot be analysed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AnalysisError {
    /// A declaration names a constraint kind missing from the catalog.
    #[error("unknown constraint kind '{kind}'")]
    UnknownConstraint { kind: String },

    /// A cascade or validator lookup names a class that is not registered.
    #[error("unknown class '{class}'")]
    UnknownClass { class: String },

    /// A class was registered twice.
    #[error("class '{class}' is already registered")]
    DuplicateClass { class: String },

    /// A required constraint attribute has no value and no default.
    #[error("constraint '{constraint}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        constraint: String,
        attribute: String,
    },

    /// An attribute has a value of the wrong kind or out of range.
    #[error("constraint '{constraint}' has invalid attribute '{attribute}': {reason}")]
    InvalidAttribute {
        constraint: String,
        attribute: String,
        reason: String,
    },

    /// A non-combinator constraint has no factory for the position's type.
    #[error("no criterion factory of '{constraint}' applies to {ty} at {location}")]
    NoApplicableFactory {
        location: String,
        constraint: String,
        ty: String,
    },

    /// A constraint needs a value extractor that the engine does not know.
    #[error("no value extractor for '{constraint}' on {ty} at {location}")]
    NoValueExtractor {
        location: String,
        constraint: String,
        ty: String,
    },

    /// A wrapper was asked to wrap a criterion it cannot carry.
    #[error("{wrapper} cannot wrap a criterion of shape {shape}")]
    UnsupportedShape { wrapper: String, shape: String },

    /// Two criteria of different shapes were combined.
    #[error("criterion shape mismatch: expected {expected}, found {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// A textual expression in an attribute could not be parsed.
    #[error("malformed expression '{expression}' for '{constraint}': {reason}")]
    MalformedExpression {
        constraint: String,
        expression: String,
        reason: String,
    },

    /// Cascade requested on a position that is not a class type.
    #[error("cascade on {ty} at {location} requires a class type")]
    InvalidCascade { location: String, ty: String },

    /// A constraint or class definition is internally inconsistent.
    #[error("invalid definition of '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// Type nesting exceeded the configured depth limit.
    #[error("type nesting at {location} exceeds the limit of {limit}")]
    DepthExceeded { location: String, limit: usize },
}

// ============================================================================
// CONSTRUCTOR HELPERS
// ============================================================================

impl AnalysisError {
    pub fn unknown_constraint(kind: impl Into<String>) -> Self {
        Self::UnknownConstraint { kind: kind.into() }
    }

    pub fn unknown_class(class: impl Into<String>) -> Self {
        Self::UnknownClass {
            class: class.into(),
        }
    }

    pub fn missing_attribute(constraint: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            constraint: constraint.into(),
            attribute: attribute.into(),
        }
    }

    pub fn invalid_attribute(
        constraint: impl Into<String>,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            constraint: constraint.into(),
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(
        constraint: impl Into<String>,
        expression: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedExpression {
            constraint: constraint.into(),
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_definition(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable name of the variant.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownConstraint { .. } => "unknown_constraint",
            Self::UnknownClass { .. } => "unknown_class",
            Self::DuplicateClass { .. } => "duplicate_class",
            Self::MissingAttribute { .. } => "missing_attribute",
            Self::InvalidAttribute { .. } => "invalid_attribute",
            Self::NoApplicableFactory { .. } => "no_applicable_factory",
            Self::NoValueExtractor { .. } => "no_value_extractor",
            Self::UnsupportedShape { .. } => "unsupported_shape",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::MalformedExpression { .. } => "malformed_expression",
            Self::InvalidCascade { .. } => "invalid_cascade",
            Self::InvalidDefinition { .. } => "invalid_definition",
            Self::DepthExceeded { .. } => "depth_exceeded",
        }
    }
}

// ============================================================================
// CONFIG ERROR
// ============================================================================

/// Engine configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid engine config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_parts() {
        let err = AnalysisError::NoApplicableFactory {
            location: "User#name".into(),
            constraint: "positive".into(),
            ty: "String".into(),
        };
        assert_eq!(
            err.to_string(),
            "no criterion factory of 'positive' applies to String at User#name"
        );
        assert_eq!(err.code(), "no_applicable_factory");
    }

    #[test]
    fn config_error_wraps_json() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::from(parse);
        assert!(err.to_string().starts_with("failed to parse engine config"));
    }
}
