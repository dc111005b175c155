//! Prelude module for convenient imports.
//!
//! `use nebula_constraint::prelude::*;` brings in what a schema author and a
//! validation call site need.

// ============================================================================
// FOUNDATION: values, types, failures
// ============================================================================

pub use crate::foundation::{
    AnnotatedType, Annotation, Indicator, ObjectValue, PrimitiveKind, TypeDescriptor,
    ValidationFailure, ValidationResult, Value,
};

// ============================================================================
// CONSTRAINTS: declarations and custom kinds
// ============================================================================

pub use crate::catalog::Catalog;
pub use crate::constraint::{
    AttributeValue, CombinedConstraint, ConstraintDeclaration, ConstraintMetadata, factory,
};
pub use crate::criterion::{AnyCriterion, Criterion};

// ============================================================================
// ENGINE
// ============================================================================

pub use crate::config::EngineConfig;
pub use crate::engine::{ValidationEngine, Validator};
pub use crate::error::AnalysisError;
pub use crate::node::ClassSchema;
pub use crate::wrapper::{PropertySource, ValueExtractor};
