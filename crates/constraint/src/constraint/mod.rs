//! Constraints: declarations, kinds, resolved instances and their processing
//!
//! - A [`ConstraintDeclaration`] is what the annotation-discovery layer hands
//!   over: a kind name plus the attribute values written at the declaration.
//! - A [`ConstraintMetadata`] describes a kind: defaults, criterion factories,
//!   combined constraints.
//! - A [`Constraint`] is a declaration resolved against its kind: defaults
//!   applied, order and message settled, combined constraints instantiated.
//!   Instances are interned by the [`ConstraintCache`], so structurally equal
//!   declarations share one instance.
//! - [`process`] turns one constraint at one node into a criterion, running
//!   combined constraints around the constraint's own check by their order.
//!
//! Two attribute names are reserved for every kind: `message` (outward
//! message template) and `order` (relative execution order).

mod attribute;
mod cache;
mod combined;
mod metadata;
mod processor;

use std::fmt;
use std::sync::Arc;

pub use attribute::{AttributeValue, Attributes};
pub use cache::ConstraintCache;
pub use combined::{AttributeFn, AttributeSource, CombinedConstraint};
pub use metadata::{
    AttributeSpec, ConstraintMetadata, ConstraintMetadataBuilder, CriterionFactory, FnFactory,
    factory,
};
pub use processor::process;

use crate::error::AnalysisError;

/// Reserved attribute holding the outward message template.
pub const MESSAGE: &str = "message";

/// Reserved attribute holding the relative execution order.
pub const ORDER: &str = "order";

pub(crate) fn is_reserved(name: &str) -> bool {
    name == MESSAGE || name == ORDER
}

// ============================================================================
// DECLARATION
// ============================================================================

/// A constraint as written on a class, property or type-use position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use = "builder methods must be chained or built"]
pub struct ConstraintDeclaration {
    kind: Arc<str>,
    attributes: Attributes,
}

impl ConstraintDeclaration {
    pub fn new(kind: impl Into<Arc<str>>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Attributes::new(),
        }
    }

    /// Sets an attribute.
    pub fn attr(mut self, name: impl Into<Arc<str>>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// Sets the outward message template.
    pub fn message(self, message: impl Into<Arc<str>>) -> Self {
        self.attr(MESSAGE, AttributeValue::Str(message.into()))
    }

    /// Sets the relative execution order.
    pub fn order(self, order: i32) -> Self {
        self.attr(ORDER, order)
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

// ============================================================================
// CONSTRAINT
// ============================================================================

/// A declaration resolved against its kind. Immutable once built.
pub struct Constraint {
    metadata: Arc<ConstraintMetadata>,
    attributes: Attributes,
    order: Option<i32>,
    message: Option<Arc<str>>,
    combined: Vec<Arc<Constraint>>,
}

impl Constraint {
    #[must_use]
    pub fn kind(&self) -> &str {
        self.metadata.name()
    }

    #[must_use]
    pub const fn metadata(&self) -> &Arc<ConstraintMetadata> {
        &self.metadata
    }

    /// Resolved attributes, defaults applied. Includes `message` and `order`
    /// only when the declaration set them.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Reads an integer attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidAttribute`] if it is absent or not an integer.
    pub fn int(&self, name: &str) -> Result<i64, AnalysisError> {
        self.attribute(name)
            .and_then(AttributeValue::as_int)
            .ok_or_else(|| self.invalid(name, "expected an integer"))
    }

    /// Reads a numeric attribute, widening integers.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidAttribute`] if it is absent or not numeric.
    pub fn float(&self, name: &str) -> Result<f64, AnalysisError> {
        self.attribute(name)
            .and_then(AttributeValue::as_float)
            .ok_or_else(|| self.invalid(name, "expected a number"))
    }

    /// Reads a boolean attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidAttribute`] if it is absent or not a boolean.
    pub fn bool(&self, name: &str) -> Result<bool, AnalysisError> {
        self.attribute(name)
            .and_then(AttributeValue::as_bool)
            .ok_or_else(|| self.invalid(name, "expected a boolean"))
    }

    /// Reads a string attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidAttribute`] if it is absent or not a string.
    pub fn str(&self, name: &str) -> Result<&str, AnalysisError> {
        self.attribute(name)
            .and_then(AttributeValue::as_str)
            .ok_or_else(|| self.invalid(name, "expected a string"))
    }

    /// Builds an [`AnalysisError::InvalidAttribute`] for this constraint.
    #[must_use]
    pub fn invalid(&self, attribute: &str, reason: impl Into<String>) -> AnalysisError {
        AnalysisError::invalid_attribute(self.kind(), attribute, reason)
    }

    /// Declared order, or the kind's default. `None` runs before any order.
    #[must_use]
    pub const fn order(&self) -> Option<i32> {
        self.order
    }

    /// Declared message, or the kind's default.
    #[must_use]
    pub fn message(&self) -> Option<&Arc<str>> {
        self.message.as_ref()
    }

    /// The constraints this one expands into, in definition order.
    #[must_use]
    pub fn combined(&self) -> &[Arc<Self>] {
        &self.combined
    }

    /// Template variables: every non-reserved attribute.
    pub fn params(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes
            .iter()
            .filter(|(name, _)| !is_reserved(name))
            .map(|(name, value)| (&**name, value))
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("kind", &self.kind())
            .field("attributes", &self.attributes)
            .field("order", &self.order)
            .field("message", &self.message)
            .field("combined", &self.combined)
            .finish()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.kind())?;
        if !self.attributes.is_empty() {
            f.write_str("(")?;
            for (i, (name, value)) in self.attributes.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{name}={value}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Applies a kind's attribute specification to declared attributes.
///
/// Unknown attributes and missing required ones are analysis errors, and the
/// reserved attributes must have the right kind of value.
pub(crate) fn resolve_attributes(
    metadata: &ConstraintMetadata,
    declared: &Attributes,
) -> Result<Attributes, AnalysisError> {
    let kind: &str = metadata.name();

    for (name, value) in declared.iter() {
        match &**name {
            MESSAGE if value.as_str().is_none() => {
                return Err(AnalysisError::invalid_attribute(kind, MESSAGE, "expected a string"));
            }
            ORDER if value.as_int().and_then(|o| i32::try_from(o).ok()).is_none() => {
                return Err(AnalysisError::invalid_attribute(kind, ORDER, "expected a 32-bit integer"));
            }
            MESSAGE | ORDER => {}
            other if metadata.attribute(other).is_none() => {
                return Err(AnalysisError::invalid_attribute(kind, other, "unknown attribute"));
            }
            _ => {}
        }
    }

    let mut resolved = declared.clone();
    for spec in metadata.attributes() {
        if resolved.contains(&spec.name) {
            continue;
        }
        match &spec.default {
            Some(default) => resolved.insert(Arc::clone(&spec.name), default.clone()),
            None => return Err(AnalysisError::missing_attribute(kind, &*spec.name)),
        }
    }
    Ok(resolved)
}

/// Assembles a constraint from resolved attributes and interned combined
/// constraints.
pub(crate) fn assemble(
    metadata: Arc<ConstraintMetadata>,
    attributes: Attributes,
    combined: Vec<Arc<Constraint>>,
) -> Constraint {
    let order = attributes
        .get(ORDER)
        .and_then(AttributeValue::as_int)
        .and_then(|o| i32::try_from(o).ok())
        .or_else(|| metadata.order());
    let message = attributes
        .get(MESSAGE)
        .and_then(AttributeValue::as_str)
        .map(Arc::from)
        .or_else(|| metadata.message().cloned());

    Constraint {
        metadata,
        attributes,
        order,
        message,
        combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::AnyCriterion;
    use crate::foundation::Shape;

    fn size() -> ConstraintMetadata {
        ConstraintMetadata::builder("size")
            .attribute("min", 0)
            .attribute("max", i64::from(i32::MAX))
            .message("size must be between {min} and {max}")
            .factory(factory(|_| true, |_, _| Ok(AnyCriterion::truth(Shape::Reference))))
            .build()
            .unwrap()
    }

    #[test]
    fn defaults_fill_missing_attributes() {
        let declared = ConstraintDeclaration::new("size").attr("max", 3);
        let resolved = resolve_attributes(&size(), declared.attributes()).unwrap();
        assert_eq!(resolved.get("min"), Some(&AttributeValue::Int(0)));
        assert_eq!(resolved.get("max"), Some(&AttributeValue::Int(3)));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let declared = ConstraintDeclaration::new("size").attr("maximum", 3);
        let err = resolve_attributes(&size(), declared.attributes()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::invalid_attribute("size", "maximum", "unknown attribute")
        );
    }

    #[test]
    fn declared_message_and_order_override_defaults() {
        let metadata = Arc::new(size());
        let declared = ConstraintDeclaration::new("size").message("too big").order(4);
        let resolved = resolve_attributes(&metadata, declared.attributes()).unwrap();
        let constraint = assemble(metadata, resolved, Vec::new());

        assert_eq!(constraint.order(), Some(4));
        assert_eq!(constraint.message().map(AsRef::as_ref), Some("too big"));
        let params: Vec<_> = constraint.params().map(|(k, _)| k).collect();
        assert_eq!(params, vec!["max", "min"]);
    }

    #[test]
    fn order_must_fit_in_i32() {
        let declared = ConstraintDeclaration::new("size").attr(ORDER, i64::MAX);
        assert!(resolve_attributes(&size(), declared.attributes()).is_err());
    }
}
