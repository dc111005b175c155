//! Constraint kinds and their criterion factories
//!
//! [`ConstraintMetadata`] is resolved once per constraint kind at catalog
//! registration. It carries the default order and message, the attribute
//! specification, the criterion factories tried in declaration order, and the
//! combined constraints the kind expands into.
//!
//! A kind without factories is a *combinator*: it exists only to bundle or
//! derive other constraints.
//!
//! ```rust,ignore
//! use nebula_constraint::constraint::{ConstraintMetadata, factory};
//!
//! let even = ConstraintMetadata::builder("even")
//!     .message("must be even")
//!     .factory(factory(
//!         |ty| matches!(ty, TypeDescriptor::Primitive(PrimitiveKind::Int)),
//!         |_node, _constraint| Ok(AnyCriterion::Int(Criterion::leaf(|v: &i32| {
//!             if v % 2 == 0 { Ok(()) } else { Err(ValidationFailure::new("even", "must be even", *v)) }
//!         }))),
//!     ))
//!     .build()?;
//! ```

use std::fmt;
use std::sync::Arc;

use super::{AttributeValue, CombinedConstraint, Constraint};
use crate::criterion::AnyCriterion;
use crate::error::AnalysisError;
use crate::foundation::TypeDescriptor;
use crate::node::ConstrainedNode;

// ============================================================================
// CRITERION FACTORY
// ============================================================================

/// Produces the criterion of one constraint for the types it applies to.
pub trait CriterionFactory: Send + Sync {
    /// Whether this factory can produce a criterion for values of `ty`.
    fn applies_to(&self, ty: &TypeDescriptor) -> bool;

    /// Produces the criterion for `constraint` at `node`.
    ///
    /// The shape of the result must match `node.ty.shape()`.
    ///
    /// # Errors
    ///
    /// Returns an [`AnalysisError`] when the constraint's attributes cannot be
    /// turned into a check, e.g. a malformed expression.
    fn produce(
        &self,
        node: &ConstrainedNode,
        constraint: &Constraint,
    ) -> Result<AnyCriterion, AnalysisError>;
}

/// A [`CriterionFactory`] built from two closures.
pub struct FnFactory<A, P> {
    applies: A,
    produce: P,
}

impl<A, P> CriterionFactory for FnFactory<A, P>
where
    A: Fn(&TypeDescriptor) -> bool + Send + Sync,
    P: Fn(&ConstrainedNode, &Constraint) -> Result<AnyCriterion, AnalysisError> + Send + Sync,
{
    fn applies_to(&self, ty: &TypeDescriptor) -> bool {
        (self.applies)(ty)
    }

    fn produce(
        &self,
        node: &ConstrainedNode,
        constraint: &Constraint,
    ) -> Result<AnyCriterion, AnalysisError> {
        (self.produce)(node, constraint)
    }
}

/// Creates a factory from an applicability predicate and a producer.
pub fn factory<A, P>(applies: A, produce: P) -> Arc<dyn CriterionFactory>
where
    A: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    P: Fn(&ConstrainedNode, &Constraint) -> Result<AnyCriterion, AnalysisError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnFactory { applies, produce })
}

// ============================================================================
// ATTRIBUTE SPEC
// ============================================================================

/// Declared attribute of a constraint kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: Arc<str>,
    /// Used when the declaration does not set the attribute.
    pub default: Option<AttributeValue>,
}

impl AttributeSpec {
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

// ============================================================================
// CONSTRAINT METADATA
// ============================================================================

/// Everything the engine knows about one constraint kind.
pub struct ConstraintMetadata {
    name: Arc<str>,
    order: Option<i32>,
    message: Option<Arc<str>>,
    attributes: Vec<AttributeSpec>,
    factories: Vec<Arc<dyn CriterionFactory>>,
    combined: Vec<CombinedConstraint>,
}

impl ConstraintMetadata {
    pub fn builder(name: impl Into<Arc<str>>) -> ConstraintMetadataBuilder {
        ConstraintMetadataBuilder {
            name: name.into(),
            order: None,
            message: None,
            attributes: Vec::new(),
            factories: Vec::new(),
            combined: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Default execution order, overridable per declaration.
    #[must_use]
    pub const fn order(&self) -> Option<i32> {
        self.order
    }

    /// Default message template, overridable per declaration.
    #[must_use]
    pub fn message(&self) -> Option<&Arc<str>> {
        self.message.as_ref()
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|spec| &*spec.name == name)
    }

    #[must_use]
    pub fn combined(&self) -> &[CombinedConstraint] {
        &self.combined
    }

    /// True for kinds without criterion factories of their own.
    #[must_use]
    pub fn is_combinator(&self) -> bool {
        self.factories.is_empty()
    }

    /// The first factory, in declaration order, that applies to `ty`.
    #[must_use]
    pub fn factory_for(&self, ty: &TypeDescriptor) -> Option<&Arc<dyn CriterionFactory>> {
        self.factories.iter().find(|f| f.applies_to(ty))
    }

    /// Whether a constraint of this kind can be placed directly on `ty`.
    ///
    /// A combinator applies when every constraint it combines applies.
    #[must_use]
    pub fn applies_to(&self, ty: &TypeDescriptor) -> bool {
        if self.is_combinator() {
            self.combined.iter().all(|c| c.target().applies_to(ty))
        } else {
            self.factory_for(ty).is_some()
        }
    }
}

impl fmt::Debug for ConstraintMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintMetadata")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("message", &self.message)
            .field("attributes", &self.attributes)
            .field("factories", &self.factories.len())
            .field("combined", &self.combined)
            .finish()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builder for [`ConstraintMetadata`].
#[must_use = "builder methods must be chained or built"]
pub struct ConstraintMetadataBuilder {
    name: Arc<str>,
    order: Option<i32>,
    message: Option<Arc<str>>,
    attributes: Vec<AttributeSpec>,
    factories: Vec<Arc<dyn CriterionFactory>>,
    combined: Vec<CombinedConstraint>,
}

impl ConstraintMetadataBuilder {
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Declares an optional attribute with a default value.
    pub fn attribute(mut self, name: impl Into<Arc<str>>, default: impl Into<AttributeValue>) -> Self {
        self.attributes.push(AttributeSpec {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    /// Declares an attribute every declaration must set.
    pub fn required(mut self, name: impl Into<Arc<str>>) -> Self {
        self.attributes.push(AttributeSpec {
            name: name.into(),
            default: None,
        });
        self
    }

    pub fn factory(mut self, factory: Arc<dyn CriterionFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn combine(mut self, combined: CombinedConstraint) -> Self {
        self.combined.push(combined);
        self
    }

    /// Finishes the kind.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidDefinition`] if the kind has neither
    /// factories nor combined constraints, declares an attribute twice, or
    /// declares one of the reserved `message` / `order` attributes.
    pub fn build(self) -> Result<ConstraintMetadata, AnalysisError> {
        if self.factories.is_empty() && self.combined.is_empty() {
            return Err(AnalysisError::invalid_definition(
                &*self.name,
                "a constraint needs a criterion factory or combined constraints",
            ));
        }

        for (i, spec) in self.attributes.iter().enumerate() {
            if super::is_reserved(&spec.name) {
                return Err(AnalysisError::invalid_definition(
                    &*self.name,
                    format!("attribute '{}' is reserved", spec.name),
                ));
            }
            if self.attributes[..i].iter().any(|s| s.name == spec.name) {
                return Err(AnalysisError::invalid_definition(
                    &*self.name,
                    format!("attribute '{}' is declared twice", spec.name),
                ));
            }
        }

        Ok(ConstraintMetadata {
            name: self.name,
            order: self.order,
            message: self.message,
            attributes: self.attributes,
            factories: self.factories,
            combined: self.combined,
        })
    }
}
