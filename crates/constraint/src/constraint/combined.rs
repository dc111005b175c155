//! Combined constraint templates
//!
//! A constraint kind may expand into other constraints. Each expansion is a
//! [`CombinedConstraint`]: the target kind plus, for every attribute of the
//! target, where its value comes from. Literal-only templates are the fixed
//! combinations; pass-through and computed attributes derive the target from
//! the outer constraint's own attributes.
//!
//! ```rust,ignore
//! // range(min, max) = min(value = min) + max(value = max)
//! let range = ConstraintMetadata::builder("range")
//!     .attribute("min", i64::MIN)
//!     .attribute("max", i64::MAX)
//!     .combine(CombinedConstraint::new(min).pass_through("value", "min"))
//!     .combine(CombinedConstraint::new(max).pass_through("value", "max"))
//!     .build()?;
//! ```

use std::fmt;
use std::sync::Arc;

use super::{AttributeValue, Attributes, ConstraintMetadata};
use crate::error::AnalysisError;

/// Derives an attribute value from the outer constraint's attributes.
pub type AttributeFn = dyn Fn(&Attributes) -> Result<AttributeValue, AnalysisError> + Send + Sync;

/// Where one attribute of a combined constraint comes from.
#[derive(Clone)]
pub enum AttributeSource {
    /// A value fixed at definition time.
    Literal(AttributeValue),
    /// The outer constraint's attribute of the given name.
    PassThrough(Arc<str>),
    /// A function of the outer constraint's attributes.
    Computed(Arc<AttributeFn>),
}

impl fmt::Debug for AttributeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::PassThrough(name) => f.debug_tuple("PassThrough").field(name).finish(),
            Self::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

/// A template for one constraint that an outer constraint expands into.
#[derive(Debug, Clone)]
#[must_use = "builder methods must be chained or built"]
pub struct CombinedConstraint {
    target: Arc<ConstraintMetadata>,
    attributes: Vec<(Arc<str>, AttributeSource)>,
}

impl CombinedConstraint {
    pub fn new(target: Arc<ConstraintMetadata>) -> Self {
        Self {
            target,
            attributes: Vec::new(),
        }
    }

    /// Sets a target attribute to a fixed value.
    pub fn literal(self, name: impl Into<Arc<str>>, value: impl Into<AttributeValue>) -> Self {
        self.source(name, AttributeSource::Literal(value.into()))
    }

    /// Copies the outer constraint's `outer` attribute into `name`.
    pub fn pass_through(self, name: impl Into<Arc<str>>, outer: impl Into<Arc<str>>) -> Self {
        self.source(name, AttributeSource::PassThrough(outer.into()))
    }

    /// Computes `name` from the outer constraint's attributes.
    pub fn computed<F>(self, name: impl Into<Arc<str>>, derive: F) -> Self
    where
        F: Fn(&Attributes) -> Result<AttributeValue, AnalysisError> + Send + Sync + 'static,
    {
        self.source(name, AttributeSource::Computed(Arc::new(derive)))
    }

    /// Fixes the relative order of this combined constraint.
    pub fn order(self, order: i32) -> Self {
        self.literal(super::ORDER, order)
    }

    fn source(mut self, name: impl Into<Arc<str>>, source: AttributeSource) -> Self {
        let name = name.into();
        self.attributes.retain(|(n, _)| *n != name);
        self.attributes.push((name, source));
        self
    }

    #[must_use]
    pub const fn target(&self) -> &Arc<ConstraintMetadata> {
        &self.target
    }

    /// True when every attribute is a literal.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.attributes
            .iter()
            .all(|(_, source)| matches!(source, AttributeSource::Literal(_)))
    }

    /// Resolves the target's declared attributes against an outer constraint.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingAttribute`] if a pass-through names an
    /// attribute the outer constraint does not have, or whatever error a
    /// computed attribute reports.
    pub fn instantiate(
        &self,
        outer_kind: &str,
        outer: &Attributes,
    ) -> Result<Attributes, AnalysisError> {
        let mut resolved = Attributes::new();
        for (name, source) in &self.attributes {
            let value = match source {
                AttributeSource::Literal(value) => value.clone(),
                AttributeSource::PassThrough(from) => outer
                    .get(from)
                    .cloned()
                    .ok_or_else(|| AnalysisError::missing_attribute(outer_kind, &**from))?,
                AttributeSource::Computed(derive) => derive(outer)?,
            };
            resolved.insert(Arc::clone(name), value);
        }
        Ok(resolved)
    }
}
