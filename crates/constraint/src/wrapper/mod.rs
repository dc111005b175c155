//! Criterion wrappers
//!
//! A [`CriterionWrapper`] lifts a criterion defined over a contained shape
//! into a criterion over the containing value, recording an [`Indicator`] on
//! every failure that passes outward:
//!
//! | wrapper            | containing value      | indicator on failure   |
//! |--------------------|-----------------------|------------------------|
//! | `Property`         | object                | property name          |
//! | `ArrayElement`     | array                 | element index          |
//! | `IterableElement`  | list / set            | element index          |
//! | `MapKey`           | map                   | the failing key        |
//! | `MapValue`         | map                   | the failing value's key |
//! | `OptionalValue`    | optional              | none                   |
//! | `Extracted`        | extractor's container | none                   |
//!
//! Elements are checked in sequence order and the first failure wins, so the
//! reported index is always the lowest failing one. A null container passes:
//! null checks belong to the container's own constraints.
//!
//! Generic type arguments are always reference types, so only `Property`,
//! `ArrayElement` and `Extracted` accept primitive criteria. Wrapping any
//! other shape is an [`AnalysisError::UnsupportedShape`].

mod accessor;
mod extractor;

use std::fmt;
use std::sync::Arc;

pub use accessor::{Getter, PropertyAccessor, PropertySource};
pub use extractor::ValueExtractor;

use crate::criterion::{AnyCriterion, Criterion};
use crate::error::AnalysisError;
use crate::foundation::value::NULL;
use crate::foundation::{Indicator, Shape, ValidationFailure, ValidationResult, Value};

/// How a child node's criterion projects onto its parent's value.
#[derive(Debug, Clone)]
pub enum CriterionWrapper {
    Property(PropertyAccessor),
    ArrayElement,
    IterableElement,
    MapKey,
    MapValue,
    OptionalValue,
    Extracted(Arc<ValueExtractor>),
}

impl CriterionWrapper {
    /// Whether this wrapper can carry criteria of `shape`.
    #[must_use]
    pub const fn supports(&self, shape: Shape) -> bool {
        match self {
            Self::Property(_) | Self::ArrayElement | Self::Extracted(_) => true,
            Self::IterableElement | Self::MapKey | Self::MapValue | Self::OptionalValue => {
                matches!(shape, Shape::Reference)
            }
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Property(_) => "property",
            Self::ArrayElement => "array element",
            Self::IterableElement => "iterable element",
            Self::MapKey => "map key",
            Self::MapValue => "map value",
            Self::OptionalValue => "optional value",
            Self::Extracted(_) => "extracted value",
        }
    }

    /// Lifts `inner` to a criterion over the containing value.
    ///
    /// The truth criterion stays truth.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnsupportedShape`] if this wrapper cannot
    /// carry `inner`'s shape.
    pub fn wrap(&self, inner: AnyCriterion) -> Result<Criterion<Value>, AnalysisError> {
        let shape = inner.shape();
        if !self.supports(shape) {
            return Err(AnalysisError::UnsupportedShape {
                wrapper: self.name().to_owned(),
                shape: shape.to_string(),
            });
        }
        if inner.is_truth() {
            return Ok(Criterion::Truth);
        }

        let inner = inner.into_value_criterion();
        Ok(match self {
            Self::Property(accessor) => wrap_property(accessor.clone(), inner),
            Self::ArrayElement => wrap_elements(inner, "array"),
            Self::IterableElement => wrap_elements(inner, "iterable"),
            Self::MapKey => wrap_entries(inner, entry_key),
            Self::MapValue => wrap_entries(inner, entry_value),
            Self::OptionalValue => wrap_optional(inner),
            Self::Extracted(extractor) => wrap_extracted(Arc::clone(extractor), inner, shape),
        })
    }
}

impl fmt::Display for CriterionWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(accessor) => write!(f, "property '{}'", accessor.name()),
            Self::Extracted(extractor) => write!(f, "extracted '{}'", extractor.name()),
            other => f.write_str(other.name()),
        }
    }
}

// ============================================================================
// PROJECTIONS
// ============================================================================

fn wrap_property(accessor: PropertyAccessor, inner: Criterion<Value>) -> Criterion<Value> {
    Criterion::leaf(move |value: &Value| match value {
        Value::Null => Ok(()),
        Value::Object(object) => inner
            .validate(&accessor.get(object))
            .map_err(|f| f.indicated(Indicator::Property(Arc::clone(accessor.name())))),
        other => Err(ValidationFailure::type_mismatch("object", other)),
    })
}

fn wrap_elements(inner: Criterion<Value>, expected: &'static str) -> Criterion<Value> {
    Criterion::leaf(move |value: &Value| match value {
        Value::Null => Ok(()),
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                inner
                    .validate(item)
                    .map_err(|f| f.indicated(Indicator::Index(index)))?;
            }
            Ok(())
        }
        other => Err(ValidationFailure::type_mismatch(expected, other)),
    })
}

fn entry_key<'a>(key: &'a Value, _: &'a Value) -> &'a Value {
    key
}

fn entry_value<'a>(_: &'a Value, value: &'a Value) -> &'a Value {
    value
}

fn wrap_entries(
    inner: Criterion<Value>,
    select: for<'a> fn(&'a Value, &'a Value) -> &'a Value,
) -> Criterion<Value> {
    Criterion::leaf(move |value: &Value| -> ValidationResult {
        match value {
            Value::Null => Ok(()),
            Value::Map(entries) => {
                for (key, entry) in entries {
                    // Map entries have no position, so both sides report the key.
                    inner
                        .validate(select(key, entry))
                        .map_err(|f| f.indicated(Indicator::Key(key.clone())))?;
                }
                Ok(())
            }
            other => Err(ValidationFailure::type_mismatch("map", other)),
        }
    })
}

fn wrap_optional(inner: Criterion<Value>) -> Criterion<Value> {
    Criterion::leaf(move |value: &Value| match value {
        Value::Optional(Some(present)) => inner.validate(present),
        Value::Optional(None) | Value::Null => inner.validate(&NULL),
        other => inner.validate(other),
    })
}

fn wrap_extracted(
    extractor: Arc<ValueExtractor>,
    inner: Criterion<Value>,
    shape: Shape,
) -> Criterion<Value> {
    Criterion::leaf(move |value: &Value| match extractor.extract(value) {
        Some(extracted) => inner.validate(extracted),
        // An absent primitive has nothing to check.
        None if shape.is_primitive() => Ok(()),
        None => inner.validate(&NULL),
    })
}
