//! Numeric constraints: `positive`, `min`, `max` and the `range` combinator
//!
//! On primitive positions the criterion reads the scalar directly; on boxed
//! positions it tests the dynamic value and lets null pass.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::Catalog;
use crate::constraint::{
    AttributeValue, CombinedConstraint, Constraint, ConstraintMetadata, factory,
};
use crate::criterion::{AnyCriterion, Criterion};
use crate::error::AnalysisError;
use crate::foundation::{Primitive, PrimitiveKind, TypeDescriptor, ValidationFailure, Value};
use crate::node::ConstrainedNode;

// ============================================================================
// NUMBER
// ============================================================================

/// A numeric value compared across integer and floating kinds.
///
/// Integers compare exactly with integers; any comparison involving a float
/// is done in `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Reads a numeric value; `None` for every non-numeric variant.
    #[must_use]
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Byte(v) => Some(Self::Int(i64::from(*v))),
            Value::Short(v) => Some(Self::Int(i64::from(*v))),
            Value::Int(v) => Some(Self::Int(i64::from(*v))),
            Value::Long(v) => Some(Self::Int(*v)),
            Value::Float(v) => Some(Self::Float(f64::from(*v))),
            Value::Double(v) => Some(Self::Float(*v)),
            _ => None,
        }
    }

    /// Reads a numeric attribute.
    #[must_use]
    pub const fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Int(v) => Some(Self::Int(*v)),
            AttributeValue::Float(v) => Some(Self::Float(*v)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    /// Compares two numbers; `None` when either side is NaN.
    #[must_use]
    pub fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

macro_rules! number_from {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for Number {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

number_from!(i8 => Int, i16 => Int, i32 => Int, i64 => Int, f32 => Float, f64 => Float);

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

// ============================================================================
// NUMERIC CRITERION
// ============================================================================

pub(super) type NumberTest = dyn Fn(Number) -> bool + Send + Sync;

/// Code, template and parameters of the failure a numeric check reports.
#[derive(Clone)]
pub(super) struct Failing {
    code: Arc<str>,
    template: &'static str,
    params: Vec<(&'static str, String)>,
}

impl Failing {
    pub(super) fn new(constraint: &Constraint, template: &'static str) -> Self {
        Self {
            code: Arc::from(constraint.kind()),
            template,
            params: Vec::new(),
        }
    }

    pub(super) fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    pub(super) fn fail(&self, value: impl Into<Value>) -> ValidationFailure {
        self.params.iter().fold(
            ValidationFailure::new(self.code.to_string(), self.template, value),
            |failure, (key, value)| failure.with_param(*key, value.clone()),
        )
    }
}

fn scalar<P>(test: Arc<NumberTest>, failing: Failing) -> Criterion<P>
where
    P: Primitive + Into<Number>,
{
    Criterion::leaf(move |v: &P| {
        if test((*v).into()) {
            Ok(())
        } else {
            Err(failing.fail(*v))
        }
    })
}

fn boxed(kind: PrimitiveKind, test: Arc<NumberTest>, failing: Failing) -> Criterion<Value> {
    Criterion::leaf(move |value: &Value| {
        if value.is_null() {
            return Ok(());
        }
        match Number::of(value) {
            Some(n) if test(n) => Ok(()),
            Some(_) => Err(failing.fail(value.clone())),
            None => Err(ValidationFailure::type_mismatch(kind, value)),
        }
    })
}

/// Builds a numeric check for the node's type, primitive or boxed.
pub(super) fn numeric_criterion(
    node: &ConstrainedNode,
    test: Arc<NumberTest>,
    failing: Failing,
) -> Result<AnyCriterion, AnalysisError> {
    let not_numeric = || AnalysisError::ShapeMismatch {
        expected: "numeric type".to_owned(),
        actual: node.ty().to_string(),
    };
    Ok(match node.ty() {
        TypeDescriptor::Primitive(kind) => match kind {
            PrimitiveKind::Byte => AnyCriterion::Byte(scalar(test, failing)),
            PrimitiveKind::Short => AnyCriterion::Short(scalar(test, failing)),
            PrimitiveKind::Int => AnyCriterion::Int(scalar(test, failing)),
            PrimitiveKind::Long => AnyCriterion::Long(scalar(test, failing)),
            PrimitiveKind::Float => AnyCriterion::Float(scalar(test, failing)),
            PrimitiveKind::Double => AnyCriterion::Double(scalar(test, failing)),
            PrimitiveKind::Bool | PrimitiveKind::Char => return Err(not_numeric()),
        },
        TypeDescriptor::Boxed(kind) if kind.is_numeric() => {
            AnyCriterion::Object(boxed(*kind, test, failing))
        }
        _ => return Err(not_numeric()),
    })
}

/// A check comparing the value against a bound attribute.
fn bound(
    node: &ConstrainedNode,
    constraint: &Constraint,
    template: &'static str,
    accept: fn(Ordering) -> bool,
) -> Result<AnyCriterion, AnalysisError> {
    let bound = constraint
        .attribute("value")
        .and_then(Number::from_attribute)
        .ok_or_else(|| constraint.invalid("value", "expected a number"))?;
    let failing = Failing::new(constraint, template).param("value", bound);
    numeric_criterion(
        node,
        Arc::new(move |n: Number| n.compare(bound).is_some_and(accept)),
        failing,
    )
}

// ============================================================================
// REGISTRATION
// ============================================================================

pub(super) fn register(catalog: &mut Catalog) -> Result<(), AnalysisError> {
    catalog.register(
        ConstraintMetadata::builder("positive")
            .message("must be greater than 0")
            .factory(factory(TypeDescriptor::is_numeric, |node, constraint| {
                let failing = Failing::new(constraint, "must be greater than 0");
                numeric_criterion(
                    node,
                    Arc::new(|n: Number| n.compare(Number::Int(0)) == Some(Ordering::Greater)),
                    failing,
                )
            }))
            .build()?,
    )?;

    let min = catalog.register(
        ConstraintMetadata::builder("min")
            .required("value")
            .message("must be greater than or equal to {value}")
            .factory(factory(TypeDescriptor::is_numeric, |node, constraint| {
                bound(
                    node,
                    constraint,
                    "must be greater than or equal to {value}",
                    Ordering::is_ge,
                )
            }))
            .build()?,
    )?;

    let max = catalog.register(
        ConstraintMetadata::builder("max")
            .required("value")
            .message("must be less than or equal to {value}")
            .factory(factory(TypeDescriptor::is_numeric, |node, constraint| {
                bound(
                    node,
                    constraint,
                    "must be less than or equal to {value}",
                    Ordering::is_le,
                )
            }))
            .build()?,
    )?;

    catalog.register(
        ConstraintMetadata::builder("range")
            .attribute("min", i64::MIN)
            .attribute("max", i64::MAX)
            .message("must be between {min} and {max}")
            .combine(CombinedConstraint::new(min).pass_through("value", "min"))
            .combine(CombinedConstraint::new(max).pass_through("value", "max"))
            .build()?,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintCache, ConstraintDeclaration, process};
    use crate::node::Location;
    use pretty_assertions::assert_eq;

    fn criterion(ty: TypeDescriptor, declaration: ConstraintDeclaration) -> AnyCriterion {
        let mut catalog = Catalog::new();
        register(&mut catalog).unwrap();
        let metadata = catalog.resolve(declaration.kind()).unwrap();
        let constraint = ConstraintCache::new()
            .intern(metadata, declaration.attributes())
            .unwrap();
        let node = ConstrainedNode::leaf(Location::root("n"), ty);
        process(&node, &constraint).unwrap()
    }

    #[test]
    fn integers_compare_exactly() {
        let big = Number::Int(i64::MAX);
        assert_eq!(big.compare(Number::Int(i64::MAX - 1)), Some(Ordering::Greater));
        assert_eq!(Number::Int(1).compare(Number::Float(1.5)), Some(Ordering::Less));
        assert_eq!(Number::Float(f64::NAN).compare(Number::Int(0)), None);
    }

    #[test]
    fn positive_on_a_primitive_reads_the_scalar() {
        let positive = criterion(
            TypeDescriptor::Primitive(PrimitiveKind::Int),
            ConstraintDeclaration::new("positive"),
        );
        let AnyCriterion::Int(check) = &positive else {
            panic!("expected an int criterion, got {positive:?}");
        };
        assert!(check.validate(&3).is_ok());
        let failure = check.validate(&0).unwrap_err();
        assert_eq!(failure.code, "positive");
        assert_eq!(failure.value, Value::Int(0));
    }

    #[test]
    fn boxed_null_passes() {
        let positive = criterion(
            TypeDescriptor::Boxed(PrimitiveKind::Long),
            ConstraintDeclaration::new("positive"),
        );
        assert!(positive.validate_value(&Value::Null).is_ok());
        assert!(positive.validate_value(&Value::Long(-1)).is_err());
        let mismatch = positive.validate_value(&Value::from("1")).unwrap_err();
        assert_eq!(mismatch.code, "type_mismatch");
    }

    #[test]
    fn range_runs_min_then_max_with_one_message() {
        let range = criterion(
            TypeDescriptor::Primitive(PrimitiveKind::Long),
            ConstraintDeclaration::new("range").attr("min", 1).attr("max", 10),
        );
        assert!(range.validate_value(&Value::Long(5)).is_ok());

        let low = range.validate_value(&Value::Long(0)).unwrap_err();
        assert_eq!(low.code, "min");
        assert_eq!(low.interpolate(), "must be between 1 and 10");

        let high = range.validate_value(&Value::Long(11)).unwrap_err();
        assert_eq!(high.code, "max");
    }

    #[test]
    fn float_bounds_apply_to_integers() {
        let min = criterion(
            TypeDescriptor::Primitive(PrimitiveKind::Int),
            ConstraintDeclaration::new("min").attr("value", 1.5),
        );
        assert!(min.validate_value(&Value::Int(2)).is_ok());
        assert!(min.validate_value(&Value::Int(1)).is_err());
    }
}
