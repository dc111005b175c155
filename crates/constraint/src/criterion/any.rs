//! Shape-tagged criteria
//!
//! Factories produce criteria over either a primitive scalar or a dynamic
//! [`Value`]. [`AnyCriterion`] carries that choice as a tag so combination
//! and wrapping can check shapes before composing, and so a primitive
//! criterion reads its scalar straight out of the value without a boxing
//! step in between.

use std::sync::Arc;

use super::{Criteria, Criterion, Enhancer};
use crate::error::AnalysisError;
use crate::foundation::{Primitive, PrimitiveKind, Shape, ValidationFailure, Value};

/// Applies `$body` to the inner criterion, keeping the variant.
macro_rules! map_any {
    ($any:expr, $c:ident => $body:expr) => {
        match $any {
            AnyCriterion::Bool($c) => AnyCriterion::Bool($body),
            AnyCriterion::Char($c) => AnyCriterion::Char($body),
            AnyCriterion::Byte($c) => AnyCriterion::Byte($body),
            AnyCriterion::Short($c) => AnyCriterion::Short($body),
            AnyCriterion::Int($c) => AnyCriterion::Int($body),
            AnyCriterion::Long($c) => AnyCriterion::Long($body),
            AnyCriterion::Float($c) => AnyCriterion::Float($body),
            AnyCriterion::Double($c) => AnyCriterion::Double($body),
            AnyCriterion::Object($c) => AnyCriterion::Object($body),
        }
    };
}

/// Evaluates `$body` against the inner criterion, whatever its type.
macro_rules! with_any {
    ($any:expr, $c:ident => $body:expr) => {
        match $any {
            AnyCriterion::Bool($c) => $body,
            AnyCriterion::Char($c) => $body,
            AnyCriterion::Byte($c) => $body,
            AnyCriterion::Short($c) => $body,
            AnyCriterion::Int($c) => $body,
            AnyCriterion::Long($c) => $body,
            AnyCriterion::Float($c) => $body,
            AnyCriterion::Double($c) => $body,
            AnyCriterion::Object($c) => $body,
        }
    };
}

// ============================================================================
// ANY CRITERION
// ============================================================================

/// A criterion tagged with the shape of values it tests.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyCriterion {
    Bool(Criterion<bool>),
    Char(Criterion<char>),
    Byte(Criterion<i8>),
    Short(Criterion<i16>),
    Int(Criterion<i32>),
    Long(Criterion<i64>),
    Float(Criterion<f32>),
    Double(Criterion<f64>),
    /// Tests reference values: strings, collections, objects and boxed scalars.
    Object(Criterion<Value>),
}

impl AnyCriterion {
    /// The truth criterion of the given shape.
    #[must_use]
    pub const fn truth(shape: Shape) -> Self {
        match shape {
            Shape::Primitive(PrimitiveKind::Bool) => Self::Bool(Criterion::Truth),
            Shape::Primitive(PrimitiveKind::Char) => Self::Char(Criterion::Truth),
            Shape::Primitive(PrimitiveKind::Byte) => Self::Byte(Criterion::Truth),
            Shape::Primitive(PrimitiveKind::Short) => Self::Short(Criterion::Truth),
            Shape::Primitive(PrimitiveKind::Int) => Self::Int(Criterion::Truth),
            Shape::Primitive(PrimitiveKind::Long) => Self::Long(Criterion::Truth),
            Shape::Primitive(PrimitiveKind::Float) => Self::Float(Criterion::Truth),
            Shape::Primitive(PrimitiveKind::Double) => Self::Double(Criterion::Truth),
            Shape::Reference => Self::Object(Criterion::Truth),
        }
    }

    #[must_use]
    pub const fn shape(&self) -> Shape {
        match self {
            Self::Bool(_) => Shape::Primitive(PrimitiveKind::Bool),
            Self::Char(_) => Shape::Primitive(PrimitiveKind::Char),
            Self::Byte(_) => Shape::Primitive(PrimitiveKind::Byte),
            Self::Short(_) => Shape::Primitive(PrimitiveKind::Short),
            Self::Int(_) => Shape::Primitive(PrimitiveKind::Int),
            Self::Long(_) => Shape::Primitive(PrimitiveKind::Long),
            Self::Float(_) => Shape::Primitive(PrimitiveKind::Float),
            Self::Double(_) => Shape::Primitive(PrimitiveKind::Double),
            Self::Object(_) => Shape::Reference,
        }
    }

    #[must_use]
    pub const fn is_truth(&self) -> bool {
        with_any!(self, c => c.is_truth())
    }

    #[must_use]
    pub fn simplify(self) -> Self {
        map_any!(self, c => c.simplify())
    }

    #[must_use]
    pub fn enhance_failure(self, enhancer: Arc<Enhancer>) -> Self {
        map_any!(self, c => c.enhance_failure(enhancer))
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        with_any!(self, c => c.leaf_count())
    }

    /// Tests a dynamic value against this criterion.
    ///
    /// Primitive criteria accept their own scalar variant and any other
    /// numeric variant that converts without loss of range; everything else
    /// is a `type_mismatch`.
    pub fn validate_value(&self, value: &Value) -> Result<(), ValidationFailure> {
        match self {
            Self::Object(c) => c.validate(value),
            Self::Bool(c) => validate_scalar(c, value),
            Self::Char(c) => validate_scalar(c, value),
            Self::Byte(c) => validate_scalar(c, value),
            Self::Short(c) => validate_scalar(c, value),
            Self::Int(c) => validate_scalar(c, value),
            Self::Long(c) => validate_scalar(c, value),
            Self::Float(c) => validate_scalar(c, value),
            Self::Double(c) => validate_scalar(c, value),
        }
    }

    /// Lifts this criterion to a criterion over dynamic values.
    #[must_use]
    pub fn into_value_criterion(self) -> Criterion<Value> {
        match self {
            Self::Object(c) => c,
            Self::Bool(c) => lift(c),
            Self::Char(c) => lift(c),
            Self::Byte(c) => lift(c),
            Self::Short(c) => lift(c),
            Self::Int(c) => lift(c),
            Self::Long(c) => lift(c),
            Self::Float(c) => lift(c),
            Self::Double(c) => lift(c),
        }
    }
}

fn validate_scalar<P: Primitive>(
    criterion: &Criterion<P>,
    value: &Value,
) -> Result<(), ValidationFailure> {
    match P::from_value(value) {
        Some(scalar) => criterion.validate(&scalar),
        None => Err(ValidationFailure::type_mismatch(P::KIND, value)),
    }
}

fn lift<P: Primitive>(criterion: Criterion<P>) -> Criterion<Value> {
    if criterion.is_truth() {
        return Criterion::Truth;
    }
    Criterion::leaf(move |value: &Value| validate_scalar(&criterion, value))
}

macro_rules! any_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Criterion<$ty>> for AnyCriterion {
                fn from(criterion: Criterion<$ty>) -> Self {
                    Self::$variant(criterion)
                }
            }
        )*
    };
}

any_from! {
    bool => Bool,
    char => Char,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Value => Object,
}

// ============================================================================
// ANY CRITERIA
// ============================================================================

/// Shape-homogeneous aggregate of [`AnyCriterion`]s.
#[derive(Debug, Clone)]
pub struct AnyCriteria {
    shape: Shape,
    inner: AnyCriterion,
}

impl AnyCriteria {
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        let inner = map_any!(AnyCriterion::truth(shape), _c => Criterion::Criteria(Criteria::new()));
        Self { shape, inner }
    }

    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Appends a criterion of the same shape.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ShapeMismatch`] if `criterion` has a different shape.
    pub fn push(&mut self, criterion: AnyCriterion) -> Result<(), AnalysisError> {
        macro_rules! push_same {
            ($($variant:ident),*) => {
                match (&mut self.inner, criterion) {
                    $(
                        (AnyCriterion::$variant(Criterion::Criteria(members)), AnyCriterion::$variant(c)) => {
                            members.push(c);
                            Ok(())
                        }
                    )*
                    (_, other) => Err(AnalysisError::ShapeMismatch {
                        expected: self.shape.to_string(),
                        actual: other.shape().to_string(),
                    }),
                }
            };
        }
        push_same!(Bool, Char, Byte, Short, Int, Long, Float, Double, Object)
    }

    #[must_use]
    pub fn simplify(self) -> AnyCriterion {
        self.inner.simplify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive_int() -> AnyCriterion {
        AnyCriterion::Int(Criterion::leaf(|v: &i32| {
            if *v > 0 {
                Ok(())
            } else {
                Err(ValidationFailure::new("positive", "must be positive", *v))
            }
        }))
    }

    #[test]
    fn truth_keeps_its_shape() {
        let truth = AnyCriterion::truth(Shape::Primitive(PrimitiveKind::Long));
        assert!(truth.is_truth());
        assert_eq!(truth.shape(), Shape::Primitive(PrimitiveKind::Long));
    }

    #[test]
    fn primitive_criterion_accepts_fitting_integrals() {
        let criterion = positive_int();
        assert!(criterion.validate_value(&Value::Int(3)).is_ok());
        assert_eq!(
            criterion.validate_value(&Value::Int(-3)).unwrap_err().code,
            "positive"
        );
        assert!(criterion.validate_value(&Value::Long(3)).is_ok());
        assert_eq!(
            criterion.validate_value(&Value::Long(i64::MAX)).unwrap_err().code,
            "type_mismatch"
        );
        assert_eq!(
            criterion.validate_value(&Value::from("3")).unwrap_err().code,
            "type_mismatch"
        );
    }

    #[test]
    fn lifted_truth_stays_truth() {
        let lifted =
            AnyCriterion::truth(Shape::Primitive(PrimitiveKind::Int)).into_value_criterion();
        assert!(lifted.is_truth());
    }

    #[test]
    fn aggregate_rejects_other_shapes() {
        let mut criteria = AnyCriteria::new(Shape::Primitive(PrimitiveKind::Int));
        criteria.push(positive_int()).unwrap();
        let err = criteria
            .push(AnyCriterion::truth(Shape::Reference))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ShapeMismatch { .. }));
    }

    #[test]
    fn aggregate_simplifies_to_single_member() {
        let leaf = positive_int();
        let mut criteria = AnyCriteria::new(Shape::Primitive(PrimitiveKind::Int));
        criteria
            .push(AnyCriterion::truth(Shape::Primitive(PrimitiveKind::Int)))
            .unwrap();
        criteria.push(leaf.clone()).unwrap();
        assert_eq!(criteria.simplify(), leaf);
    }
}
