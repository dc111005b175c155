//! `size`: bounds on the length of strings and collections

use super::Catalog;
use super::numeric::Failing;
use crate::constraint::{Constraint, ConstraintMetadata, factory};
use crate::criterion::{AnyCriterion, Criterion};
use crate::error::AnalysisError;
use crate::foundation::{TypeDescriptor, ValidationFailure, Value};
use crate::node::ConstrainedNode;

const TEMPLATE: &str = "size must be between {min} and {max}";

fn size_criterion(
    node: &ConstrainedNode,
    constraint: &Constraint,
) -> Result<AnyCriterion, AnalysisError> {
    let min = constraint.int("min")?;
    let max = constraint.int("max")?;
    if min < 0 {
        return Err(constraint.invalid("min", "must not be negative"));
    }
    if max < min {
        return Err(constraint.invalid("max", "must not be less than min"));
    }

    let failing = Failing::new(constraint, TEMPLATE)
        .param("min", min)
        .param("max", max);
    let ty = node.ty().clone();
    Ok(AnyCriterion::Object(Criterion::leaf(move |value: &Value| {
        if value.is_null() {
            return Ok(());
        }
        let Some(size) = value.size() else {
            return Err(ValidationFailure::type_mismatch(&ty, value));
        };
        let size = i64::try_from(size).unwrap_or(i64::MAX);
        if (min..=max).contains(&size) {
            Ok(())
        } else {
            Err(failing.fail(value.clone()).with_param("size", size.to_string()))
        }
    })))
}

pub(super) fn register(catalog: &mut Catalog) -> Result<(), AnalysisError> {
    catalog.register(
        ConstraintMetadata::builder("size")
            .attribute("min", 0)
            .attribute("max", i64::from(i32::MAX))
            .message(TEMPLATE)
            .factory(factory(TypeDescriptor::is_sized, size_criterion))
            .build()?,
    )?;
    Ok(())
}
