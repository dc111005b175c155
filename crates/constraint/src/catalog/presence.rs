//! `not_null` and the `not_empty` combinator

use std::sync::Arc;

use super::Catalog;
use crate::constraint::{CombinedConstraint, ConstraintMetadata, factory};
use crate::criterion::{AnyCriterion, Criterion};
use crate::error::AnalysisError;
use crate::foundation::{TypeDescriptor, ValidationFailure, Value};

pub(super) fn register(catalog: &mut Catalog) -> Result<(), AnalysisError> {
    let not_null = catalog.register(
        ConstraintMetadata::builder("not_null")
            .message("must not be null")
            .factory(factory(TypeDescriptor::is_reference, |_, constraint| {
                let code = constraint.kind().to_owned();
                Ok(AnyCriterion::Object(Criterion::leaf(move |value: &Value| {
                    if value.is_null() {
                        Err(ValidationFailure::new(code.clone(), "must not be null", Value::Null))
                    } else {
                        Ok(())
                    }
                })))
            }))
            .build()?,
    )?;

    let size = Arc::clone(catalog.resolve("size")?);
    catalog.register(
        ConstraintMetadata::builder("not_empty")
            .message("must not be empty")
            .combine(CombinedConstraint::new(not_null))
            .combine(CombinedConstraint::new(size).literal("min", 1))
            .build()?,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::size;
    use crate::constraint::{ConstraintCache, ConstraintDeclaration, process};
    use crate::foundation::PrimitiveKind;
    use crate::node::{ConstrainedNode, Location};
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        size::register(&mut catalog).unwrap();
        register(&mut catalog).unwrap();
        catalog
    }

    fn criterion(kind: &str, ty: TypeDescriptor) -> Result<AnyCriterion, AnalysisError> {
        let catalog = catalog();
        let declaration = ConstraintDeclaration::new(kind);
        let constraint = ConstraintCache::new()
            .intern(catalog.resolve(kind)?, declaration.attributes())?;
        process(&ConstrainedNode::leaf(Location::root("p"), ty), &constraint)
    }

    #[test]
    fn not_null_rejects_only_null() {
        let not_null = criterion("not_null", TypeDescriptor::Any).unwrap();
        assert!(not_null.validate_value(&Value::from("")).is_ok());
        assert_eq!(not_null.validate_value(&Value::Null).unwrap_err().code, "not_null");
    }

    #[test]
    fn not_null_does_not_apply_to_primitives() {
        let err = criterion("not_null", TypeDescriptor::Primitive(PrimitiveKind::Int)).unwrap_err();
        assert_eq!(err.code(), "no_applicable_factory");
    }

    #[test]
    fn not_empty_reports_one_message_for_both_checks() {
        let not_empty = criterion("not_empty", TypeDescriptor::String).unwrap();
        assert!(not_empty.validate_value(&Value::from("x")).is_ok());

        let null = not_empty.validate_value(&Value::Null).unwrap_err();
        assert_eq!(null.code, "not_null");
        assert_eq!(null.interpolate(), "must not be empty");

        let empty = not_empty.validate_value(&Value::from("")).unwrap_err();
        assert_eq!(empty.code, "size");
        assert_eq!(empty.interpolate(), "must not be empty");
    }

    #[test]
    fn not_empty_applies_only_to_sized_types() {
        let catalog = catalog();
        let not_empty = catalog.resolve("not_empty").unwrap();
        assert!(not_empty.applies_to(&TypeDescriptor::list(TypeDescriptor::Any)));
        assert!(!not_empty.applies_to(&TypeDescriptor::Any));
    }
}
