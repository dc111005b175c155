//! Per-node constraint processing

use std::borrow::Cow;
use std::sync::Arc;

use super::Constraint;
use crate::criterion::{AnyCriteria, AnyCriterion, Enhancer};
use crate::error::AnalysisError;
use crate::foundation::ValidationFailure;
use crate::node::ConstrainedNode;

/// Produces the criterion of `constraint` at `node`.
///
/// Combined constraints ordered at or before the constraint's own order run
/// first (ascending, ties in definition order, unordered ones before ordered
/// ones), then the constraint's own factory check, then the remaining combined
/// constraints. The whole unit is simplified, and if the constraint carries a
/// message every failure from the unit gets that template and the
/// constraint's attributes as variables. Without a message, failures pass
/// through untouched for an enclosing constraint to decorate.
///
/// # Errors
///
/// Returns [`AnalysisError::NoApplicableFactory`] when a non-combinator
/// constraint has no factory for the node's type, and propagates factory
/// errors and shape mismatches.
pub fn process(node: &ConstrainedNode, constraint: &Constraint) -> Result<AnyCriterion, AnalysisError> {
    let mut combined: Vec<&Arc<Constraint>> = constraint.combined().iter().collect();
    combined.sort_by_key(|c| c.order());
    let split = combined.partition_point(|c| c.order() <= constraint.order());
    let (before, after) = combined.split_at(split);

    let mut unit = AnyCriteria::new(node.ty().shape());
    for inner in before {
        unit.push(process(node, inner)?)?;
    }
    if !constraint.metadata().is_combinator() {
        unit.push(own_criterion(node, constraint)?)?;
    }
    for inner in after {
        unit.push(process(node, inner)?)?;
    }

    let criterion = unit.simplify();
    Ok(match constraint.message() {
        Some(message) => criterion.enhance_failure(message_enhancer(message, constraint)),
        None => criterion,
    })
}

fn own_criterion(node: &ConstrainedNode, constraint: &Constraint) -> Result<AnyCriterion, AnalysisError> {
    let factory = constraint
        .metadata()
        .factory_for(node.ty())
        .ok_or_else(|| AnalysisError::NoApplicableFactory {
            location: node.location().to_string(),
            constraint: constraint.to_string(),
            ty: node.ty().to_string(),
        })?;

    let criterion = factory.produce(node, constraint)?;
    if criterion.shape() != node.ty().shape() {
        return Err(AnalysisError::ShapeMismatch {
            expected: node.ty().shape().to_string(),
            actual: criterion.shape().to_string(),
        });
    }
    Ok(criterion)
}

/// Replaces the template and sets the constraint's attributes as variables.
///
/// Enhancers run innermost first, so an enclosing constraint's message and
/// variables win over those of the constraints it combines.
fn message_enhancer(message: &Arc<str>, constraint: &Constraint) -> Arc<Enhancer> {
    let template: Cow<'static, str> = Cow::Owned(message.to_string());
    let params: Vec<(Cow<'static, str>, Cow<'static, str>)> = constraint
        .params()
        .map(|(name, value)| (Cow::Owned(name.to_owned()), Cow::Owned(value.to_string())))
        .collect();

    Arc::new(move |failure: ValidationFailure| {
        params
            .iter()
            .fold(failure.with_template(template.clone()), |failure, (k, v)| {
                failure.with_param(k.clone(), v.clone())
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::constraint::{
        CombinedConstraint, ConstraintCache, ConstraintDeclaration, ConstraintMetadata,
        CriterionFactory, factory,
    };
    use crate::criterion::Criterion;
    use crate::foundation::{PrimitiveKind, TypeDescriptor, Value};
    use crate::node::{ConstrainedNode, Location};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording_factory(name: &str, log: &Log) -> Arc<dyn CriterionFactory> {
        let code = name.to_owned();
        let log = Arc::clone(log);
        factory(
            |ty| matches!(ty, TypeDescriptor::Primitive(PrimitiveKind::Int)),
            move |_, _| {
                let code = code.clone();
                let log = Arc::clone(&log);
                Ok(AnyCriterion::Int(Criterion::leaf(move |v: &i32| {
                    log.lock().unwrap().push(code.clone());
                    if *v >= 0 {
                        Ok(())
                    } else {
                        Err(ValidationFailure::new(code.clone(), "negative", *v))
                    }
                })))
            },
        )
    }

    fn recording(name: &str, log: &Log) -> Arc<ConstraintMetadata> {
        Arc::new(
            ConstraintMetadata::builder(name)
                .factory(recording_factory(name, log))
                .build()
                .unwrap(),
        )
    }

    fn int_node() -> ConstrainedNode {
        ConstrainedNode::leaf(
            Location::root("n"),
            TypeDescriptor::Primitive(PrimitiveKind::Int),
        )
    }

    #[test]
    fn combined_run_around_own_check_by_order() {
        let log: Log = Arc::default();
        let early = recording("early", &log);
        let late = recording("late", &log);
        let combo = Arc::new(
            ConstraintMetadata::builder("combo")
                .order(5)
                .combine(CombinedConstraint::new(Arc::clone(&late)).order(10))
                .combine(CombinedConstraint::new(Arc::clone(&early)).order(0))
                .factory(recording_factory("own", &log))
                .build()
                .unwrap(),
        );

        let cache = ConstraintCache::new();
        let constraint = cache.intern(&combo, &Default::default()).unwrap();
        let criterion = process(&int_node(), &constraint).unwrap();
        criterion.validate_value(&Value::Int(1)).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["early", "own", "late"]);
    }

    #[test]
    fn message_decorates_the_whole_unit() {
        let log: Log = Arc::default();
        let part = recording("part", &log);
        let combo = Arc::new(
            ConstraintMetadata::builder("combo")
                .attribute("limit", 7)
                .message("combo failed under {limit}")
                .combine(CombinedConstraint::new(part))
                .build()
                .unwrap(),
        );

        let cache = ConstraintCache::new();
        let constraint = cache.intern(&combo, &Default::default()).unwrap();
        let failure = process(&int_node(), &constraint)
            .unwrap()
            .validate_value(&Value::Int(-1))
            .unwrap_err();

        assert_eq!(failure.code, "part");
        assert_eq!(failure.template, "combo failed under {limit}");
        assert_eq!(failure.param("limit"), Some("7"));
    }

    #[test]
    fn missing_factory_names_location_and_type() {
        let log: Log = Arc::default();
        let metadata = recording("only_int", &log);
        let cache = ConstraintCache::new();
        let constraint = cache
            .intern(&metadata, ConstraintDeclaration::new("only_int").attributes())
            .unwrap();
        let node = ConstrainedNode::leaf(Location::root("n"), TypeDescriptor::String);

        let err = process(&node, &constraint).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::NoApplicableFactory {
                location: "n".into(),
                constraint: "@only_int".into(),
                ty: "String".into(),
            }
        );
    }
}
