//! End-to-end tests: schemas in, compiled validators out.

#![cfg(feature = "builtin")]

use std::sync::Arc;

use nebula_constraint::prelude::*;
use pretty_assertions::assert_eq;

fn engine() -> ValidationEngine {
    ValidationEngine::builder()
        .catalog(Catalog::builtin().unwrap())
        .build()
        .unwrap()
}

fn long() -> TypeDescriptor {
    TypeDescriptor::Boxed(PrimitiveKind::Long)
}

fn positive() -> ConstraintDeclaration {
    ConstraintDeclaration::new("positive")
}

// ============================================================================
// TYPE ROOTS
// ============================================================================

#[test]
fn positive_scores_of_at_most_three() {
    let scores = AnnotatedType::new(TypeDescriptor::list(
        AnnotatedType::new(long()).constrained(positive()),
    ))
    .constrained(ConstraintDeclaration::new("size").attr("max", 3));
    let validator = engine().validator_for_type(&scores).unwrap();

    assert!(validator.validate(&Value::list([1i64, 2, 3])).is_ok());
    assert!(validator.validate(&Value::Null).is_ok());

    let element = validator.validate(&Value::list([1i64, -2, 3])).unwrap_err();
    assert_eq!(element.code, "positive");
    assert_eq!(element.path_string(), "[1]");
    assert_eq!(element.value, Value::Long(-2));

    let size = validator.validate(&Value::list([1i64, 2, 3, 4])).unwrap_err();
    assert_eq!(size.interpolate(), "size must be between 0 and 3");
    assert_eq!(size.param("size"), Some("4"));
}

#[test]
fn null_elements_pass_boxed_checks() {
    let ty = AnnotatedType::new(TypeDescriptor::list(
        AnnotatedType::new(long()).constrained(positive()),
    ));
    let validator = engine().validator_for_type(&ty).unwrap();
    assert!(validator.validate(&Value::list([Value::Null, Value::Long(1)])).is_ok());
}

#[test]
fn optional_int_is_checked_through_its_extractor() {
    let ty = AnnotatedType::new(TypeDescriptor::OptionalPrimitive(PrimitiveKind::Int))
        .constrained(positive());
    let validator = engine().validator_for_type(&ty).unwrap();

    assert!(validator.validate(&Value::none()).is_ok());
    assert!(validator.validate(&Value::some(5i32)).is_ok());
    let failure = validator.validate(&Value::some(0i32)).unwrap_err();
    assert_eq!(failure.code, "positive");
    assert_eq!(failure.path().count(), 0);
}

#[test]
fn optional_content_gets_its_own_node() {
    let ty = AnnotatedType::new(TypeDescriptor::optional(
        AnnotatedType::new(TypeDescriptor::String)
            .constrained(ConstraintDeclaration::new("size").attr("min", 2)),
    ));
    let validator = engine().validator_for_type(&ty).unwrap();

    assert!(validator.validate(&Value::none()).is_ok());
    assert!(validator.validate(&Value::some("ok")).is_ok());
    assert_eq!(validator.validate(&Value::some("x")).unwrap_err().code, "size");
}

#[test]
fn map_keys_and_values_report_the_key() {
    let ty = AnnotatedType::new(TypeDescriptor::map(
        AnnotatedType::new(TypeDescriptor::String).constrained(ConstraintDeclaration::new("not_empty")),
        AnnotatedType::new(long()).constrained(positive()),
    ));
    let validator = engine().validator_for_type(&ty).unwrap();

    let bad_key = validator.validate(&Value::map([("", 1i64)])).unwrap_err();
    assert_eq!(bad_key.interpolate(), "must not be empty");
    assert_eq!(bad_key.path_string(), "[]");

    let bad_value = validator.validate(&Value::map([("a", 1i64), ("b", -1i64)])).unwrap_err();
    assert_eq!(bad_value.path_string(), "[b]");
}

// ============================================================================
// CLASS ROOTS
// ============================================================================

fn order_engine() -> ValidationEngine {
    let line = ClassSchema::new("Line").field(
        "quantity",
        AnnotatedType::new(TypeDescriptor::Primitive(PrimitiveKind::Int)).constrained(positive()),
    );
    let order = ClassSchema::new("Order")
        .field(
            "reference",
            AnnotatedType::new(TypeDescriptor::String).constrained(
                ConstraintDeclaration::new("id_card").attr("region", "hongkong"),
            ),
        )
        .field(
            "lines",
            AnnotatedType::new(TypeDescriptor::list(
                AnnotatedType::new(TypeDescriptor::class("Line")).cascaded(),
            ))
            .constrained(ConstraintDeclaration::new("not_empty")),
        );
    ValidationEngine::builder()
        .catalog(Catalog::builtin().unwrap())
        .class(line)
        .class(order)
        .build()
        .unwrap()
}

fn line(quantity: i32) -> ObjectValue {
    ObjectValue::new("Line").with("quantity", quantity)
}

#[test]
fn nested_failures_carry_the_full_path() {
    let engine = order_engine();
    let order = ObjectValue::new("Order")
        .with("reference", "A123456(3)")
        .with("lines", Value::list([line(2), line(0)]));

    let failure = engine.check(&order.into()).unwrap().unwrap_err();
    assert_eq!(failure.path_string(), "lines[1].quantity");
    assert_eq!(failure.value, Value::Int(0));
}

#[test]
fn property_constraints_report_their_own_message() {
    let engine = order_engine();
    let empty = ObjectValue::new("Order")
        .with("reference", "A123456(3)")
        .with("lines", Value::list(Vec::<Value>::new()));
    let failure = engine.check(&empty.into()).unwrap().unwrap_err();
    assert_eq!(failure.path_string(), "lines");
    assert_eq!(failure.interpolate(), "must not be empty");

    let bad_reference = ObjectValue::new("Order")
        .with("reference", "A123456(4)")
        .with("lines", Value::list([line(1)]));
    let failure = engine.check(&bad_reference.into()).unwrap().unwrap_err();
    assert_eq!(failure.code, "id_card");
    assert_eq!(failure.interpolate(), "invalid hongkong identity card number");
}

#[test]
fn getters_win_when_configured() {
    let schema = || {
        ClassSchema::new("Account")
            .field(
                "email",
                AnnotatedType::new(TypeDescriptor::String)
                    .constrained(ConstraintDeclaration::new("not_empty")),
            )
            .getter(
                "email",
                AnnotatedType::new(TypeDescriptor::String)
                    .constrained(ConstraintDeclaration::new("not_empty")),
                |object| {
                    object
                        .field("email")
                        .and_then(Value::as_str)
                        .map_or_else(|| Value::from("unknown"), |s| Value::from(format!("{s}@local")))
                },
            )
    };
    let account: Value = ObjectValue::new("Account").with("email", "").into();

    for (source, passes) in [(PropertySource::Field, false), (PropertySource::Getter, true)] {
        let engine = ValidationEngine::builder()
            .config(EngineConfig::default().with_property_source(source))
            .catalog(Catalog::builtin().unwrap())
            .class(schema())
            .build()
            .unwrap();
        assert_eq!(engine.check(&account).unwrap().is_ok(), passes, "{source:?}");
    }
}

// ============================================================================
// CUSTOM KINDS AND ORDERING
// ============================================================================

fn even_with_positive(positive_order: i32) -> ValidationEngine {
    let mut catalog = Catalog::builtin().unwrap();
    let positive = Arc::clone(catalog.resolve("positive").unwrap());
    catalog
        .register(
            ConstraintMetadata::builder("even")
                .order(10)
                .factory(factory(
                    |ty| matches!(ty, TypeDescriptor::Primitive(PrimitiveKind::Int)),
                    |_node, _constraint| {
                        Ok(AnyCriterion::Int(Criterion::leaf(|v: &i32| {
                            if v % 2 == 0 {
                                Ok(())
                            } else {
                                Err(ValidationFailure::new("even", "must be even", *v))
                            }
                        })))
                    },
                ))
                .combine(CombinedConstraint::new(positive).order(positive_order))
                .build()
                .unwrap(),
        )
        .unwrap();
    ValidationEngine::builder().catalog(catalog).build().unwrap()
}

#[test]
fn combined_constraints_run_around_the_own_check_by_order() {
    let ty = AnnotatedType::new(TypeDescriptor::Primitive(PrimitiveKind::Int))
        .constrained(ConstraintDeclaration::new("even"));
    let input = Value::Int(-3);

    for (positive_order, code) in [(0, "positive"), (20, "even")] {
        let validator = even_with_positive(positive_order)
            .validator_for_type(&ty)
            .unwrap();
        assert_eq!(validator.validate(&input).unwrap_err().code, code);
    }
}

#[test]
fn ordered_constraints_run_after_unordered_elements() {
    let ty = AnnotatedType::new(TypeDescriptor::list(
        AnnotatedType::new(long()).constrained(positive()),
    ))
    .constrained(ConstraintDeclaration::new("size").attr("max", 1).order(1))
    .constrained(ConstraintDeclaration::new("not_null").order(0));
    let validator = engine().validator_for_type(&ty).unwrap();

    let failure = validator.validate(&Value::list([-1i64, 2])).unwrap_err();
    assert_eq!(failure.code, "positive");
}

#[test]
fn lower_ordered_size_fails_before_ordered_elements() {
    let ty = AnnotatedType::new(TypeDescriptor::list(
        AnnotatedType::new(long()).constrained(positive().order(2)),
    ))
    .constrained(ConstraintDeclaration::new("size").attr("max", 1).order(1));
    let validator = engine().validator_for_type(&ty).unwrap();

    assert_eq!(validator.validate(&Value::list([-1i64, -2])).unwrap_err().code, "size");
    let element = validator.validate(&Value::list([-1i64])).unwrap_err();
    assert_eq!(element.code, "positive");
    assert_eq!(element.path_string(), "[0]");
}

#[test]
fn cascaded_elements_run_after_the_list_checks() {
    let engine = order_engine();
    let lines = AnnotatedType::new(TypeDescriptor::list(
        AnnotatedType::new(TypeDescriptor::class("Line")).cascaded(),
    ))
    .constrained(ConstraintDeclaration::new("size").attr("max", 1));
    let validator = engine.validator_for_type(&lines).unwrap();

    let too_many = Value::list([line(-1), line(-2)]);
    assert_eq!(validator.validate(&too_many).unwrap_err().code, "size");

    let failure = validator.validate(&Value::list([line(-1)])).unwrap_err();
    assert_eq!(failure.path_string(), "[0].quantity");
}

#[test]
fn equal_declarations_are_interned_once() {
    let engine = engine();
    let field = || {
        AnnotatedType::new(TypeDescriptor::String)
            .constrained(ConstraintDeclaration::new("size").attr("max", 3))
    };
    engine
        .register_class(ClassSchema::new("Pair").field("a", field()).field("b", field()))
        .unwrap();

    let tree = engine.tree_for_class("Pair").unwrap();
    let a = &tree.children()[0].node.constraints()[0];
    let b = &tree.children()[1].node.constraints()[0];
    assert!(Arc::ptr_eq(a, b));

    let pair: Value = ObjectValue::new("Pair").with("a", "abc").with("b", "abcd").into();
    let failure = engine.check(&pair).unwrap().unwrap_err();
    assert_eq!(failure.path_string(), "b");
}

// ============================================================================
// ANALYSIS ERRORS
// ============================================================================

#[test]
fn schema_errors_surface_at_analysis() {
    let engine = engine();

    let unknown = AnnotatedType::new(TypeDescriptor::String)
        .constrained(ConstraintDeclaration::new("positiv"));
    assert_eq!(
        engine.validator_for_type(&unknown).unwrap_err(),
        AnalysisError::unknown_constraint("positiv")
    );

    let inapplicable = AnnotatedType::new(TypeDescriptor::String).constrained(positive());
    assert_eq!(
        engine.validator_for_type(&inapplicable).unwrap_err().code(),
        "no_value_extractor"
    );

    let malformed = AnnotatedType::new(long())
        .constrained(ConstraintDeclaration::new("domain").attr("value", "[1,"));
    assert_eq!(
        engine.validator_for_type(&malformed).unwrap_err().code(),
        "malformed_expression"
    );

    let negative = AnnotatedType::new(TypeDescriptor::String)
        .constrained(ConstraintDeclaration::new("size").attr("min", -1));
    assert_eq!(
        engine.validator_for_type(&negative).unwrap_err().code(),
        "invalid_attribute"
    );

    assert_eq!(
        engine.validator_for_class("Ghost").unwrap_err(),
        AnalysisError::unknown_class("Ghost")
    );
}

#[test]
fn combined_target_without_factory_is_reported() {
    let mut catalog = Catalog::builtin().unwrap();
    let size = Arc::clone(catalog.resolve("size").unwrap());
    catalog
        .register(
            ConstraintMetadata::builder("bounded")
                .factory(factory(TypeDescriptor::is_numeric, |_node, _constraint| {
                    Ok(AnyCriterion::Int(Criterion::truth()))
                }))
                .combine(CombinedConstraint::new(size).literal("max", 4))
                .build()
                .unwrap(),
        )
        .unwrap();
    let engine = ValidationEngine::builder().catalog(catalog).build().unwrap();

    let ty = AnnotatedType::new(TypeDescriptor::Primitive(PrimitiveKind::Int))
        .constrained(ConstraintDeclaration::new("bounded"));
    assert_eq!(
        engine.validator_for_type(&ty).unwrap_err().code(),
        "no_applicable_factory"
    );
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn concurrent_lookups_share_one_criterion() {
    let engine = order_engine();
    let validators: Vec<Validator> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| engine.validator_for_class("Order").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let first = validators[0].criterion();
    for validator in &validators[1..] {
        assert!(std::ptr::eq(first, validator.criterion()));
    }
}
