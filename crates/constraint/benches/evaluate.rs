// Compilation and evaluation benchmarks
// Run with: cargo bench -p nebula-constraint

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nebula_constraint::prelude::*;

fn engine() -> ValidationEngine {
    let line = ClassSchema::new("Line")
        .field(
            "sku",
            AnnotatedType::new(TypeDescriptor::String)
                .constrained(ConstraintDeclaration::new("size").attr("min", 3).attr("max", 12)),
        )
        .field(
            "quantity",
            AnnotatedType::new(TypeDescriptor::Primitive(PrimitiveKind::Int))
                .constrained(ConstraintDeclaration::new("range").attr("min", 1).attr("max", 99)),
        );
    let order = ClassSchema::new("Order").field(
        "lines",
        AnnotatedType::new(TypeDescriptor::list(
            AnnotatedType::new(TypeDescriptor::class("Line")).cascaded(),
        ))
        .constrained(ConstraintDeclaration::new("not_empty")),
    );

    ValidationEngine::builder()
        .catalog(Catalog::builtin().expect("builtin catalog"))
        .class(line)
        .class(order)
        .build()
        .expect("valid schema")
}

fn order(lines: usize) -> Value {
    let lines = (0..lines).map(|i| {
        ObjectValue::new("Line")
            .with("sku", format!("SKU-{i:04}"))
            .with("quantity", (i % 50 + 1) as i32)
    });
    ObjectValue::new("Order")
        .with("lines", Value::list(lines))
        .into()
}

/// Cold path: build and compile the tree of a type on a fresh engine.
fn bench_compile(c: &mut Criterion) {
    let scores = AnnotatedType::new(TypeDescriptor::list(
        AnnotatedType::new(TypeDescriptor::Boxed(PrimitiveKind::Long))
            .constrained(ConstraintDeclaration::new("positive")),
    ))
    .constrained(ConstraintDeclaration::new("size").attr("max", 3));

    c.bench_function("compile_list_type", |b| {
        b.iter(|| {
            let engine = engine();
            black_box(engine.validator_for_type(black_box(&scores)).expect("compiles"));
        });
    });
}

/// Hot path: validate a passing order through cached criteria.
fn bench_validate(c: &mut Criterion) {
    let engine = engine();
    let validator = engine.validator_for_class("Order").expect("compiles");

    for lines in [1, 16, 256] {
        let value = order(lines);
        c.bench_function(&format!("validate_order_{lines}_lines"), |b| {
            b.iter(|| black_box(validator.validate(black_box(&value))));
        });
    }
}

/// Lookup of an already compiled validator.
fn bench_cached_lookup(c: &mut Criterion) {
    let engine = engine();
    let _ = engine.validator_for_class("Order").expect("compiles");

    c.bench_function("validator_cache_hit", |b| {
        b.iter(|| black_box(engine.validator_for_class(black_box("Order"))));
    });
}

criterion_group!(benches, bench_compile, bench_validate, bench_cached_lookup);
criterion_main!(benches);
