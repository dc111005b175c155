//! Property-based tests for the criterion algebra.

use nebula_constraint::criterion::{Criteria, Criterion};
use nebula_constraint::foundation::ValidationFailure;
use proptest::prelude::*;

/// `None` is the truth criterion, `Some(t)` a leaf failing for inputs >= t
/// with code `t`.
type Member = Option<i32>;

fn member(threshold: Member) -> Criterion<i32> {
    match threshold {
        None => Criterion::truth(),
        Some(threshold) => Criterion::leaf(move |v: &i32| {
            if *v < threshold {
                Ok(())
            } else {
                Err(ValidationFailure::new(
                    threshold.to_string(),
                    "must be below {t}",
                    *v,
                ))
            }
        }),
    }
}

fn nested(groups: &[Vec<Member>]) -> Criterion<i32> {
    Criterion::Criteria(
        groups
            .iter()
            .map(|group| Criterion::Criteria(group.iter().copied().map(member).collect()))
            .collect::<Criteria<_>>(),
    )
}

fn first_failing(groups: &[Vec<Member>], input: i32) -> Option<String> {
    groups
        .iter()
        .flatten()
        .flatten()
        .find(|threshold| input >= **threshold)
        .map(ToString::to_string)
}

fn groups() -> impl Strategy<Value = Vec<Vec<Member>>> {
    prop::collection::vec(
        prop::collection::vec(prop::option::of(-50i32..50), 0..5),
        0..5,
    )
}

// ============================================================================
// SIMPLIFICATION LAWS
// ============================================================================

proptest! {
    #[test]
    fn simplify_preserves_behaviour(groups in groups(), input in -60i32..60) {
        let plain = nested(&groups).validate(&input).err().map(|f| f.code.into_owned());
        let simple = nested(&groups).simplify().validate(&input).err().map(|f| f.code.into_owned());
        prop_assert_eq!(&plain, &simple);
        prop_assert_eq!(plain, first_failing(&groups, input));
    }

    #[test]
    fn simplify_is_idempotent(groups in groups(), input in -60i32..60) {
        let once = nested(&groups).simplify();
        let once_leaves = once.leaf_count();
        let once_result = once.validate(&input).is_ok();

        let twice = once.simplify();
        prop_assert_eq!(twice.leaf_count(), once_leaves);
        prop_assert_eq!(twice.validate(&input).is_ok(), once_result);
    }

    #[test]
    fn truth_members_are_absorbed(groups in groups()) {
        let leaves = groups.iter().flatten().filter(|m| m.is_some()).count();
        let simple = nested(&groups).simplify();
        prop_assert_eq!(simple.leaf_count(), leaves);
        prop_assert_eq!(simple.is_truth(), leaves == 0);
        if leaves == 1 {
            prop_assert!(matches!(simple, Criterion::Leaf(_)), "single member is unwrapped");
        }
    }
}

// ============================================================================
// COMPOSITION
// ============================================================================

proptest! {
    #[test]
    fn and_fails_iff_either_fails(a in -50i32..50, b in -50i32..50, input in -60i32..60) {
        let both = member(Some(a)).and(member(Some(b)));
        prop_assert_eq!(both.validate(&input).is_err(), input >= a || input >= b);
    }

    #[test]
    fn and_reports_the_left_failure_first(a in -50i32..50, b in -50i32..50, input in -60i32..60) {
        let both = member(Some(a)).and(member(Some(b)));
        if input >= a {
            prop_assert_eq!(both.validate(&input).unwrap_err().code.into_owned(), a.to_string());
        }
    }
}

#[test]
fn enhancers_decorate_failures_but_not_truth() {
    use std::sync::Arc;

    let enhancer: Arc<dyn Fn(ValidationFailure) -> ValidationFailure + Send + Sync> =
        Arc::new(|f| f.with_template("overridden"));

    assert!(Criterion::<i32>::truth().enhance_failure(Arc::clone(&enhancer)).is_truth());

    let enhanced = member(Some(0)).enhance_failure(enhancer);
    let failure = enhanced.validate(&3).unwrap_err();
    assert_eq!(failure.template, "overridden");
    assert_eq!(failure.code, "0");
}
