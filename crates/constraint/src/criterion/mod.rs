//! The criterion algebra
//!
//! A [`Criterion<T>`] is a compiled, side-effect-free check over values of
//! type `T`. Criteria compose into ordered [`Criteria`] aggregates with AND
//! semantics that stop at the first failure, and [`Criterion::simplify`]
//! flattens nested aggregates once at compile time so evaluation pays no
//! indirection for the depth of the composition that produced it.
//!
//! `T` is either one of the [`Primitive`](crate::foundation::Primitive)
//! scalars or [`Value`](crate::foundation::Value). [`AnyCriterion`] tags a
//! criterion with its shape so wrappers and compilers can dispatch on it.
//!
//! # Examples
//!
//! ```rust,ignore
//! use nebula_constraint::criterion::{Criteria, Criterion};
//! use nebula_constraint::foundation::ValidationFailure;
//!
//! let positive = Criterion::leaf(|v: &i32| {
//!     if *v > 0 { Ok(()) } else { Err(ValidationFailure::new("positive", "must be positive", *v)) }
//! });
//! let small = Criterion::leaf(|v: &i32| {
//!     if *v < 10 { Ok(()) } else { Err(ValidationFailure::new("max", "must be below 10", *v)) }
//! });
//!
//! let both = Criteria::from_iter([positive, Criterion::truth(), small]).simplify();
//! assert!(both.validate(&5).is_ok());
//! assert_eq!(both.validate(&-1).unwrap_err().code, "positive");
//! ```

mod any;
mod criteria;

use std::fmt;
use std::sync::Arc;

pub use any::{AnyCriteria, AnyCriterion};
pub use criteria::Criteria;

use crate::foundation::{ValidationFailure, ValidationResult};

/// A single check over `T`.
pub type Test<T> = dyn Fn(&T) -> ValidationResult + Send + Sync;

/// Decorates a failure on its way out of a criterion.
pub type Enhancer = dyn Fn(ValidationFailure) -> ValidationFailure + Send + Sync;

// ============================================================================
// CRITERION
// ============================================================================

/// A compiled check over values of type `T`.
pub enum Criterion<T: 'static> {
    /// Always passes. Absorbed by composition and never enhanced.
    Truth,
    /// One check.
    Leaf(Arc<Test<T>>),
    /// Ordered aggregate, first failure wins.
    Criteria(Criteria<T>),
    /// A criterion whose failures pass through an enhancer.
    Enhanced {
        inner: Box<Criterion<T>>,
        enhancer: Arc<Enhancer>,
    },
}

impl<T: 'static> Criterion<T> {
    /// The criterion that always passes.
    #[must_use]
    pub const fn truth() -> Self {
        Self::Truth
    }

    /// Creates a leaf criterion from a check function.
    pub fn leaf<F>(test: F) -> Self
    where
        F: Fn(&T) -> ValidationResult + Send + Sync + 'static,
    {
        Self::Leaf(Arc::new(test))
    }

    #[must_use]
    pub const fn is_truth(&self) -> bool {
        matches!(self, Self::Truth)
    }

    /// Tests `input`, returning the first failure.
    pub fn validate(&self, input: &T) -> ValidationResult {
        match self {
            Self::Truth => Ok(()),
            Self::Leaf(test) => test(input),
            Self::Criteria(criteria) => criteria.validate(input),
            Self::Enhanced { inner, enhancer } => inner.validate(input).map_err(|f| enhancer(f)),
        }
    }

    /// Returns a criterion whose failures are decorated by `enhancer`.
    ///
    /// The truth criterion can never fail and is returned unchanged.
    #[must_use]
    pub fn enhance_failure(self, enhancer: Arc<Enhancer>) -> Self {
        if self.is_truth() {
            return self;
        }
        Self::Enhanced {
            inner: Box::new(self),
            enhancer,
        }
    }

    /// Combines two criteria with AND semantics, `self` first.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Criteria::from_iter([self, other]).simplify()
    }

    /// Flattens nested aggregates and drops truth members.
    ///
    /// An empty result is [`Criterion::Truth`], a single member is returned
    /// unwrapped. Simplifying twice gives the same criterion as simplifying once.
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Criteria(criteria) => criteria.simplify(),
            Self::Enhanced { inner, enhancer } => inner.simplify().enhance_failure(enhancer),
            other => other,
        }
    }

    /// Number of leaves reachable from this criterion.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Truth => 0,
            Self::Leaf(_) => 1,
            Self::Criteria(criteria) => criteria.iter().map(Self::leaf_count).sum(),
            Self::Enhanced { inner, .. } => inner.leaf_count(),
        }
    }
}

impl<T: 'static> Clone for Criterion<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Truth => Self::Truth,
            Self::Leaf(test) => Self::Leaf(Arc::clone(test)),
            Self::Criteria(criteria) => Self::Criteria(criteria.clone()),
            Self::Enhanced { inner, enhancer } => Self::Enhanced {
                inner: inner.clone(),
                enhancer: Arc::clone(enhancer),
            },
        }
    }
}

impl<T: 'static> Default for Criterion<T> {
    fn default() -> Self {
        Self::Truth
    }
}

/// Structural identity: leaves and enhancers compare by pointer.
impl<T: 'static> PartialEq for Criterion<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Truth, Self::Truth) => true,
            (Self::Leaf(a), Self::Leaf(b)) => Arc::ptr_eq(a, b),
            (Self::Criteria(a), Self::Criteria(b)) => a == b,
            (
                Self::Enhanced {
                    inner: a,
                    enhancer: ea,
                },
                Self::Enhanced {
                    inner: b,
                    enhancer: eb,
                },
            ) => Arc::ptr_eq(ea, eb) && a == b,
            _ => false,
        }
    }
}

impl<T: 'static> fmt::Debug for Criterion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truth => f.write_str("Truth"),
            Self::Leaf(_) => f.write_str("Leaf(<fn>)"),
            Self::Criteria(criteria) => f.debug_list().entries(criteria.iter()).finish(),
            Self::Enhanced { inner, .. } => f.debug_tuple("Enhanced").field(inner).finish(),
        }
    }
}
