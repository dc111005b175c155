//! # nebula-constraint
//!
//! A declarative constraint engine. Constraints declared on classes,
//! properties and type-use positions are resolved into trees of constrained
//! positions, compiled once into composable criteria and evaluated against
//! dynamic values.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nebula_constraint::prelude::*;
//!
//! // List<@Positive Long> @Size(max = 3)
//! let scores = AnnotatedType::new(TypeDescriptor::list(
//!     AnnotatedType::new(TypeDescriptor::Boxed(PrimitiveKind::Long))
//!         .constrained(ConstraintDeclaration::new("positive")),
//! ))
//! .constrained(ConstraintDeclaration::new("size").attr("max", 3));
//!
//! let engine = ValidationEngine::builder().catalog(Catalog::builtin()?).build()?;
//! let validator = engine.validator_for_type(&scores)?;
//!
//! let failure = validator.validate(&Value::list([1i64, -2, 3])).unwrap_err();
//! assert_eq!(failure.path_string(), "[1]");
//! ```
//!
//! ## Layers
//!
//! - [`foundation`]: values, type descriptors and validation failures
//! - [`criterion`]: the criterion algebra
//! - [`wrapper`]: projections of criteria onto containing values
//! - [`constraint`]: constraint kinds, combined constraints and interning
//! - [`catalog`]: the registry of constraint kinds
//! - [`node`]: constrained node trees and their builder
//! - [`compiler`]: compilation of trees into criteria
//! - [`engine`]: the caching engine tying it all together
//!
//! Analysis errors ([`AnalysisError`](error::AnalysisError)) report a broken
//! schema and surface when a tree is built or compiled. Validation failures
//! ([`ValidationFailure`](foundation::ValidationFailure)) report bad data and
//! are returned, never raised.

// ValidationFailure carries the offending value; boxing it would add an
// allocation to every failing check.
#![allow(clippy::result_large_err)]

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod constraint;
pub mod criterion;
pub mod engine;
pub mod error;
pub mod foundation;
pub mod node;
pub mod prelude;
pub mod wrapper;
