//! Foundation types shared by every layer of the engine
//!
//! - **Values**: [`Value`], [`ObjectValue`] and the [`Primitive`] scalars
//! - **Types**: [`TypeDescriptor`], [`AnnotatedType`], [`Annotation`], [`Shape`]
//! - **Failures**: [`ValidationFailure`] and its [`Indicator`] trail
//!
//! # Architecture
//!
//! The engine never inspects live Rust types. The annotation-discovery layer
//! describes every validated position as an [`AnnotatedType`], and instances
//! arrive as [`Value`]s. Both are plain data, which keeps the engine free of
//! reflection and lets one engine validate schemas registered at runtime.
//!
//! ```rust,ignore
//! use nebula_constraint::foundation::*;
//!
//! let ty = AnnotatedType::new(TypeDescriptor::list(TypeDescriptor::Boxed(PrimitiveKind::Int)));
//! let value = Value::list([1, 2, 3]);
//! ```

pub mod failure;
pub mod types;
pub mod value;

pub use failure::{Indicator, ValidationFailure};
pub use types::{AnnotatedType, Annotation, CollectionKind, PrimitiveKind, Shape, TypeDescriptor};
pub use value::{ObjectValue, Primitive, Value};

/// Result of evaluating a criterion against one value.
pub type ValidationResult = Result<(), ValidationFailure>;
