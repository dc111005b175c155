//! Value extractors
//!
//! A [`ValueExtractor`] lets a constraint apply to a type it cannot check
//! directly by unwrapping the value first, e.g. `@Positive` on an
//! `OptionalInt` is checked against the contained `int`. The tree builder
//! asks each registered extractor whether it resolves the declared type to a
//! type the constraint applies to.

use std::fmt;
use std::sync::Arc;

use crate::foundation::{TypeDescriptor, Value};

type Resolve = dyn Fn(&TypeDescriptor) -> Option<TypeDescriptor> + Send + Sync;
type Extract = dyn for<'a> Fn(&'a Value) -> Option<&'a Value> + Send + Sync;

/// A named unwrap operation from a container type to its contained value.
#[derive(Clone)]
pub struct ValueExtractor {
    name: Arc<str>,
    resolve: Arc<Resolve>,
    extract: Arc<Extract>,
}

impl ValueExtractor {
    /// Creates an extractor.
    ///
    /// `resolve` maps a declared type to the extracted value's type, or
    /// `None` if the extractor does not handle it. `extract` returns the
    /// contained value, or `None` when it is absent.
    pub fn new<R, E>(name: impl Into<Arc<str>>, resolve: R, extract: E) -> Self
    where
        R: Fn(&TypeDescriptor) -> Option<TypeDescriptor> + Send + Sync + 'static,
        E: for<'a> Fn(&'a Value) -> Option<&'a Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            resolve: Arc::new(resolve),
            extract: Arc::new(extract),
        }
    }

    /// Unwraps `OptionalInt`, `OptionalLong` and `OptionalDouble` to the primitive.
    #[must_use]
    pub fn optional_primitive() -> Self {
        Self::new(
            "value",
            |ty| match ty {
                TypeDescriptor::OptionalPrimitive(kind) => Some(TypeDescriptor::Primitive(*kind)),
                _ => None,
            },
            present,
        )
    }

    /// Unwraps `Optional<T>` to `T`.
    #[must_use]
    pub fn optional() -> Self {
        Self::new(
            "value",
            |ty| match ty {
                TypeDescriptor::Optional(inner) => Some(inner.ty.clone()),
                _ => None,
            },
            present,
        )
    }

    #[must_use]
    pub const fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The type of the extracted value, if this extractor handles `ty`.
    #[must_use]
    pub fn resolve(&self, ty: &TypeDescriptor) -> Option<TypeDescriptor> {
        (self.resolve)(ty)
    }

    /// The contained value, or `None` when absent.
    #[must_use]
    pub fn extract<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        (self.extract)(value)
    }
}

fn present(value: &Value) -> Option<&Value> {
    match value {
        Value::Optional(Some(inner)) => Some(&**inner),
        Value::Optional(None) | Value::Null => None,
        // A bare value stands for a present optional.
        other => Some(other),
    }
}

impl fmt::Debug for ValueExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueExtractor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
