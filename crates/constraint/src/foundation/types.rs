//! Static type descriptors handed over by the annotation-discovery layer.
//!
//! A [`TypeDescriptor`] describes the declared type of a validated position
//! (class, property, parameter or type argument). Every nested position that
//! can carry type-use constraints is an [`AnnotatedType`], so declarations like
//! `List<@Positive Integer>` are plain data:
//!
//! ```rust,ignore
//! use nebula_constraint::foundation::{AnnotatedType, PrimitiveKind, TypeDescriptor};
//! use nebula_constraint::constraint::ConstraintDeclaration;
//!
//! let element = AnnotatedType::new(TypeDescriptor::Boxed(PrimitiveKind::Int))
//!     .constrained(ConstraintDeclaration::new("positive"));
//! let list = AnnotatedType::new(TypeDescriptor::list(element))
//!     .constrained(ConstraintDeclaration::new("size").attr("max", 3));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::constraint::ConstraintDeclaration;

// ============================================================================
// PRIMITIVE KINDS AND SHAPES
// ============================================================================

/// Unboxed scalar kinds that get their own criterion variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Returns the unboxed type name (`int`, `double`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Returns the boxed type name (`Integer`, `Double`, ...).
    #[must_use]
    pub const fn boxed_name(self) -> &'static str {
        match self {
            Self::Bool => "Boolean",
            Self::Char => "Character",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Char)
    }

    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value shape a criterion is defined over.
///
/// Primitive shapes are tested without going through [`Value`](super::Value)
/// dispatch; everything else is a reference shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Primitive(PrimitiveKind),
    Reference,
}

impl Shape {
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        matches!(self, Self::Primitive(_))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// Flavour of an iterable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Set,
    Collection,
}

impl CollectionKind {
    const fn name(self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Set => "Set",
            Self::Collection => "Collection",
        }
    }
}

// ============================================================================
// TYPE DESCRIPTOR
// ============================================================================

/// Declared (static) type of a validated position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Unboxed scalar, never null.
    Primitive(PrimitiveKind),
    /// Nullable boxed scalar.
    Boxed(PrimitiveKind),
    String,
    Array(Box<AnnotatedType>),
    Iterable(CollectionKind, Box<AnnotatedType>),
    Map(Box<AnnotatedType>, Box<AnnotatedType>),
    Optional(Box<AnnotatedType>),
    /// `OptionalInt` / `OptionalLong` / `OptionalDouble`.
    OptionalPrimitive(PrimitiveKind),
    /// A class registered with the engine, referenced by name.
    Class(Arc<str>),
    /// Untyped reference.
    Any,
}

impl TypeDescriptor {
    pub fn array(element: impl Into<AnnotatedType>) -> Self {
        Self::Array(Box::new(element.into()))
    }

    pub fn list(element: impl Into<AnnotatedType>) -> Self {
        Self::Iterable(CollectionKind::List, Box::new(element.into()))
    }

    pub fn set(element: impl Into<AnnotatedType>) -> Self {
        Self::Iterable(CollectionKind::Set, Box::new(element.into()))
    }

    pub fn map(key: impl Into<AnnotatedType>, value: impl Into<AnnotatedType>) -> Self {
        Self::Map(Box::new(key.into()), Box::new(value.into()))
    }

    pub fn optional(inner: impl Into<AnnotatedType>) -> Self {
        Self::Optional(Box::new(inner.into()))
    }

    pub fn class(name: impl Into<Arc<str>>) -> Self {
        Self::Class(name.into())
    }

    /// Returns the criterion shape values of this type are tested with.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        match self {
            Self::Primitive(kind) => Shape::Primitive(*kind),
            _ => Shape::Reference,
        }
    }

    /// Returns the scalar kind for primitive and boxed types.
    #[must_use]
    pub const fn scalar_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(kind) | Self::Boxed(kind) => Some(*kind),
            _ => None,
        }
    }

    /// True for primitive or boxed numeric types.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        match self.scalar_kind() {
            Some(kind) => kind.is_numeric(),
            None => false,
        }
    }

    /// True for types that have a size: strings, arrays, iterables and maps.
    #[must_use]
    pub const fn is_sized(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Array(_) | Self::Iterable(..) | Self::Map(..)
        )
    }

    /// True for every type whose values may be null.
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        !matches!(self, Self::Primitive(_))
    }

    /// Returns the class name for class types.
    #[must_use]
    pub fn class_name(&self) -> Option<&Arc<str>> {
        match self {
            Self::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => f.write_str(kind.name()),
            Self::Boxed(kind) => f.write_str(kind.boxed_name()),
            Self::String => f.write_str("String"),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Iterable(kind, element) => write!(f, "{}<{element}>", kind.name()),
            Self::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            Self::Optional(inner) => write!(f, "Optional<{inner}>"),
            Self::OptionalPrimitive(kind) => match kind {
                PrimitiveKind::Int => f.write_str("OptionalInt"),
                PrimitiveKind::Long => f.write_str("OptionalLong"),
                PrimitiveKind::Double => f.write_str("OptionalDouble"),
                other => write!(f, "Optional{}", other.boxed_name()),
            },
            Self::Class(name) => f.write_str(name),
            Self::Any => f.write_str("Object"),
        }
    }
}

// ============================================================================
// ANNOTATIONS
// ============================================================================

/// An annotation found on a declaring element or type-use position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Annotation {
    /// A single constraint declaration.
    Constraint(ConstraintDeclaration),
    /// A list wrapper holding several constraints of possibly the same kind.
    ConstraintList(Vec<ConstraintDeclaration>),
    /// Descend into the registered class of this position.
    Cascade,
    /// Anything that is not constraint-bearing.
    Other(Arc<str>),
}

/// A type together with the annotations declared on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotatedType {
    pub ty: TypeDescriptor,
    pub annotations: Vec<Annotation>,
}

impl AnnotatedType {
    #[must_use]
    pub fn new(ty: TypeDescriptor) -> Self {
        Self {
            ty,
            annotations: Vec::new(),
        }
    }

    /// Adds an arbitrary annotation.
    #[must_use = "builder methods must be chained or built"]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Adds a constraint declaration.
    #[must_use = "builder methods must be chained or built"]
    pub fn constrained(self, declaration: ConstraintDeclaration) -> Self {
        self.annotated(Annotation::Constraint(declaration))
    }

    /// Marks the position for cascaded validation.
    #[must_use = "builder methods must be chained or built"]
    pub fn cascaded(self) -> Self {
        self.annotated(Annotation::Cascade)
    }

    /// Iterates the constraint declarations, expanding list wrappers.
    pub fn declarations(&self) -> impl Iterator<Item = &ConstraintDeclaration> {
        self.annotations.iter().flat_map(|annotation| match annotation {
            Annotation::Constraint(declaration) => std::slice::from_ref(declaration).iter(),
            Annotation::ConstraintList(declarations) => declarations.iter(),
            Annotation::Cascade | Annotation::Other(_) => (&[] as &[ConstraintDeclaration]).iter(),
        })
    }

    #[must_use]
    pub fn is_cascaded(&self) -> bool {
        self.annotations
            .iter()
            .any(|annotation| matches!(annotation, Annotation::Cascade))
    }
}

impl From<TypeDescriptor> for AnnotatedType {
    fn from(ty: TypeDescriptor) -> Self {
        Self::new(ty)
    }
}

impl fmt::Display for AnnotatedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ty.fmt(f)
    }
}
