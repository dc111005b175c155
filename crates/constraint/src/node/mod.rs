//! Constrained node trees
//!
//! A [`ConstrainedNode`] is one position of a validated type graph: a class,
//! a property, an array element, a map key or value, an optional's content,
//! or a value unwrapped by an extractor. It carries the constraints declared
//! at that position and the children derived from its static type, each
//! paired with the [`CriterionWrapper`] that projects the child's criterion
//! onto this node's value.
//!
//! Trees are built once per root by the [`TreeBuilder`] and never change
//! afterwards. Cascaded classes are not expanded inline: a node records the
//! class name and the compiler links to that class's own compiled criterion,
//! which keeps trees finite for self-referential classes.

mod builder;
mod schema;

use std::fmt;
use std::sync::Arc;

pub use builder::TreeBuilder;
pub use schema::{ClassSchema, PropertySchema};

use smallvec::SmallVec;

use crate::constraint::Constraint;
use crate::foundation::TypeDescriptor;
use crate::wrapper::CriterionWrapper;

// ============================================================================
// LOCATION
// ============================================================================

/// One step of a node's declaring location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// The root class or type.
    Root(Arc<str>),
    /// A property, rendered `#name`.
    Property(Arc<str>),
    /// An extracted or optional value, rendered `.@name`.
    Value(Arc<str>),
    /// Any array or iterable element, rendered `[i]`.
    Element,
    /// Any map key, rendered `<key>`.
    MapKey,
    /// Any map value, rendered `<value>`.
    MapValue,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(name) => f.write_str(name),
            Self::Property(name) => write!(f, "#{name}"),
            Self::Value(name) => write!(f, ".@{name}"),
            Self::Element => f.write_str("[i]"),
            Self::MapKey => f.write_str("<key>"),
            Self::MapValue => f.write_str("<value>"),
        }
    }
}

/// Path of a node from its root, e.g. `User#address.@value[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    segments: SmallVec<[Segment; 4]>,
}

impl Location {
    pub fn root(name: impl Into<Arc<str>>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(Segment::Root(name.into()));
        Self { segments }
    }

    /// The location one step below this one.
    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of steps below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// ============================================================================
// CONSTRAINED NODE
// ============================================================================

/// A child node and the wrapper that lifts its criterion onto the parent.
#[derive(Debug, Clone)]
pub struct ChildNode {
    pub wrapper: CriterionWrapper,
    pub node: ConstrainedNode,
}

/// A position in a validated type graph.
#[derive(Debug, Clone)]
pub struct ConstrainedNode {
    location: Location,
    ty: TypeDescriptor,
    constraints: Vec<Arc<Constraint>>,
    cascade: Option<Arc<str>>,
    children: Vec<ChildNode>,
}

impl ConstrainedNode {
    /// A node without constraints or children.
    pub const fn leaf(location: Location, ty: TypeDescriptor) -> Self {
        Self {
            location,
            ty,
            constraints: Vec::new(),
            cascade: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub const fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Constraints declared at this position, in declaration order.
    #[must_use]
    pub fn constraints(&self) -> &[Arc<Constraint>] {
        &self.constraints
    }

    /// The registered class this position cascades into.
    #[must_use]
    pub fn cascade(&self) -> Option<&Arc<str>> {
        self.cascade.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[ChildNode] {
        &self.children
    }

    /// True when nothing at or below this node needs checking.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.cascade.is_none() && self.children.is_empty()
    }

    /// Number of nodes in this subtree, this one included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.node.node_count())
            .sum::<usize>()
    }

    /// Finds a descendant (or this node) by its rendered location.
    #[must_use]
    pub fn find(&self, location: &str) -> Option<&Self> {
        if self.location.to_string() == location {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.node.find(location))
    }

    /// Class names cascaded into anywhere in this subtree.
    pub fn cascades(&self) -> Vec<Arc<str>> {
        let mut out = Vec::new();
        self.collect_cascades(&mut out);
        out
    }

    fn collect_cascades(&self, out: &mut Vec<Arc<str>>) {
        if let Some(class) = &self.cascade {
            if !out.contains(class) {
                out.push(Arc::clone(class));
            }
        }
        for child in &self.children {
            child.node.collect_cascades(out);
        }
    }
}
