//! Tree building from class schemas and annotated types

use std::sync::Arc;

use super::{ChildNode, ClassSchema, ConstrainedNode, Location, Segment};
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::constraint::{Constraint, ConstraintCache, ConstraintDeclaration};
use crate::error::AnalysisError;
use crate::foundation::{AnnotatedType, Annotation, TypeDescriptor};
use crate::wrapper::{CriterionWrapper, ValueExtractor};

/// Builds [`ConstrainedNode`] trees.
///
/// The builder is a short-lived view over the engine's registries. It
/// resolves declarations through the catalog, interns them in the shared
/// constraint cache and checks cascade targets against the registered classes.
pub struct TreeBuilder<'a> {
    catalog: &'a Catalog,
    constraints: &'a ConstraintCache,
    extractors: &'a [Arc<ValueExtractor>],
    config: &'a EngineConfig,
    is_registered: &'a dyn Fn(&str) -> bool,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        catalog: &'a Catalog,
        constraints: &'a ConstraintCache,
        extractors: &'a [Arc<ValueExtractor>],
        config: &'a EngineConfig,
        is_registered: &'a dyn Fn(&str) -> bool,
    ) -> Self {
        Self {
            catalog,
            constraints,
            extractors,
            config,
            is_registered,
        }
    }

    /// Builds the tree of a class: class-level constraints on the root, one
    /// child per effective property.
    ///
    /// # Errors
    ///
    /// Returns the first [`AnalysisError`] found in any property.
    pub fn build_class(&self, schema: &ClassSchema) -> Result<ConstrainedNode, AnalysisError> {
        let location = Location::root(Arc::clone(schema.name()));
        let ty = TypeDescriptor::Class(Arc::clone(schema.name()));

        let mut root = ConstrainedNode::leaf(location, ty);
        for annotation in schema.annotations() {
            for declaration in declarations(annotation) {
                root.constraints.push(self.resolve(declaration)?);
            }
        }

        for property in schema.effective_properties(self.config.property_source) {
            let location = root.location.child(Segment::Property(Arc::clone(&property.name)));
            let node = self.build_position(location, &property.ty)?;
            if !node.is_empty() {
                root.children.push(ChildNode {
                    wrapper: CriterionWrapper::Property(property.accessor()),
                    node,
                });
            }
        }

        tracing::debug!(
            class = %schema.name(),
            nodes = root.node_count(),
            "built constrained tree"
        );
        Ok(root)
    }

    /// Builds the tree of a standalone annotated type, such as a method
    /// parameter or return value. The root is kept even when empty.
    ///
    /// # Errors
    ///
    /// Returns the first [`AnalysisError`] found in the type.
    pub fn build_type(&self, ty: &AnnotatedType) -> Result<ConstrainedNode, AnalysisError> {
        let root = self.build_position(Location::root(ty.to_string()), ty)?;
        tracing::debug!(ty = %ty, nodes = root.node_count(), "built constrained tree");
        Ok(root)
    }

    fn build_position(
        &self,
        location: Location,
        annotated: &AnnotatedType,
    ) -> Result<ConstrainedNode, AnalysisError> {
        if location.depth() > self.config.max_type_depth {
            return Err(AnalysisError::DepthExceeded {
                location: location.to_string(),
                limit: self.config.max_type_depth,
            });
        }

        let ty = &annotated.ty;
        let mut node = ConstrainedNode::leaf(location, ty.clone());

        // Constraints that apply directly stay here; the rest are grouped by
        // the extractor that makes them applicable.
        let mut extracted: Vec<(usize, TypeDescriptor, Vec<Arc<Constraint>>)> = Vec::new();
        for declaration in annotated.declarations() {
            let constraint = self.resolve(declaration)?;
            if constraint.metadata().applies_to(ty) {
                node.constraints.push(constraint);
                continue;
            }

            let (index, target) = self
                .find_extractor(&constraint, ty)
                .ok_or_else(|| AnalysisError::NoValueExtractor {
                    location: node.location.to_string(),
                    constraint: constraint.to_string(),
                    ty: ty.to_string(),
                })?;
            match extracted.iter_mut().find(|(i, _, _)| *i == index) {
                Some((_, _, group)) => group.push(constraint),
                None => extracted.push((index, target, vec![constraint])),
            }
        }

        if annotated.is_cascaded() {
            node.cascade = Some(self.cascade_target(&node.location, ty)?);
        }

        for (index, target, constraints) in extracted {
            let extractor = &self.extractors[index];
            let mut child = ConstrainedNode::leaf(
                node.location.child(Segment::Value(Arc::clone(extractor.name()))),
                target,
            );
            child.constraints = constraints;
            node.children.push(ChildNode {
                wrapper: CriterionWrapper::Extracted(Arc::clone(extractor)),
                node: child,
            });
        }

        for (segment, wrapper, nested) in nested_positions(ty) {
            let child = self.build_position(node.location.child(segment), nested)?;
            if !child.is_empty() {
                node.children.push(ChildNode {
                    wrapper,
                    node: child,
                });
            }
        }

        Ok(node)
    }

    fn resolve(
        &self,
        declaration: &ConstraintDeclaration,
    ) -> Result<Arc<Constraint>, AnalysisError> {
        let metadata = self.catalog.resolve(declaration.kind())?;
        self.constraints.intern(metadata, declaration.attributes())
    }

    fn find_extractor(
        &self,
        constraint: &Constraint,
        ty: &TypeDescriptor,
    ) -> Option<(usize, TypeDescriptor)> {
        self.extractors
            .iter()
            .enumerate()
            .find_map(|(index, extractor)| {
                extractor
                    .resolve(ty)
                    .filter(|target| constraint.metadata().applies_to(target))
                    .map(|target| (index, target))
            })
    }

    fn cascade_target(
        &self,
        location: &Location,
        ty: &TypeDescriptor,
    ) -> Result<Arc<str>, AnalysisError> {
        let class = ty.class_name().ok_or_else(|| AnalysisError::InvalidCascade {
            location: location.to_string(),
            ty: ty.to_string(),
        })?;
        if !(self.is_registered)(&**class) {
            return Err(AnalysisError::unknown_class(&**class));
        }
        Ok(Arc::clone(class))
    }
}

fn declarations(
    annotation: &Annotation,
) -> impl Iterator<Item = &ConstraintDeclaration> {
    match annotation {
        Annotation::Constraint(declaration) => std::slice::from_ref(declaration).iter(),
        Annotation::ConstraintList(list) => list.iter(),
        Annotation::Cascade | Annotation::Other(_) => (&[] as &[ConstraintDeclaration]).iter(),
    }
}

/// Type positions nested in `ty` that may carry their own constraints.
fn nested_positions(ty: &TypeDescriptor) -> Vec<(Segment, CriterionWrapper, &AnnotatedType)> {
    match ty {
        TypeDescriptor::Array(element) => {
            vec![(Segment::Element, CriterionWrapper::ArrayElement, &**element)]
        }
        TypeDescriptor::Iterable(_, element) => {
            vec![(Segment::Element, CriterionWrapper::IterableElement, &**element)]
        }
        TypeDescriptor::Map(key, value) => vec![
            (Segment::MapKey, CriterionWrapper::MapKey, &**key),
            (Segment::MapValue, CriterionWrapper::MapValue, &**value),
        ],
        TypeDescriptor::Optional(inner) => vec![(
            Segment::Value("value".into()),
            CriterionWrapper::OptionalValue,
            &**inner,
        )],
        _ => Vec::new(),
    }
}
