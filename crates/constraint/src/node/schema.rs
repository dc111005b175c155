//! Class schemas registered with the engine

use std::sync::Arc;

use crate::foundation::{AnnotatedType, Annotation, ObjectValue, Value};
use crate::wrapper::{Getter, PropertyAccessor, PropertySource};

/// A property of a class: its declared type with annotations, and how to read it.
#[derive(Clone)]
pub struct PropertySchema {
    pub name: Arc<str>,
    pub ty: AnnotatedType,
    getter: Option<Arc<Getter>>,
}

impl PropertySchema {
    #[must_use]
    pub const fn source(&self) -> PropertySource {
        if self.getter.is_some() {
            PropertySource::Getter
        } else {
            PropertySource::Field
        }
    }

    /// The accessor reading this property from an instance.
    #[must_use]
    pub fn accessor(&self) -> PropertyAccessor {
        match &self.getter {
            Some(getter) => PropertyAccessor::getter(Arc::clone(&self.name), Arc::clone(getter)),
            None => PropertyAccessor::field(Arc::clone(&self.name)),
        }
    }
}

impl std::fmt::Debug for PropertySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertySchema")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("source", &self.source())
            .finish()
    }
}

/// The static description of a class: its constraints and properties.
///
/// # Examples
///
/// ```rust,ignore
/// let user = ClassSchema::new("User")
///     .field("name", AnnotatedType::new(TypeDescriptor::String)
///         .constrained(ConstraintDeclaration::new("not_empty")))
///     .field("address", AnnotatedType::new(TypeDescriptor::class("Address")).cascaded());
/// ```
#[derive(Debug, Clone)]
#[must_use = "builder methods must be chained or built"]
pub struct ClassSchema {
    name: Arc<str>,
    annotations: Vec<Annotation>,
    properties: Vec<PropertySchema>,
}

impl ClassSchema {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Adds a class-level annotation.
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declares a stored field.
    pub fn field(mut self, name: impl Into<Arc<str>>, ty: AnnotatedType) -> Self {
        self.properties.push(PropertySchema {
            name: name.into(),
            ty,
            getter: None,
        });
        self
    }

    /// Declares a computed property.
    pub fn getter<F>(mut self, name: impl Into<Arc<str>>, ty: AnnotatedType, getter: F) -> Self
    where
        F: Fn(&ObjectValue) -> Value + Send + Sync + 'static,
    {
        self.properties.push(PropertySchema {
            name: name.into(),
            ty,
            getter: Some(Arc::new(getter)),
        });
        self
    }

    #[must_use]
    pub const fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertySchema] {
        &self.properties
    }

    /// Properties with one entry per name, in first-declaration order.
    ///
    /// When a name is declared both as a field and as a getter, the one from
    /// `preferred` wins; otherwise the first declaration wins.
    pub fn effective_properties(&self, preferred: PropertySource) -> Vec<&PropertySchema> {
        let mut out: Vec<&PropertySchema> = Vec::with_capacity(self.properties.len());
        for property in &self.properties {
            match out.iter_mut().find(|p| p.name == property.name) {
                Some(slot) => {
                    if slot.source() != preferred && property.source() == preferred {
                        *slot = property;
                    }
                }
                None => out.push(property),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::TypeDescriptor;

    #[test]
    fn preferred_source_wins_duplicates() {
        let schema = ClassSchema::new("User")
            .getter("name", AnnotatedType::new(TypeDescriptor::String), |_| {
                Value::from("computed")
            })
            .field("name", AnnotatedType::new(TypeDescriptor::String))
            .field("age", AnnotatedType::new(TypeDescriptor::Any));

        let fields = schema.effective_properties(PropertySource::Field);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].source(), PropertySource::Field);
        assert_eq!(&*fields[0].name, "name");

        let getters = schema.effective_properties(PropertySource::Getter);
        assert_eq!(getters[0].source(), PropertySource::Getter);
    }
}
