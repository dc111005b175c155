//! Property access on object values

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::value::NULL;
use crate::foundation::{ObjectValue, Value};

/// Computes a property from an object, the way a getter method would.
pub type Getter = dyn Fn(&ObjectValue) -> Value + Send + Sync;

/// Where a property's value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertySource {
    /// The stored field of the same name.
    #[default]
    Field,
    /// A computed getter.
    Getter,
}

/// Reads one property of an [`ObjectValue`].
#[derive(Clone)]
pub struct PropertyAccessor {
    name: Arc<str>,
    getter: Option<Arc<Getter>>,
}

impl PropertyAccessor {
    /// Reads the stored field `name`.
    pub fn field(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            getter: None,
        }
    }

    /// Computes property `name` with `getter`.
    pub fn getter(name: impl Into<Arc<str>>, getter: Arc<Getter>) -> Self {
        Self {
            name: name.into(),
            getter: Some(getter),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[must_use]
    pub const fn source(&self) -> PropertySource {
        if self.getter.is_some() {
            PropertySource::Getter
        } else {
            PropertySource::Field
        }
    }

    /// Reads the property. A missing field reads as null.
    #[must_use]
    pub fn get<'a>(&self, object: &'a ObjectValue) -> Cow<'a, Value> {
        match &self.getter {
            Some(getter) => Cow::Owned(getter(object)),
            None => Cow::Borrowed(object.field(&self.name).unwrap_or(&NULL)),
        }
    }
}

impl fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("name", &self.name)
            .field("source", &self.source())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_reads_as_null() {
        let object = ObjectValue::new("User").with("name", "alice");
        assert_eq!(
            *PropertyAccessor::field("name").get(&object),
            Value::from("alice")
        );
        assert!(PropertyAccessor::field("age").get(&object).is_null());
    }

    #[test]
    fn getter_computes_from_fields() {
        let length = PropertyAccessor::getter(
            "name_length",
            Arc::new(|o: &ObjectValue| {
                Value::from(o.field("name").and_then(Value::size).unwrap_or(0) as i64)
            }),
        );
        let object = ObjectValue::new("User").with("name", "bob");
        assert_eq!(*length.get(&object), Value::Long(3));
        assert_eq!(length.source(), PropertySource::Getter);
    }
}
