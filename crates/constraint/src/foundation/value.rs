//! Dynamic instance representation validated by compiled criteria.
//!
//! [`Value`] keeps scalars unboxed in their own variants, so primitive
//! criteria read them with [`Primitive::from_value`] without any conversion.
//! JSON documents convert directly:
//!
//! ```rust,ignore
//! use nebula_constraint::foundation::{ObjectValue, Value};
//! use serde_json::json;
//!
//! let tags = Value::from(json!(["a", "b"]));
//! let user = ObjectValue::from_json("User", json!({"name": "alice", "age": 31}));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::types::PrimitiveKind;

// ============================================================================
// VALUE
// ============================================================================

/// A validated value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Arrays, lists and sets.
    List(Vec<Value>),
    /// Map entries in iteration order.
    Map(Vec<(Value, Value)>),
    Optional(Option<Box<Value>>),
    Object(ObjectValue),
}

/// Shared null used where a borrowed value is needed for an absent one.
pub(crate) static NULL: Value = Value::Null;

impl Value {
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Self>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn some(value: impl Into<Self>) -> Self {
        Self::Optional(Some(Box::new(value.into())))
    }

    #[must_use]
    pub const fn none() -> Self {
        Self::Optional(None)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the size of strings (in characters), lists and maps.
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::List(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Short name of the variant, used in type mismatch failures.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Char(_) => "char",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Optional(_) => "optional",
            Self::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")
            }
            Self::Optional(Some(inner)) => write!(f, "Optional[{inner}]"),
            Self::Optional(None) => f.write_str("Optional.empty"),
            Self::Object(object) => write!(f, "{}{{..}}", object.class()),
        }
    }
}

// ============================================================================
// OBJECT VALUE
// ============================================================================

/// An instance of a registered class: class name plus ordered field values.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    class: Arc<str>,
    fields: IndexMap<String, Value>,
}

impl ObjectValue {
    pub fn new(class: impl Into<Arc<str>>) -> Self {
        Self {
            class: class.into(),
            fields: IndexMap::new(),
        }
    }

    /// Sets a field value.
    #[must_use = "builder methods must be chained or built"]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds an instance from a JSON object; non-object JSON yields no fields.
    pub fn from_json(class: impl Into<Arc<str>>, json: serde_json::Value) -> Self {
        let mut object = Self::new(class);
        if let serde_json::Value::Object(map) = json {
            for (name, value) in map {
                object.fields.insert(name, Value::from(value));
            }
        }
        object
    }
}

impl From<ObjectValue> for Value {
    fn from(object: ObjectValue) -> Self {
        Self::Object(object)
    }
}

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Scalars that primitive-shaped criteria are defined over.
pub trait Primitive: Copy + Send + Sync + 'static + Into<Value> {
    const KIND: PrimitiveKind;

    /// Reads the scalar out of its matching variant.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! primitive {
    ($($ty:ty => $variant:ident, $kind:ident, $read:ident;)*) => {
        $(
            impl Primitive for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;

                #[inline]
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(*v),
                        other => $read(other),
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

/// Integral variants widen to `i64`.
const fn integral(value: &Value) -> Option<i64> {
    match value {
        Value::Byte(v) => Some(*v as i64),
        Value::Short(v) => Some(*v as i64),
        Value::Int(v) => Some(*v as i64),
        Value::Long(v) => Some(*v),
        _ => None,
    }
}

// Other integral variants are accepted when they fit, so values decoded from
// JSON (always `Long`) satisfy narrower declared kinds.
fn narrow<T: TryFrom<i64>>(value: &Value) -> Option<T> {
    integral(value).and_then(|v| T::try_from(v).ok())
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn floating<T: FloatFrom>(value: &Value) -> Option<T> {
    match value {
        Value::Float(v) => T::from_f64(f64::from(*v)),
        Value::Double(v) => T::from_f64(*v),
        other => integral(other).and_then(|v| T::from_f64(v as f64)),
    }
}

trait FloatFrom: Sized {
    fn from_f64(v: f64) -> Option<Self>;
}

impl FloatFrom for f32 {
    // A finite double outside the f32 range is a mismatch, not an infinity.
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(v: f64) -> Option<Self> {
        let narrowed = v as Self;
        (narrowed.is_finite() || !v.is_finite()).then_some(narrowed)
    }
}

impl FloatFrom for f64 {
    fn from_f64(v: f64) -> Option<Self> {
        Some(v)
    }
}

const fn exact<T>(_: &Value) -> Option<T> {
    None
}

primitive! {
    bool => Bool, Bool, exact;
    char => Char, Char, exact;
    i8 => Byte, Byte, narrow;
    i16 => Short, Short, narrow;
    i32 => Int, Int, narrow;
    i64 => Long, Long, narrow;
    f32 => Float, Float, floating;
    f64 => Double, Double, floating;
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Long)
                .or_else(|| n.as_f64().map(Self::Double))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (Self::String(k), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_round_through_their_variant() {
        assert_eq!(i32::from_value(&Value::Int(7)), Some(7));
        assert_eq!(i32::from_value(&Value::Long(7)), Some(7));
        assert_eq!(i8::from_value(&Value::Long(300)), None);
        assert_eq!(bool::from_value(&Value::Int(1)), None);
        assert_eq!(f64::from_value(&Value::from(1.5f64)), Some(1.5));
        assert_eq!(<bool as Primitive>::KIND, PrimitiveKind::Bool);
    }

    #[test]
    fn doubles_beyond_float_range_do_not_narrow() {
        assert_eq!(f32::from_value(&Value::Double(0.5)), Some(0.5));
        assert_eq!(f32::from_value(&Value::Double(1e40)), None);
        assert_eq!(f32::from_value(&Value::Double(-1e40)), None);
        assert_eq!(
            f32::from_value(&Value::Double(f64::INFINITY)),
            Some(f32::INFINITY)
        );
        assert_eq!(f64::from_value(&Value::Double(1e40)), Some(1e40));
    }

    #[test]
    fn json_numbers_prefer_integers() {
        assert_eq!(Value::from(json!(3)), Value::Long(3));
        assert_eq!(Value::from(json!(2.5)), Value::Double(2.5));
    }

    #[test]
    fn json_objects_become_string_keyed_maps() {
        let value = Value::from(json!({"a": [1, 2]}));
        assert_eq!(
            value,
            Value::Map(vec![(
                Value::from("a"),
                Value::List(vec![Value::Long(1), Value::Long(2)])
            )])
        );
    }

    #[test]
    fn object_from_json_keeps_field_order() {
        let user = ObjectValue::from_json("User", json!({"name": "alice", "age": 31}));
        assert_eq!(user.class(), "User");
        assert_eq!(user.field("age"), Some(&Value::Long(31)));
        let names: Vec<_> = user.fields().map(|(k, _)| k).collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn size_counts_characters() {
        assert_eq!(Value::from("héllo").size(), Some(5));
        assert_eq!(Value::list([1, 2, 3]).size(), Some(3));
        assert_eq!(Value::Int(1).size(), None);
    }
}
