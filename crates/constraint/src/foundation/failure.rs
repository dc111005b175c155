//! Validation failures
//!
//! A [`ValidationFailure`] is the value a criterion returns when a checked
//! value does not satisfy it. It is never thrown: it travels outward through
//! the criterion wrappers as the `Err` side of a `Result`, and every wrapper
//! it passes records an [`Indicator`] (property name, index or map key).
//!
//! Message rendering is left to the caller; the failure carries the message
//! template and the variables that belong to it.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::value::Value;

// ============================================================================
// INDICATOR
// ============================================================================

/// One segment of a failure's location trail.
#[derive(Debug, Clone, PartialEq)]
pub enum Indicator {
    /// A property of an object.
    Property(Arc<str>),
    /// A 0-based position in an array or iterable.
    Index(usize),
    /// A map key. Used for both key and value failures.
    Key(Value),
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => write!(f, "[{key}]"),
        }
    }
}

// ============================================================================
// VALIDATION FAILURE
// ============================================================================

/// A structured validation failure.
///
/// # Examples
///
/// ```rust,ignore
/// use nebula_constraint::foundation::{Indicator, ValidationFailure, Value};
///
/// let failure = ValidationFailure::new("positive", "must be greater than 0", Value::Int(-2))
///     .with_param("value", "0")
///     .indicated(Indicator::Index(1))
///     .indicated(Indicator::Property("scores".into()));
///
/// assert_eq!(failure.path_string(), "scores[1]");
/// ```
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    /// Kind of the constraint whose check failed, e.g. `"size"`.
    pub code: Cow<'static, str>,

    /// Unformatted message template, e.g. `"size must be between {min} and {max}"`.
    pub template: Cow<'static, str>,

    /// Variables for the message template.
    pub params: Vec<(Cow<'static, str>, Cow<'static, str>)>,

    /// The offending value.
    pub value: Value,

    /// Location trail, innermost indicator first.
    indicators: SmallVec<[Indicator; 2]>,
}

impl ValidationFailure {
    /// Creates a failure for `value` with a code and message template.
    pub fn new(
        code: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            code: code.into(),
            template: template.into(),
            params: Vec::new(),
            value: value.into(),
            indicators: SmallVec::new(),
        }
    }

    /// Creates a "type_mismatch" failure: the instance does not have the
    /// shape its declared type promises.
    pub fn type_mismatch(expected: impl fmt::Display, actual: &Value) -> Self {
        Self::new(
            "type_mismatch",
            "expected {expected}, found {actual}",
            actual.clone(),
        )
        .with_param("expected", expected.to_string())
        .with_param("actual", actual.kind_name())
    }

    /// Adds a template variable, replacing an existing one with the same key.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_param(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.set_param(key.into(), value.into());
        self
    }

    /// Replaces the message template.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_template(mut self, template: impl Into<Cow<'static, str>>) -> Self {
        self.template = template.into();
        self
    }

    /// Records the next outer location segment.
    #[must_use = "builder methods must be chained or built"]
    pub fn indicated(mut self, indicator: Indicator) -> Self {
        self.indicators.push(indicator);
        self
    }

    fn set_param(&mut self, key: Cow<'static, str>, value: Cow<'static, str>) {
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    /// Looks up a template variable by key.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| &**v)
    }

    /// Iterates the location trail from the validated root to the failure site.
    pub fn path(&self) -> impl DoubleEndedIterator<Item = &Indicator> {
        self.indicators.iter().rev()
    }

    /// Renders the location trail as `address.lines[1]`.
    #[must_use]
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for indicator in self.path() {
            if let Indicator::Property(name) = indicator {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            } else {
                out.push_str(&indicator.to_string());
            }
        }
        out
    }

    /// Substitutes `{name}` placeholders of the template with the params.
    ///
    /// Unknown placeholders are left as they are.
    #[must_use]
    pub fn interpolate(&self) -> String {
        let mut out = self.template.to_string();
        for (key, value) in &self.params {
            out = out.replace(&format!("{{{key}}}"), value);
        }
        out
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indicators.is_empty() {
            write!(f, "{}: {}", self.code, self.template)?;
        } else {
            write!(f, "[{}] {}: {}", self.path_string(), self.code, self.template)?;
        }

        if !self.params.is_empty() {
            write!(f, " (params: [")?;
            for (i, (k, v)) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k}={v}")?;
            }
            write!(f, "])")?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}
