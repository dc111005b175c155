//! `domain`: membership in a union of intervals and enumerations
//!
//! The `value` attribute is an expression such as `(,0]|[10,20)|{42,64}`:
//! alternatives separated by `|`, each either an interval with inclusive
//! `[ ]` or exclusive `( )` ends (an empty end is unbounded) or an
//! enumeration of values in braces.

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, LazyLock};

use super::Catalog;
use super::numeric::{Failing, Number, numeric_criterion};
use crate::constraint::{ConstraintMetadata, factory};
use crate::error::AnalysisError;
use crate::foundation::TypeDescriptor;

static INTERVAL: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^([\[(])\s*([^,\s]*)\s*,\s*([^\])\s]*)\s*([\])])$").unwrap()
});

static ENUMERATION: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\{([^{}]*)\}$").unwrap());

// ============================================================================
// DOMAIN
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bound {
    value: Number,
    inclusive: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Interval {
        low: Option<Bound>,
        high: Option<Bound>,
    },
    Values(Vec<Number>),
}

impl Part {
    fn contains(&self, n: Number) -> bool {
        match self {
            Self::Interval { low, high } => {
                let above = low.is_none_or(|b| match n.compare(b.value) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => b.inclusive,
                    _ => false,
                });
                let below = high.is_none_or(|b| match n.compare(b.value) {
                    Some(Ordering::Less) => true,
                    Some(Ordering::Equal) => b.inclusive,
                    _ => false,
                });
                above && below
            }
            Self::Values(values) => values
                .iter()
                .any(|v| n.compare(*v) == Some(Ordering::Equal)),
        }
    }
}

/// A parsed domain expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    expression: Arc<str>,
    parts: Vec<Part>,
}

impl Domain {
    /// Parses an expression; the error is a human-readable reason.
    ///
    /// # Errors
    ///
    /// Returns the reason the expression is malformed.
    pub fn parse(expression: &str) -> Result<Self, String> {
        if expression.trim().is_empty() {
            return Err("expression is empty".to_owned());
        }
        let parts = expression
            .split('|')
            .map(|part| parse_part(part.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            expression: Arc::from(expression),
            parts,
        })
    }

    #[must_use]
    pub fn contains(&self, n: Number) -> bool {
        self.parts.iter().any(|part| part.contains(n))
    }

    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn parse_part(part: &str) -> Result<Part, String> {
    if part.is_empty() {
        return Err("empty alternative".to_owned());
    }

    if let Some(caps) = ENUMERATION.captures(part) {
        let values = caps[1]
            .split(',')
            .map(|item| parse_number(item.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Part::Values(values));
    }

    let caps = INTERVAL
        .captures(part)
        .ok_or_else(|| format!("'{part}' is neither an interval nor an enumeration"))?;
    let low = parse_bound(&caps[2], &caps[1] == "[")?;
    let high = parse_bound(&caps[3], &caps[4] == "]")?;

    if let (Some(l), Some(h)) = (low, high) {
        let empty = match l.value.compare(h.value) {
            Some(Ordering::Less) => false,
            Some(Ordering::Equal) => !(l.inclusive && h.inclusive),
            _ => true,
        };
        if empty {
            return Err(format!("interval '{part}' is empty"));
        }
    }
    Ok(Part::Interval { low, high })
}

fn parse_bound(text: &str, inclusive: bool) -> Result<Option<Bound>, String> {
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(Bound {
        value: parse_number(text)?,
        inclusive,
    }))
}

fn parse_number(text: &str) -> Result<Number, String> {
    if let Ok(v) = text.parse::<i64>() {
        return Ok(Number::Int(v));
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Number::Float(v)),
        _ => Err(format!("'{text}' is not a number")),
    }
}

// ============================================================================
// REGISTRATION
// ============================================================================

pub(super) fn register(catalog: &mut Catalog) -> Result<(), AnalysisError> {
    catalog.register(
        ConstraintMetadata::builder("domain")
            .required("value")
            .message("must be in {value}")
            .factory(factory(TypeDescriptor::is_numeric, |node, constraint| {
                let expression = constraint.str("value")?;
                let domain = Domain::parse(expression)
                    .map_err(|reason| AnalysisError::malformed(constraint.kind(), expression, reason))?;
                let failing = Failing::new(constraint, "must be in {value}").param("value", &domain);
                numeric_criterion(node, Arc::new(move |n: Number| domain.contains(n)), failing)
            }))
            .build()?,
    )?;
    Ok(())
}
