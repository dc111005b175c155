//! Ordered AND aggregate of criteria

use super::Criterion;
use crate::foundation::ValidationResult;

/// An ordered list of criteria evaluated left to right.
///
/// Evaluation stops at the first failing member. Pushing never reorders:
/// insertion order is evaluation order, and [`simplify`](Self::simplify)
/// preserves it.
pub struct Criteria<T: 'static> {
    members: Vec<Criterion<T>>,
}

impl<T: 'static> Criteria<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            members: Vec::with_capacity(capacity),
        }
    }

    /// Appends a criterion at the end.
    pub fn push(&mut self, criterion: Criterion<T>) {
        self.members.push(criterion);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Criterion<T>> {
        self.members.iter()
    }

    /// Evaluates members in order, returning the first failure.
    pub fn validate(&self, input: &T) -> ValidationResult {
        for member in &self.members {
            member.validate(input)?;
        }
        Ok(())
    }

    /// Produces an equivalent criterion without nested aggregates or truths.
    #[must_use]
    pub fn simplify(self) -> Criterion<T> {
        let mut flat = Vec::with_capacity(self.members.len());
        for member in self.members {
            flatten_into(member, &mut flat);
        }

        match flat.len() {
            0 => Criterion::Truth,
            1 => flat.pop().unwrap_or(Criterion::Truth),
            _ => Criterion::Criteria(Self { members: flat }),
        }
    }
}

fn flatten_into<T: 'static>(criterion: Criterion<T>, out: &mut Vec<Criterion<T>>) {
    match criterion {
        Criterion::Truth => {}
        Criterion::Criteria(nested) => {
            for member in nested.members {
                flatten_into(member, out);
            }
        }
        // An enhancer scopes its inner criterion, so it stays one member.
        Criterion::Enhanced { inner, enhancer } => match inner.simplify() {
            Criterion::Truth => {}
            inner => out.push(Criterion::Enhanced {
                inner: Box::new(inner),
                enhancer,
            }),
        },
        leaf @ Criterion::Leaf(_) => out.push(leaf),
    }
}

impl<T: 'static> Default for Criteria<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Clone for Criteria<T> {
    fn clone(&self) -> Self {
        Self {
            members: self.members.clone(),
        }
    }
}

impl<T: 'static> PartialEq for Criteria<T> {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl<T: 'static> FromIterator<Criterion<T>> for Criteria<T> {
    fn from_iter<I: IntoIterator<Item = Criterion<T>>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl<T: 'static> Extend<Criterion<T>> for Criteria<T> {
    fn extend<I: IntoIterator<Item = Criterion<T>>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

impl<T: 'static> IntoIterator for Criteria<T> {
    type Item = Criterion<T>;
    type IntoIter = std::vec::IntoIter<Criterion<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a, T: 'static> IntoIterator for &'a Criteria<T> {
    type Item = &'a Criterion<T>;
    type IntoIter = std::slice::Iter<'a, Criterion<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
