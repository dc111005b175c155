//! Interning of resolved constraints

use std::sync::Arc;

use dashmap::DashMap;

use super::{Attributes, Constraint, ConstraintMetadata, assemble, resolve_attributes};
use crate::error::AnalysisError;

/// Combined constraints nest at most this deep.
const MAX_COMBINATION_DEPTH: usize = 32;

/// Interns [`Constraint`]s by kind and resolved attributes.
///
/// Two declarations that resolve to the same attributes share one instance,
/// and so one set of combined constraints. The cache is safe to share between
/// threads; a lost insertion race returns the winner's instance.
#[derive(Debug, Default)]
pub struct ConstraintCache {
    entries: DashMap<(Arc<str>, Attributes), Arc<Constraint>>,
}

impl ConstraintCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `declared` against `metadata` and returns the shared instance.
    ///
    /// # Errors
    ///
    /// Returns an [`AnalysisError`] if attributes do not match the kind's
    /// specification, a combined template cannot be instantiated, or
    /// combinations nest deeper than the engine allows (which happens when
    /// kinds combine each other in a cycle).
    pub fn intern(
        &self,
        metadata: &Arc<ConstraintMetadata>,
        declared: &Attributes,
    ) -> Result<Arc<Constraint>, AnalysisError> {
        self.intern_at(metadata, declared, 0)
    }

    fn intern_at(
        &self,
        metadata: &Arc<ConstraintMetadata>,
        declared: &Attributes,
        depth: usize,
    ) -> Result<Arc<Constraint>, AnalysisError> {
        if depth > MAX_COMBINATION_DEPTH {
            return Err(AnalysisError::invalid_definition(
                &**metadata.name(),
                format!("combined constraints nest deeper than {MAX_COMBINATION_DEPTH}"),
            ));
        }

        let attributes = resolve_attributes(metadata, declared)?;
        let key = (Arc::clone(metadata.name()), attributes);

        if let Some(existing) = self.entries.get(&key) {
            tracing::trace!(constraint = %existing.value(), "constraint cache hit");
            return Ok(Arc::clone(existing.value()));
        }

        let mut combined = Vec::with_capacity(metadata.combined().len());
        for template in metadata.combined() {
            let target_attributes = template.instantiate(metadata.name(), &key.1)?;
            combined.push(self.intern_at(template.target(), &target_attributes, depth + 1)?);
        }

        let constraint = assemble(Arc::clone(metadata), key.1.clone(), combined);
        let interned = self
            .entries
            .entry(key)
            .or_insert_with(|| Arc::new(constraint));
        Ok(Arc::clone(interned.value()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
