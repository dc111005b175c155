//! Catalog of constraint kinds
//!
//! The [`Catalog`] maps kind names to their [`ConstraintMetadata`]. Tree
//! building resolves every [`ConstraintDeclaration`](crate::constraint::ConstraintDeclaration)
//! through it, so an unknown kind is an analysis error at build time.
//!
//! With the `builtin` feature, [`Catalog::builtin`] returns a catalog holding
//! the standard kinds:
//!
//! | kind        | applies to                      |
//! |-------------|---------------------------------|
//! | `not_null`  | reference types                 |
//! | `positive`  | numeric primitives and boxes    |
//! | `min`/`max` | numeric primitives and boxes    |
//! | `range`     | numeric (combines `min`, `max`) |
//! | `size`      | strings, arrays, iterables, maps |
//! | `not_empty` | sized types (combines `not_null`, `size`) |
//! | `domain`    | numeric primitives and boxes    |
//! | `id_card`   | strings                         |

#[cfg(feature = "builtin")]
mod domain;
#[cfg(feature = "builtin")]
mod id_card;
#[cfg(feature = "builtin")]
mod numeric;
#[cfg(feature = "builtin")]
mod presence;
#[cfg(feature = "builtin")]
mod size;

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "builtin")]
pub use domain::Domain;
#[cfg(feature = "builtin")]
pub use id_card::Region;
#[cfg(feature = "builtin")]
pub use numeric::Number;

use crate::constraint::ConstraintMetadata;
use crate::error::AnalysisError;

/// Registry of constraint kinds, keyed by name.
///
/// A catalog is assembled before the engine is built and is read-only
/// afterwards.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    kinds: HashMap<Arc<str>, Arc<ConstraintMetadata>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog of built-in kinds.
    ///
    /// # Errors
    ///
    /// Returns an [`AnalysisError`] only if a built-in definition is
    /// inconsistent.
    #[cfg(feature = "builtin")]
    pub fn builtin() -> Result<Self, AnalysisError> {
        let mut catalog = Self::new();
        numeric::register(&mut catalog)?;
        size::register(&mut catalog)?;
        presence::register(&mut catalog)?;
        domain::register(&mut catalog)?;
        id_card::register(&mut catalog)?;
        Ok(catalog)
    }

    /// Registers a constraint kind and returns the shared handle, so other
    /// kinds can combine it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidDefinition`] if a kind with the same
    /// name is already registered.
    pub fn register(
        &mut self,
        metadata: impl Into<Arc<ConstraintMetadata>>,
    ) -> Result<Arc<ConstraintMetadata>, AnalysisError> {
        let metadata = metadata.into();
        let name = Arc::clone(metadata.name());
        if self.kinds.contains_key(&name) {
            return Err(AnalysisError::invalid_definition(
                &*name,
                "constraint kind is already registered",
            ));
        }
        self.kinds.insert(Arc::clone(&name), Arc::clone(&metadata));
        tracing::info!(constraint = %name, "registered constraint kind");
        Ok(metadata)
    }

    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&Arc<ConstraintMetadata>> {
        self.kinds.get(kind)
    }

    /// Looks a kind up for a declaration.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownConstraint`] if the kind is not registered.
    pub fn resolve(&self, kind: &str) -> Result<&Arc<ConstraintMetadata>, AnalysisError> {
        self.get(kind)
            .ok_or_else(|| AnalysisError::unknown_constraint(kind))
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered kind names, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<Arc<str>> {
        let mut kinds: Vec<_> = self.kinds.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}
