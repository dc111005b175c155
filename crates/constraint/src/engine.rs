//! The validation engine
//!
//! [`ValidationEngine`] owns every cache of one independently configured
//! validation context: the constraint catalog, the registered classes, the
//! interned constraints, the constrained trees and the compiled criteria.
//! Nothing is process-global, so several engines can coexist.
//!
//! Trees and criteria are built on first request and published with
//! insert-if-absent. Builds run outside any map lock; when two threads race
//! on the same root, both build and the first published result is returned
//! to both.
//!
//! ## Cascades
//!
//! A cascaded position compiles to a lazy criterion that holds a weak handle
//! to the engine and resolves the target class's compiled criterion on first
//! evaluation. Every [`Validator`] holds the engine, so the handle stays
//! live while any validator does. With [`EngineConfig::eager_cascade`] the
//! targets are compiled up front as well, tracking classes in progress so
//! cyclic class graphs terminate. Without it, the targets are still analysed
//! before the root is published, so a broken cascaded class is reported
//! when the root compiles and never while validating data.
//!
//! ```rust,ignore
//! let engine = ValidationEngine::builder()
//!     .catalog(Catalog::builtin()?)
//!     .class(ClassSchema::new("User").field(
//!         "name",
//!         AnnotatedType::new(TypeDescriptor::String)
//!             .constrained(ConstraintDeclaration::new("not_empty")),
//!     ))
//!     .build()?;
//!
//! let validator = engine.validator_for_class("User")?;
//! let user = ObjectValue::from_json("User", json!({ "name": "" }));
//! let failure = validator.validate(&user.into()).unwrap_err();
//! assert_eq!(failure.path_string(), "name");
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use dashmap::{DashMap, DashSet};

use crate::catalog::Catalog;
use crate::compiler::TreeCompiler;
use crate::config::EngineConfig;
use crate::constraint::{ConstraintCache, ConstraintMetadata};
use crate::criterion::Criterion;
use crate::error::AnalysisError;
use crate::foundation::{AnnotatedType, ValidationFailure, ValidationResult, Value};
use crate::node::{ClassSchema, ConstrainedNode, TreeBuilder};
use crate::wrapper::ValueExtractor;

// ============================================================================
// ROOT KEY
// ============================================================================

/// Identity of a compiled root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootKey {
    /// A registered class.
    Class(Arc<str>),
    /// A standalone annotated type, such as a method parameter.
    Type(AnnotatedType),
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => f.write_str(name),
            Self::Type(ty) => write!(f, "{ty}"),
        }
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// A compiled criterion for one root, cheap to clone and share across threads.
///
/// Keeps its engine alive, so cascades resolve for as long as the validator
/// exists.
#[derive(Debug, Clone)]
pub struct Validator {
    root: RootKey,
    criterion: Arc<Criterion<Value>>,
    engine: ValidationEngine,
}

impl Validator {
    /// Validates a value, returning the first failure.
    pub fn validate(&self, value: &Value) -> ValidationResult {
        self.criterion.validate(value)
    }

    #[must_use]
    pub const fn root(&self) -> &RootKey {
        &self.root
    }

    #[must_use]
    pub fn criterion(&self) -> &Criterion<Value> {
        &self.criterion
    }

    #[must_use]
    pub const fn engine(&self) -> &ValidationEngine {
        &self.engine
    }
}

// ============================================================================
// ENGINE
// ============================================================================

struct EngineState {
    config: EngineConfig,
    catalog: Catalog,
    extractors: Vec<Arc<ValueExtractor>>,
    classes: DashMap<Arc<str>, Arc<ClassSchema>>,
    constraints: ConstraintCache,
    trees: DashMap<RootKey, Arc<ConstrainedNode>>,
    compiled: DashMap<RootKey, Arc<Criterion<Value>>>,
    // Cascade targets checked for analysis errors without being compiled.
    analysed: DashSet<Arc<str>>,
}

/// Registry and cache owner for one validation context.
///
/// Cloning is cheap and yields a handle to the same engine.
#[derive(Clone)]
pub struct ValidationEngine {
    state: Arc<EngineState>,
}

impl ValidationEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    /// The interned constraint instances shared by every tree of this engine.
    #[must_use]
    pub fn constraints(&self) -> &ConstraintCache {
        &self.state.constraints
    }

    /// Registers a class schema.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::DuplicateClass`] if a class of the same name
    /// is already registered.
    pub fn register_class(&self, schema: ClassSchema) -> Result<(), AnalysisError> {
        let name = Arc::clone(schema.name());
        match self.state.classes.entry(Arc::clone(&name)) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(AnalysisError::DuplicateClass {
                    class: name.to_string(),
                });
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(schema));
            }
        }
        tracing::info!(class = %name, "registered class schema");
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, class: &str) -> bool {
        self.state.classes.contains_key(class)
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.state.classes.len()
    }

    /// The constrained tree of a registered class.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownClass`] for unregistered classes and
    /// any error found while building the tree.
    pub fn tree_for_class(&self, class: &str) -> Result<Arc<ConstrainedNode>, AnalysisError> {
        self.tree(&RootKey::Class(Arc::from(class)))
    }

    /// The constrained tree of a standalone annotated type.
    ///
    /// # Errors
    ///
    /// Returns any error found while building the tree.
    pub fn tree_for_type(&self, ty: &AnnotatedType) -> Result<Arc<ConstrainedNode>, AnalysisError> {
        self.tree(&RootKey::Type(ty.clone()))
    }

    /// The compiled validator of a registered class.
    ///
    /// # Errors
    ///
    /// Returns the first [`AnalysisError`] of the class or, with eager
    /// cascades, of any class it cascades into.
    pub fn validator_for_class(&self, class: &str) -> Result<Validator, AnalysisError> {
        self.validator(RootKey::Class(Arc::from(class)))
    }

    /// The compiled validator of a standalone annotated type.
    ///
    /// # Errors
    ///
    /// Returns the first [`AnalysisError`] of the type.
    pub fn validator_for_type(&self, ty: &AnnotatedType) -> Result<Validator, AnalysisError> {
        self.validator(RootKey::Type(ty.clone()))
    }

    /// Validates an object against the class it names.
    ///
    /// The outer result reports a broken schema, the inner one the data.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownClass`] for values that are not
    /// objects of a registered class, and any analysis error of the class.
    pub fn check(&self, value: &Value) -> Result<ValidationResult, AnalysisError> {
        let class = value
            .as_object()
            .map(|object| object.class())
            .ok_or_else(|| AnalysisError::unknown_class(value.kind_name()))?;
        Ok(self.validator_for_class(class)?.validate(value))
    }

    fn validator(&self, root: RootKey) -> Result<Validator, AnalysisError> {
        let criterion = self.compiled(&root, &mut HashSet::new())?;
        Ok(Validator {
            root,
            criterion,
            engine: self.clone(),
        })
    }

    fn tree(&self, key: &RootKey) -> Result<Arc<ConstrainedNode>, AnalysisError> {
        if let Some(tree) = self.state.trees.get(key) {
            tracing::trace!(root = %key, "constrained tree cache hit");
            return Ok(Arc::clone(tree.value()));
        }

        let is_registered = |class: &str| self.is_registered(class);
        let builder = TreeBuilder::new(
            &self.state.catalog,
            &self.state.constraints,
            &self.state.extractors,
            &self.state.config,
            &is_registered,
        );
        let tree = match key {
            RootKey::Class(class) => builder.build_class(&*self.schema(class)?)?,
            RootKey::Type(ty) => builder.build_type(ty)?,
        };

        let published = self
            .state
            .trees
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tree));
        Ok(Arc::clone(published.value()))
    }

    fn schema(&self, class: &str) -> Result<Arc<ClassSchema>, AnalysisError> {
        self.state
            .classes
            .get(class)
            .map(|schema| Arc::clone(schema.value()))
            .ok_or_else(|| AnalysisError::unknown_class(class))
    }

    fn compiled(
        &self,
        key: &RootKey,
        in_progress: &mut HashSet<Arc<str>>,
    ) -> Result<Arc<Criterion<Value>>, AnalysisError> {
        if let Some(criterion) = self.state.compiled.get(key) {
            tracing::trace!(root = %key, "compiled criterion cache hit");
            return Ok(Arc::clone(criterion.value()));
        }

        let tree = self.tree(key)?;
        if let RootKey::Class(class) = key {
            in_progress.insert(Arc::clone(class));
        }
        if self.state.config.eager_cascade {
            for class in tree.cascades() {
                if !in_progress.contains(&class) {
                    self.compiled(&RootKey::Class(class), in_progress)?;
                }
            }
        } else {
            self.analyse_cascades(&tree, in_progress)?;
        }

        let link = |class: &Arc<str>| -> Result<Criterion<Value>, AnalysisError> {
            Ok(self.cascade(class))
        };
        let criterion = Arc::new(TreeCompiler::new(&link).compile(&tree)?);

        let published = self
            .state
            .compiled
            .entry(key.clone())
            .or_insert(criterion);
        Ok(Arc::clone(published.value()))
    }

    /// Builds and compiles every class reachable through the cascades of
    /// `tree`, discarding the criteria, so their analysis errors surface now.
    fn analyse_cascades(
        &self,
        tree: &ConstrainedNode,
        seen: &mut HashSet<Arc<str>>,
    ) -> Result<(), AnalysisError> {
        let unlinked = |_: &Arc<str>| -> Result<Criterion<Value>, AnalysisError> {
            Ok(Criterion::truth())
        };
        for class in tree.cascades() {
            if self.state.analysed.contains(&class) || !seen.insert(Arc::clone(&class)) {
                continue;
            }
            let key = RootKey::Class(Arc::clone(&class));
            let target = self.tree(&key)?;
            if !self.state.compiled.contains_key(&key) {
                TreeCompiler::new(&unlinked).compile(&target)?;
            }
            self.analyse_cascades(&target, seen)?;
            tracing::trace!(class = %class, "analysed cascade target");
            self.state.analysed.insert(class);
        }
        Ok(())
    }

    /// A criterion validating non-null values against `class`, resolved on
    /// first evaluation.
    fn cascade(&self, class: &Arc<str>) -> Criterion<Value> {
        let engine = Arc::downgrade(&self.state);
        let class = Arc::clone(class);
        // Weak, so a self-referential class does not keep its own criterion alive.
        let resolved: OnceLock<Weak<Criterion<Value>>> = OnceLock::new();

        Criterion::leaf(move |value: &Value| {
            if value.is_null() {
                return Ok(());
            }
            if let Some(criterion) = resolved.get().and_then(Weak::upgrade) {
                return criterion.validate(value);
            }

            // Only reachable through a criterion cloned out of its validator.
            let Some(state) = engine.upgrade() else {
                tracing::warn!(class = %class, "cascade evaluated after its engine was dropped");
                return Err(ValidationFailure::new(
                    "cascade_unavailable",
                    "cascaded class {class} cannot be resolved: its engine was dropped",
                    value.clone(),
                )
                .with_param("class", class.to_string()));
            };
            let engine = Self { state };
            match engine.compiled(&RootKey::Class(Arc::clone(&class)), &mut HashSet::new()) {
                Ok(criterion) => {
                    let _ = resolved.set(Arc::downgrade(&criterion));
                    criterion.validate(value)
                }
                Err(error) => {
                    tracing::error!(class = %class, %error, "cascaded class cannot be compiled");
                    Err(ValidationFailure::new(
                        "analysis_error",
                        "cascaded class {class} cannot be compiled: {error}",
                        value.clone(),
                    )
                    .with_param("class", class.to_string())
                    .with_param("error", error.to_string()))
                }
            }
        })
    }
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("config", &self.state.config)
            .field("constraint_kinds", &self.state.catalog.len())
            .field("classes", &self.state.classes.len())
            .field("trees", &self.state.trees.len())
            .field("compiled", &self.state.compiled.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builder for [`ValidationEngine`].
///
/// Starts with an empty catalog and the `value` (`OptionalInt` and friends)
/// and `optional` extractors.
#[must_use = "builder methods must be chained or built"]
pub struct EngineBuilder {
    config: EngineConfig,
    catalog: Catalog,
    constraints: Vec<ConstraintMetadata>,
    extractors: Vec<Arc<ValueExtractor>>,
    classes: Vec<ClassSchema>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            catalog: Catalog::new(),
            constraints: Vec::new(),
            extractors: vec![
                Arc::new(ValueExtractor::optional_primitive()),
                Arc::new(ValueExtractor::optional()),
            ],
            classes: Vec::new(),
        }
    }
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the catalog; constraints added with [`Self::constraint`] are
    /// registered on top of it.
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn constraint(mut self, metadata: ConstraintMetadata) -> Self {
        self.constraints.push(metadata);
        self
    }

    /// Adds a value extractor, tried after the ones already present.
    pub fn extractor(mut self, extractor: ValueExtractor) -> Self {
        self.extractors.push(Arc::new(extractor));
        self
    }

    pub fn class(mut self, schema: ClassSchema) -> Self {
        self.classes.push(schema);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidDefinition`] for a duplicate constraint
    /// kind and [`AnalysisError::DuplicateClass`] for a duplicate class.
    pub fn build(self) -> Result<ValidationEngine, AnalysisError> {
        let mut catalog = self.catalog;
        for metadata in self.constraints {
            catalog.register(metadata)?;
        }

        let engine = ValidationEngine {
            state: Arc::new(EngineState {
                config: self.config,
                catalog,
                extractors: self.extractors,
                classes: DashMap::new(),
                constraints: ConstraintCache::new(),
                trees: DashMap::new(),
                compiled: DashMap::new(),
                analysed: DashSet::new(),
            }),
        };
        for schema in self.classes {
            engine.register_class(schema)?;
        }

        tracing::debug!(
            constraint_kinds = engine.state.catalog.len(),
            classes = engine.class_count(),
            "built validation engine"
        );
        Ok(engine)
    }
}

#[cfg(all(test, feature = "builtin"))]
mod tests {
    use super::*;
    use crate::constraint::ConstraintDeclaration;
    use crate::foundation::{ObjectValue, TypeDescriptor};
    use pretty_assertions::assert_eq;

    fn person() -> ClassSchema {
        ClassSchema::new("Person")
            .field(
                "name",
                AnnotatedType::new(TypeDescriptor::String)
                    .constrained(ConstraintDeclaration::new("not_empty")),
            )
            .field(
                "friend",
                AnnotatedType::new(TypeDescriptor::class("Person")).cascaded(),
            )
    }

    fn engine(config: EngineConfig) -> ValidationEngine {
        ValidationEngine::builder()
            .config(config)
            .catalog(Catalog::builtin().unwrap())
            .class(person())
            .build()
            .unwrap()
    }

    fn named(name: &str) -> ObjectValue {
        ObjectValue::new("Person").with("name", name)
    }

    #[test]
    fn self_referential_class_compiles_and_validates() {
        for eager in [true, false] {
            let engine = engine(EngineConfig::default().with_eager_cascade(eager));
            let validator = engine.validator_for_class("Person").unwrap();

            let ok = named("ann").with("friend", named("bob"));
            assert!(validator.validate(&ok.into()).is_ok());

            let bad = named("ann").with("friend", named("bob").with("friend", named("")));
            let failure = validator.validate(&bad.into()).unwrap_err();
            assert_eq!(failure.path_string(), "friend.friend.name");
            assert_eq!(failure.interpolate(), "must not be empty");
        }
    }

    #[test]
    fn trees_and_criteria_are_cached() {
        let engine = engine(EngineConfig::default());
        let first = engine.tree_for_class("Person").unwrap();
        let second = engine.tree_for_class("Person").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let a = engine.validator_for_class("Person").unwrap();
        let b = engine.validator_for_class("Person").unwrap();
        assert!(Arc::ptr_eq(&a.criterion, &b.criterion));
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let engine = engine(EngineConfig::default());
        let err = engine.register_class(person()).unwrap_err();
        assert_eq!(err.code(), "duplicate_class");
    }

    #[test]
    fn cascade_into_unregistered_class_fails_analysis() {
        let engine = ValidationEngine::builder()
            .catalog(Catalog::builtin().unwrap())
            .class(ClassSchema::new("Order").field(
                "customer",
                AnnotatedType::new(TypeDescriptor::class("Customer")).cascaded(),
            ))
            .build()
            .unwrap();
        let err = engine.validator_for_class("Order").unwrap_err();
        assert_eq!(err, AnalysisError::unknown_class("Customer"));
    }

    #[test]
    fn check_dispatches_on_the_object_class() {
        let engine = engine(EngineConfig::default());
        assert!(engine.check(&named("x").into()).unwrap().is_ok());
        assert!(engine.check(&named("").into()).unwrap().is_err());
        assert!(engine.check(&Value::from("not an object")).is_err());
    }

    #[test]
    fn validators_keep_their_engine_alive() {
        let validator = {
            let engine = engine(EngineConfig::default().with_eager_cascade(false));
            engine.validator_for_class("Person").unwrap()
        };
        let bad = named("ann").with("friend", named(""));
        let failure = validator.validate(&bad.into()).unwrap_err();
        assert_eq!(failure.path_string(), "friend.name");
        assert_eq!(validator.engine().class_count(), 1);
    }

    #[test]
    fn detached_cascade_fails_instead_of_passing() {
        let criterion = {
            let engine = engine(EngineConfig::default().with_eager_cascade(false));
            engine.validator_for_class("Person").unwrap().criterion().clone()
        };
        let bad = named("ann").with("friend", named(""));
        let failure = criterion.validate(&bad.into()).unwrap_err();
        assert_eq!(failure.code, "cascade_unavailable");
        assert_eq!(failure.path_string(), "friend");
    }

    #[test]
    fn lazy_cascades_still_report_broken_targets() {
        let broken = ClassSchema::new("Broken").field(
            "label",
            AnnotatedType::new(TypeDescriptor::String)
                .constrained(ConstraintDeclaration::new("positive")),
        );
        let holder = ClassSchema::new("Holder").field(
            "inner",
            AnnotatedType::new(TypeDescriptor::class("Broken")).cascaded(),
        );
        for eager in [true, false] {
            let engine = ValidationEngine::builder()
                .config(EngineConfig::default().with_eager_cascade(eager))
                .catalog(Catalog::builtin().unwrap())
                .class(broken.clone())
                .class(holder.clone())
                .build()
                .unwrap();
            let err = engine.validator_for_class("Holder").unwrap_err();
            assert_eq!(err.code(), "no_value_extractor");
        }
    }

    #[test]
    fn lazy_analysis_does_not_compile_targets() {
        let engine = engine(EngineConfig::default().with_eager_cascade(false));
        let holder = AnnotatedType::new(TypeDescriptor::class("Person")).cascaded();
        engine.validator_for_type(&holder).unwrap();
        assert!(engine.state.analysed.contains("Person"));
        assert!(!engine.state.compiled.contains_key(&RootKey::Class(Arc::from("Person"))));
    }
}
