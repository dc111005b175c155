//! Compiles constrained node trees into criteria
//!
//! Compilation is bucketed by constraint order. Every constraint of every
//! node is a work item; unordered items run first, then each distinct order
//! value in ascending order, tree pre-order within a bucket. A node's
//! criteria accumulate in its own aggregate. After each bucket, every node
//! whose items are all processed and whose children are all absorbed is
//! finished (cascade appended, simplified), wrapped for its parent and
//! pushed into the parent's aggregate. So a child finished in an early
//! bucket is checked before a parent constraint of a later bucket. A cascade
//! counts as an unordered item of its node: a child holding only a cascade
//! is absorbed after its parent's unordered constraints, like any child with
//! unordered constraints of its own.
//!
//! ```rust,ignore
//! let compiler = TreeCompiler::new(&|class| engine.cascade(class));
//! let criterion = compiler.compile(&tree)?;
//! criterion.validate(&value)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constraint::{Constraint, process};
use crate::criterion::{AnyCriteria, AnyCriterion, Criterion};
use crate::error::AnalysisError;
use crate::foundation::Value;
use crate::node::ConstrainedNode;
use crate::wrapper::CriterionWrapper;

/// Produces the criterion that validates an instance of a cascaded class.
pub type CascadeLinker<'a> = dyn Fn(&Arc<str>) -> Result<Criterion<Value>, AnalysisError> + 'a;

/// One node of the tree being compiled.
struct Slot<'t> {
    node: &'t ConstrainedNode,
    parent: Option<(usize, &'t CriterionWrapper)>,
    unit: AnyCriteria,
    pending_items: usize,
    pending_children: usize,
    absorbed: bool,
}

/// Compiles trees into a single criterion per root.
pub struct TreeCompiler<'a> {
    link_cascade: &'a CascadeLinker<'a>,
}

impl<'a> TreeCompiler<'a> {
    pub fn new(link_cascade: &'a CascadeLinker<'a>) -> Self {
        Self { link_cascade }
    }

    /// Compiles `root` into a criterion over dynamic values.
    ///
    /// # Errors
    ///
    /// Returns the first [`AnalysisError`] raised by a constraint, a wrapper
    /// or the cascade linker.
    pub fn compile(&self, root: &ConstrainedNode) -> Result<Criterion<Value>, AnalysisError> {
        let mut slots = Vec::with_capacity(root.node_count());
        flatten(root, None, &mut slots);

        let mut buckets: BTreeMap<Option<i32>, Vec<(usize, &Arc<Constraint>)>> = BTreeMap::new();
        for (index, node) in slots.iter().map(|slot| slot.node).enumerate() {
            for constraint in node.constraints() {
                buckets
                    .entry(constraint.order())
                    .or_default()
                    .push((index, constraint));
            }
        }
        let bucket_count = buckets.len();
        // Cascades are unordered work, so the unordered pass always runs.
        buckets.entry(None).or_default();

        for (order, items) in buckets {
            tracing::trace!(?order, items = items.len(), "compiling order bucket");
            for (index, constraint) in items {
                let slot = &mut slots[index];
                slot.unit.push(process(slot.node, constraint)?)?;
                slot.pending_items -= 1;
            }
            self.propagate(&mut slots)?;
        }

        let criterion = self.finish(&mut slots[0])?.into_value_criterion();
        tracing::debug!(
            root = %root.location(),
            nodes = slots.len(),
            buckets = bucket_count,
            leaves = criterion.leaf_count(),
            "compiled constrained tree"
        );
        Ok(criterion)
    }

    /// Absorbs every finished non-root node into its parent, children first.
    fn propagate(&self, slots: &mut [Slot<'_>]) -> Result<(), AnalysisError> {
        // Pre-order places children after their parent, so a reverse sweep
        // finishes a whole ready subtree in one pass.
        for index in (1..slots.len()).rev() {
            let slot = &mut slots[index];
            if slot.absorbed || slot.pending_items > 0 || slot.pending_children > 0 {
                continue;
            }
            let Some((parent, wrapper)) = slot.parent else {
                continue;
            };
            let criterion = self.finish(slot)?;
            slot.absorbed = true;

            let wrapped = wrapper.wrap(criterion)?;
            let parent = &mut slots[parent];
            parent.unit.push(AnyCriterion::Object(wrapped))?;
            parent.pending_children -= 1;
        }
        Ok(())
    }

    fn finish(&self, slot: &mut Slot<'_>) -> Result<AnyCriterion, AnalysisError> {
        let shape = slot.node.ty().shape();
        let mut unit = std::mem::replace(&mut slot.unit, AnyCriteria::new(shape));
        if let Some(class) = slot.node.cascade() {
            unit.push(AnyCriterion::Object((self.link_cascade)(class)?))?;
        }
        Ok(unit.simplify())
    }
}

fn flatten<'t>(
    node: &'t ConstrainedNode,
    parent: Option<(usize, &'t CriterionWrapper)>,
    slots: &mut Vec<Slot<'t>>,
) {
    let index = slots.len();
    slots.push(Slot {
        node,
        parent,
        unit: AnyCriteria::new(node.ty().shape()),
        pending_items: node.constraints().len(),
        pending_children: node.children().len(),
        absorbed: false,
    });
    for child in node.children() {
        flatten(&child.node, Some((index, &child.wrapper)), slots);
    }
}
