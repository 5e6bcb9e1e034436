//! Surface nodes touched during a composition, reconciled together.

use crate::{Reconciled, TextReconciler};
use core_model::{DocumentModel, ModelResult, Range};
use core_surface::{NodeId, Surface};
use tracing::debug;

/// Insertion-ordered set of surface nodes awaiting reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingNodes {
    nodes: Vec<NodeId>,
}

impl PendingNodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `node` was already pending.
    pub fn add(&mut self, node: NodeId) -> bool {
        if self.nodes.contains(&node) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Add the node holding the external caret, if any.
    pub fn add_anchor<S: Surface + ?Sized>(&mut self, surface: &S) -> bool {
        match surface.selection() {
            Some(sel) => self.add(sel.anchor.node),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Reconcile every pending node in insertion order, then set the model
    /// selection to `selection` or, when `None`, to the external selection.
    /// The set is empty afterwards, also on error.
    pub fn apply<S, M>(
        &mut self,
        surface: &S,
        model: &mut M,
        selection: Option<Range>,
    ) -> ModelResult<Vec<Reconciled>>
    where
        S: Surface + ?Sized,
        M: DocumentModel + ?Sized,
    {
        let nodes = std::mem::take(&mut self.nodes);
        debug!(target: "ime.reconcile", nodes = nodes.len(), "pending_apply");
        let outcomes = nodes
            .into_iter()
            .map(|node| TextReconciler::reconcile_text(surface, model, node))
            .collect::<ModelResult<Vec<_>>>()?;
        match selection {
            Some(range) => model.set_selection(range)?,
            None => {
                TextReconciler::sync_selection(surface, model)?;
            }
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{MemoryDocument, NodeKey, OffsetKey, Point};
    use core_surface::SurfaceTree;

    #[test]
    fn add_dedups_and_keeps_order() {
        let mut pending = PendingNodes::new();
        assert!(pending.add(NodeId(3)));
        assert!(pending.add(NodeId(1)));
        assert!(!pending.add(NodeId(3)));
        assert_eq!(pending.iter().collect::<Vec<_>>(), vec![NodeId(3), NodeId(1)]);
    }

    #[test]
    fn apply_reconciles_all_then_uses_override() {
        let mut doc = MemoryDocument::from_paragraphs(&["helo", "wrld"]);
        let mut tree = SurfaceTree::render(&doc);
        let a = tree.text_node_for(OffsetKey::new(NodeKey(2), 0)).unwrap();
        let b = tree.text_node_for(OffsetKey::new(NodeKey(4), 0)).unwrap();
        tree.set_text(a, "hello");
        tree.set_text(b, "world");
        tree.place_caret(Point::new(NodeKey(4), 5));

        let mut pending = PendingNodes::new();
        pending.add(a);
        assert!(pending.add_anchor(&tree));
        let caret = core_model::Range::collapsed(Point::new(NodeKey(2), 5));
        let outcomes = pending.apply(&tree, &mut doc, Some(caret)).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(Reconciled::is_structural));
        assert_eq!(doc.plain_text(), "hello\nworld");
        assert_eq!(doc.selection(), Some(caret));
        assert!(pending.is_empty());
    }
}
