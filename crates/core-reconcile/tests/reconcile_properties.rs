//! Property-based tests for reconcile idempotence.

mod common;

use common::{leaf_node, render, two_leaf_doc};
use core_model::{DocumentModel, NodeKey, Point};
use core_reconcile::{Reconciled, TextReconciler};
use proptest::prelude::*;

proptest! {
    // A second reconcile with no surface change performs no structural edit.
    #[test]
    fn reconcile_is_a_fixed_point(
        plain in "[a-z ]{1,8}",
        bold in "[a-zé ]{1,8}",
        next in "[a-zé \n]{0,12}",
        which in 0usize..2,
        caret in 0usize..12,
    ) {
        let mut doc = two_leaf_doc(&plain, &bold);
        let mut tree = render(&doc);
        let node = leaf_node(&tree, 2, which);
        tree.set_text(node, next.clone());
        let before = if which == 0 { 0 } else { plain.chars().count() };
        let caret = before + caret.min(next.chars().count());
        tree.place_caret(Point::new(NodeKey(2), caret));

        TextReconciler::reconcile(&tree, &mut doc, node).unwrap();
        let edits = doc.structural_edits();
        let second = TextReconciler::reconcile(&tree, &mut doc, node).unwrap();
        prop_assert_eq!(second, Reconciled::Unchanged);
        prop_assert_eq!(doc.structural_edits(), edits);
    }

    // The leaf that was not touched keeps its text and marks.
    #[test]
    fn reconcile_touches_only_the_covering_leaf(
        plain in "[a-z]{1,8}",
        bold in "[a-z]{1,8}",
        next in "[a-z]{1,8}",
    ) {
        let mut doc = two_leaf_doc(&plain, &bold);
        let mut tree = render(&doc);
        let node = leaf_node(&tree, 2, 1);
        tree.set_text(node, next.clone());
        TextReconciler::reconcile(&tree, &mut doc, node).unwrap();
        prop_assert_eq!(doc.text(NodeKey(2)).unwrap(), format!("{plain}{next}"));
        prop_assert_eq!(doc.leaf_text(NodeKey(2), 0).unwrap(), plain);
    }
}
