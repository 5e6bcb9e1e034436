//! An unchanged surface produces no structural edit but still syncs selection.

mod common;

use common::{leaf_node, render, two_leaf_doc};
use core_model::{DocumentModel, ModelCommand, NodeKey, Point, Range};
use core_reconcile::{Reconciled, TextReconciler};
use core_surface::{Surface, SurfaceSelection};
use pretty_assertions::assert_eq;

#[test]
fn unchanged_text_still_restores_selection() {
    let mut doc = two_leaf_doc("Hello ", "world")
        .with_selection(Range::collapsed(Point::new(NodeKey(2), 0)));
    let mut tree = render(&doc);
    let node = leaf_node(&tree, 2, 1);
    tree.place_caret(Point::new(NodeKey(2), 9));

    let outcome = TextReconciler::reconcile(&tree, &mut doc, node).unwrap();

    assert_eq!(outcome, Reconciled::Unchanged);
    assert_eq!(doc.structural_edits(), 0);
    let caret = Range::collapsed(Point::new(NodeKey(2), 9));
    assert_eq!(doc.selection(), Some(caret));
    assert_eq!(doc.journal(), &[ModelCommand::Select(caret)]);
}

#[test]
fn unmapped_selection_is_skipped_without_error() {
    let mut doc = two_leaf_doc("a", "b");
    let mut tree = render(&doc);
    let node = leaf_node(&tree, 2, 0);
    let root = tree.root();
    tree.set_selection(Some(SurfaceSelection::caret(root, 0)));

    let outcome = TextReconciler::reconcile(&tree, &mut doc, node).unwrap();
    assert_eq!(outcome, Reconciled::Unchanged);
    assert!(doc.journal().is_empty());
}
