//! Surface ↔ model coordinate mapping.
//!
//! A surface position maps to the model by walking up to the nearest leaf
//! marker (`key:index`), then counting chars rendered before it for the same
//! text key. Anything that cannot be mapped returns `None` and logs at `warn`;
//! callers skip the dependent step rather than fail.

use crate::{NodeId, Surface, SurfaceSelection};
use core_model::{DocumentModel, NodeKey, Point, Range};
use tracing::warn;

/// Model point of surface position `(node, offset)`.
///
/// The offset is clamped to the model text length, which absorbs the
/// trailing-newline artifact of the last leaf of a block.
pub fn find_point<S, M>(surface: &S, node: NodeId, offset: usize, model: &M) -> Option<Point>
where
    S: Surface + ?Sized,
    M: DocumentModel + ?Sized,
{
    let Some((leaf, marker)) = surface.closest_marker(node) else {
        warn!(target: "ime.coords", node = %node, "unmapped_node_no_marker");
        return None;
    };
    let Some(len) = model.text_len(marker.key) else {
        warn!(target: "ime.coords", marker = %marker, "unmapped_node_unknown_key");
        return None;
    };
    let within = surface.offset_within(leaf, node, offset)?;
    let before = match surface.parent(leaf) {
        Some(parent) => surface
            .children(parent)
            .into_iter()
            .take_while(|&c| c != leaf)
            .filter(|&c| surface.marker(c).is_some_and(|m| m.key == marker.key))
            .map(|c| surface.text_content(c).chars().count())
            .sum(),
        // Detached leaf: no rendered siblings left to count, trust the model.
        None => model.leaf_span(marker.key, marker.index).map_or(0, |(s, _)| s),
    };
    Some(Point::new(marker.key, (before + within).min(len)))
}

/// Model text node rendered at or above `node`.
pub fn node_to_model_key<S, M>(surface: &S, node: NodeId, model: &M) -> Option<NodeKey>
where
    S: Surface + ?Sized,
    M: DocumentModel + ?Sized,
{
    let (_, marker) = surface.closest_marker(node)?;
    if model.leaves(marker.key).is_none() {
        warn!(target: "ime.coords", marker = %marker, "unmapped_node_unknown_key");
        return None;
    }
    Some(marker.key)
}

pub fn selection_to_model_range<S, M>(
    surface: &S,
    selection: &SurfaceSelection,
    model: &M,
) -> Option<Range>
where
    S: Surface + ?Sized,
    M: DocumentModel + ?Sized,
{
    let anchor = find_point(surface, selection.anchor.node, selection.anchor.offset, model)?;
    let focus = if selection.is_collapsed() {
        anchor
    } else {
        find_point(surface, selection.focus.node, selection.focus.offset, model)?
    };
    Some(Range::new(anchor, focus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SurfacePoint, SurfaceTree};
    use core_model::{Leaf, MemoryDocument, OffsetKey};

    fn setup() -> (MemoryDocument, SurfaceTree) {
        let doc = MemoryDocument::new(vec![vec![vec![
            Leaf::plain("ab"),
            Leaf::marked("cd", core_model::Marks::none().with("em")),
        ]]]);
        let tree = SurfaceTree::render(&doc);
        (doc, tree)
    }

    #[test]
    fn point_counts_preceding_leaves() {
        let (doc, tree) = setup();
        let second = tree.text_node_for(OffsetKey::new(NodeKey(2), 1)).unwrap();
        assert_eq!(
            find_point(&tree, second, 1, &doc),
            Some(Point::new(NodeKey(2), 3))
        );
        assert_eq!(node_to_model_key(&tree, second, &doc), Some(NodeKey(2)));
    }

    #[test]
    fn root_and_unknown_keys_are_unmapped() {
        let (doc, tree) = setup();
        assert_eq!(find_point(&tree, tree.root(), 0, &doc), None);
        let other = MemoryDocument::from_paragraphs(&[]);
        let first = tree.text_node_for(OffsetKey::new(NodeKey(2), 0)).unwrap();
        assert_eq!(node_to_model_key(&tree, first, &other), None);
    }

    #[test]
    fn offset_clamps_to_model_length() {
        let (doc, mut tree) = setup();
        let second = tree.text_node_for(OffsetKey::new(NodeKey(2), 1)).unwrap();
        tree.set_text(second, "cdef");
        assert_eq!(
            find_point(&tree, second, 4, &doc),
            Some(Point::new(NodeKey(2), 4))
        );
    }

    #[test]
    fn expanded_selection_maps_both_ends() {
        let (doc, tree) = setup();
        let first = tree.text_node_for(OffsetKey::new(NodeKey(2), 0)).unwrap();
        let second = tree.text_node_for(OffsetKey::new(NodeKey(2), 1)).unwrap();
        let sel = SurfaceSelection::new(SurfacePoint::new(first, 1), SurfacePoint::new(second, 2));
        assert_eq!(
            selection_to_model_range(&tree, &sel, &doc),
            Some(Range::within(NodeKey(2), 1, 4))
        );
    }
}
