//! Arena-backed surface.
//!
//! Layout produced by `render`:
//!
//! ```text
//! Root
//! └── Block(block key)
//!     ├── Leaf("text:0") ── "Hello "
//!     └── Leaf("text:1") ── "world"
//! ```
//!
//! Leaves of every text node of a block are siblings; the marker key names the
//! owning text node. The last leaf of the last text of a block gets one extra
//! `'\n'` when its text already ends in one, reproducing the trailing-newline
//! artifact renderers add so a lone final line break stays visible.
//!
//! Handles are never reused: detaching a node keeps its slot so stale handles
//! held by a platform event still resolve (as detached).

use crate::{NodeId, Surface, SurfacePoint, SurfaceSelection};
use core_model::{DocumentModel, MemoryDocument, NodeKey, OffsetKey, Point};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Root,
    Block(NodeKey),
    Leaf(OffsetKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeData {
    Element(Role),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Captured block subtree: every slot under `root` plus where it was attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFragment {
    root: NodeId,
    parent: Option<NodeId>,
    index: usize,
    slots: Vec<(NodeId, Slot)>,
}

impl TreeFragment {
    pub fn root(&self) -> NodeId {
        self.root
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceTree {
    slots: Vec<Slot>,
    selection: Option<SurfaceSelection>,
}

impl Default for SurfaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceTree {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                data: NodeData::Element(Role::Root),
                parent: None,
                children: Vec::new(),
            }],
            selection: None,
        }
    }

    /// Render `doc` and place the surface caret at the document selection.
    pub fn render(doc: &MemoryDocument) -> Self {
        let mut tree = SurfaceTree::new();
        let root = tree.root();
        for block in doc.blocks() {
            let block_el = tree.add_element(root, Role::Block(block.key));
            let last_text = block.texts.len().saturating_sub(1);
            for (ti, text) in block.texts.iter().enumerate() {
                let last_leaf = text.leaves.len().saturating_sub(1);
                for (li, leaf) in text.leaves.iter().enumerate() {
                    let leaf_el =
                        tree.add_element(block_el, Role::Leaf(OffsetKey::new(text.key, li)));
                    let mut content = leaf.text.clone();
                    if ti == last_text && li == last_leaf && content.ends_with('\n') {
                        content.push('\n');
                    }
                    tree.add_text(leaf_el, content);
                }
            }
        }
        if let Some(range) = doc.selection() {
            let anchor = tree.surface_point(range.anchor);
            let focus = tree.surface_point(range.focus);
            if let (Some(anchor), Some(focus)) = (anchor, focus) {
                tree.selection = Some(SurfaceSelection::new(anchor, focus));
            }
        }
        trace!(target: "ime.snapshot", nodes = tree.slots.len(), "surface_rendered");
        tree
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slots[parent.0].children.push(id);
        id
    }

    pub fn add_element(&mut self, parent: NodeId, role: Role) -> NodeId {
        self.push(parent, NodeData::Element(role))
    }

    pub fn add_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push(parent, NodeData::Text(text.into()))
    }

    pub fn role(&self, node: NodeId) -> Option<Role> {
        match self.slots.get(node.0)?.data {
            NodeData::Element(role) => Some(role),
            NodeData::Text(_) => None,
        }
    }

    /// Overwrite a text node's content. Returns false for elements.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> bool {
        match self.slots.get_mut(node.0) {
            Some(Slot {
                data: NodeData::Text(current),
                ..
            }) => {
                *current = text.into();
                true
            }
            _ => false,
        }
    }

    /// Unlink `node` from its parent. Its descendants keep their parent links.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.slots.get(node.0).and_then(|s| s.parent) else {
            return;
        };
        self.slots[parent.0].children.retain(|&c| c != node);
        self.slots[node.0].parent = None;
    }

    /// Move `child` under `parent` at `index` (clamped), detaching it first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.slots[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.slots[child.0].parent = Some(parent);
    }

    /// Platform-style merge: move every child of `next` to the end of `prev`
    /// and detach `next`.
    pub fn merge_blocks(&mut self, prev: NodeId, next: NodeId) {
        let moved = std::mem::take(&mut self.slots[next.0].children);
        for child in moved {
            self.slots[child.0].parent = Some(prev);
            self.slots[prev.0].children.push(child);
        }
        self.detach(next);
    }

    /// Text node rendered for the leaf `marker`.
    pub fn text_node_for(&self, marker: OffsetKey) -> Option<NodeId> {
        let leaf = self.find_marker(marker)?;
        self.children(leaf)
            .into_iter()
            .find(|&c| self.text_of(c).is_some())
    }

    /// Surface position of model point `point`: the leaf text node covering it.
    /// A point on a leaf boundary resolves to the end of the earlier leaf.
    pub fn surface_point(&self, point: Point) -> Option<SurfacePoint> {
        let mut start = 0;
        let mut last = None;
        for index in 0.. {
            let Some(node) = self.text_node_for(OffsetKey::new(point.key, index)) else {
                break;
            };
            let len = self.text_of(node).map_or(0, |t| t.chars().count());
            if point.offset <= start + len {
                return Some(SurfacePoint::new(node, point.offset - start));
            }
            start += len;
            last = Some((node, len));
        }
        last.map(|(node, len)| SurfacePoint::new(node, len))
    }

    /// Place a collapsed surface caret at model point `point`.
    pub fn place_caret(&mut self, point: Point) -> bool {
        match self.surface_point(point) {
            Some(p) => {
                self.selection = Some(SurfaceSelection::new(p, p));
                true
            }
            None => false,
        }
    }

    pub fn blocks(&self) -> Vec<NodeId> {
        self.children(self.root())
    }

    /// Text of every attached block joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.blocks()
            .into_iter()
            .map(|b| self.text_content(b))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn collect_subtree(&self, node: NodeId, out: &mut Vec<(NodeId, Slot)>) {
        out.push((node, self.slots[node.0].clone()));
        for &child in &self.slots[node.0].children {
            self.collect_subtree(child, out);
        }
    }
}

impl Surface for SurfaceTree {
    type Fragment = TreeFragment;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slots.get(node.0)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.slots
            .get(node.0)
            .map(|s| s.children.clone())
            .unwrap_or_default()
    }

    fn text_of(&self, node: NodeId) -> Option<String> {
        match &self.slots.get(node.0)?.data {
            NodeData::Text(text) => Some(text.clone()),
            NodeData::Element(_) => None,
        }
    }

    fn marker(&self, node: NodeId) -> Option<OffsetKey> {
        match self.role(node)? {
            Role::Leaf(marker) => Some(marker),
            Role::Root | Role::Block(_) => None,
        }
    }

    fn selection(&self) -> Option<SurfaceSelection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Option<SurfaceSelection>) {
        self.selection = selection;
    }

    fn capture(&self, node: NodeId) -> TreeFragment {
        let parent = self.parent(node);
        let index = parent
            .and_then(|p| self.slots[p.0].children.iter().position(|&c| c == node))
            .unwrap_or(0);
        let mut slots = Vec::new();
        if node.0 < self.slots.len() {
            self.collect_subtree(node, &mut slots);
        }
        TreeFragment {
            root: node,
            parent,
            index,
            slots,
        }
    }

    fn restore(&mut self, fragment: &TreeFragment) {
        // Unlink the live subtree root first so the restored parent link does
        // not leave a duplicate child entry behind.
        self.detach(fragment.root);
        for (id, slot) in &fragment.slots {
            let Some(live) = self.slots.get(id.0) else {
                continue;
            };
            // Children inserted after the capture leave the restored tree.
            let strays: Vec<NodeId> = live
                .children
                .iter()
                .copied()
                .filter(|c| !slot.children.contains(c))
                .collect();
            for stray in strays {
                if self.slots[stray.0].parent == Some(*id) {
                    self.slots[stray.0].parent = None;
                }
            }
            self.slots[id.0] = slot.clone();
        }
        if let Some(root_slot) = self.slots.get_mut(fragment.root.0) {
            root_slot.parent = None;
        }
        if let Some(parent) = fragment.parent {
            self.insert_child(parent, fragment.index, fragment.root);
        }
        trace!(
            target: "ime.snapshot",
            root = %fragment.root,
            nodes = fragment.slots.len(),
            "fragment_restored"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{Leaf, Marks, Range};
    use pretty_assertions::assert_eq;

    fn doc() -> MemoryDocument {
        MemoryDocument::new(vec![
            vec![vec![
                Leaf::plain("Hello "),
                Leaf::marked("world", Marks::none().with("bold")),
            ]],
            vec![vec![Leaf::plain("line\n")]],
        ])
    }

    #[test]
    fn render_marks_leaves_and_adds_newline_artifact() {
        let tree = SurfaceTree::render(&doc());
        assert_eq!(tree.plain_text(), "Hello world\nline\n\n");
        let leaf = tree.find_marker(OffsetKey::new(NodeKey(2), 1)).unwrap();
        assert_eq!(tree.text_content(leaf), "world");
        assert_eq!(tree.blocks().len(), 2);
    }

    #[test]
    fn surface_point_prefers_earlier_leaf_on_boundary() {
        let tree = SurfaceTree::render(&doc());
        let p = tree.surface_point(Point::new(NodeKey(2), 6)).unwrap();
        assert_eq!(tree.text_of(p.node).as_deref(), Some("Hello "));
        assert_eq!(p.offset, 6);
        let p = tree.surface_point(Point::new(NodeKey(2), 8)).unwrap();
        assert_eq!(tree.text_of(p.node).as_deref(), Some("world"));
        assert_eq!(p.offset, 2);
    }

    #[test]
    fn render_places_caret_from_document_selection() {
        let doc = doc().with_selection(Range::collapsed(Point::new(NodeKey(4), 2)));
        let tree = SurfaceTree::render(&doc);
        let sel = tree.selection().unwrap();
        assert!(sel.is_collapsed());
        assert_eq!(sel.anchor.offset, 2);
    }

    #[test]
    fn detached_subtree_still_walks_to_marker() {
        let mut tree = SurfaceTree::render(&doc());
        let leaf = tree.find_marker(OffsetKey::new(NodeKey(2), 1)).unwrap();
        let text = tree.text_node_for(OffsetKey::new(NodeKey(2), 1)).unwrap();
        tree.detach(leaf);
        assert!(!tree.is_attached(text));
        assert_eq!(
            tree.closest_marker(text),
            Some((leaf, OffsetKey::new(NodeKey(2), 1)))
        );
        assert_eq!(tree.find_marker(OffsetKey::new(NodeKey(2), 1)), None);
    }

    #[test]
    fn capture_restore_reverts_merge() {
        let mut tree = SurfaceTree::render(&doc());
        let blocks = tree.blocks();
        let before = tree.plain_text();
        let first = tree.capture(blocks[0]);
        let second = tree.capture(blocks[1]);
        tree.merge_blocks(blocks[0], blocks[1]);
        assert_eq!(tree.blocks().len(), 1);
        tree.restore(&first);
        tree.restore(&second);
        assert_eq!(tree.plain_text(), before);
        assert_eq!(tree.blocks(), blocks);
    }

    #[test]
    fn restore_unlinks_children_added_after_capture() {
        let mut tree = SurfaceTree::render(&doc());
        let block = tree.blocks()[0];
        let fragment = tree.capture(block);
        let inserted = tree.add_text(block, "typed");
        assert!(tree.is_attached(inserted));

        tree.restore(&fragment);
        assert!(!tree.is_attached(inserted));
        assert_eq!(tree.parent(inserted), None);
        assert_eq!(tree.plain_text(), "Hello world\nline\n\n");
    }

    #[test]
    fn offset_within_counts_preceding_text() {
        let tree = SurfaceTree::render(&doc());
        let block = tree.blocks()[0];
        let text = tree.text_node_for(OffsetKey::new(NodeKey(2), 1)).unwrap();
        assert_eq!(tree.offset_within(block, text, 3), Some(9));
        assert_eq!(tree.offset_within(text, block, 0), None);
    }
}
