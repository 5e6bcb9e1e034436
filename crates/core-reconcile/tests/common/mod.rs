#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_model::{Leaf, Marks, MemoryDocument, NodeKey, OffsetKey};
use core_surface::{NodeId, SurfaceTree};

/// One block, one text node (key 2) with a plain leaf followed by a bold leaf.
pub fn two_leaf_doc(plain: &str, bold: &str) -> MemoryDocument {
    MemoryDocument::new(vec![vec![vec![
        Leaf::plain(plain),
        Leaf::marked(bold, Marks::none().with("bold")),
    ]]])
}

pub fn render(doc: &MemoryDocument) -> SurfaceTree {
    SurfaceTree::render(doc)
}

/// Surface text node rendered for leaf `index` of text `key`.
pub fn leaf_node(tree: &SurfaceTree, key: u32, index: usize) -> NodeId {
    tree.text_node_for(OffsetKey::new(NodeKey(key), index))
        .expect("leaf rendered")
}
