//! Rendered text surface: the platform-owned view the input method mutates.
//!
//! The engine reads the surface, never renders it. `Surface` is the narrow
//! read/restore contract it needs:
//! - structure (`root`, `parent`, `children`) with DOM-like detach semantics:
//!   a node removed by the platform loses its parent link while its own
//!   descendants keep theirs, so a detached subtree can still be walked upward
//!   to the nearest stable coordinate marker;
//! - text (`text_of` on text nodes, `text_content` over any subtree);
//! - stable coordinate markers (`marker`, an `OffsetKey` per rendered leaf);
//! - the external selection (`selection` / `set_selection`);
//! - verbatim capture/restore of block subtrees through the associated
//!   `Fragment` type, used by `SurfaceSnapshot` to roll back mutations the
//!   platform would not let us cancel.
//!
//! Invariants:
//! - `root` is always attached; every other node is attached iff its parent
//!   chain reaches `root`.
//! - Blocks are the direct children of `root`.
//! - Offsets inside a surface are chars, matching `core-model`.
//!
//! `SurfaceTree` is the in-memory arena implementation used by tests and by
//! embedders that keep their own view tree.

use core_model::{NodeKey, OffsetKey};
use std::fmt;

pub mod coords;
pub mod snapshot;
pub mod tree;

pub use coords::{find_point, node_to_model_key, selection_to_model_range};
pub use snapshot::{SnapshotOptions, SurfaceSnapshot};
pub use tree::{Role, SurfaceTree, TreeFragment};

/// Handle of a node inside one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfacePoint {
    pub node: NodeId,
    pub offset: usize,
}

impl SurfacePoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// External (platform) selection expressed in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceSelection {
    pub anchor: SurfacePoint,
    pub focus: SurfacePoint,
}

impl SurfaceSelection {
    pub fn new(anchor: SurfacePoint, focus: SurfacePoint) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(node: NodeId, offset: usize) -> Self {
        let point = SurfacePoint::new(node, offset);
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

pub trait Surface {
    /// Verbatim copy of a block subtree, restorable later.
    type Fragment: Clone + fmt::Debug;

    fn root(&self) -> NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Text of a text node; `None` for elements and unknown handles.
    fn text_of(&self, node: NodeId) -> Option<String>;

    /// Stable coordinate marker carried by `node` itself.
    fn marker(&self, node: NodeId) -> Option<OffsetKey>;

    fn selection(&self) -> Option<SurfaceSelection>;

    fn set_selection(&mut self, selection: Option<SurfaceSelection>);

    fn capture(&self, node: NodeId) -> Self::Fragment;

    fn restore(&mut self, fragment: &Self::Fragment);

    fn is_attached(&self, node: NodeId) -> bool {
        let root = self.root();
        let mut current = node;
        loop {
            if current == root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Concatenated text of every text node under `node`, in document order.
    fn text_content(&self, node: NodeId) -> String {
        if let Some(text) = self.text_of(node) {
            return text;
        }
        self.children(node)
            .into_iter()
            .map(|child| self.text_content(child))
            .collect()
    }

    /// `node` or its nearest ancestor carrying a marker. Walks parent links, so
    /// it also works from inside a detached subtree.
    fn closest_marker(&self, node: NodeId) -> Option<(NodeId, OffsetKey)> {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(marker) = self.marker(id) {
                return Some((id, marker));
            }
            current = self.parent(id);
        }
        None
    }

    /// Direct child of `root` containing `node`.
    fn block_of(&self, node: NodeId) -> Option<NodeId> {
        let root = self.root();
        let mut current = node;
        loop {
            let parent = self.parent(current)?;
            if parent == root {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Block rendered immediately before `block`.
    fn previous_block(&self, block: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.root());
        let index = siblings.iter().position(|&b| b == block)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Attached node carrying `marker`, searched depth-first from `root`.
    fn find_marker(&self, marker: OffsetKey) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if self.marker(id) == Some(marker) {
                return Some(id);
            }
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
        }
        None
    }

    /// Attached nodes carrying a marker for text `key`, in document order.
    fn rendered_leaves(&self, key: NodeKey) -> Vec<(NodeId, OffsetKey)> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if let Some(marker) = self.marker(id)
                && marker.key == key
            {
                found.push((id, marker));
                continue;
            }
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
        }
        found
    }

    /// Char offset of `(node, offset)` measured from the start of `ancestor`'s
    /// text content. `None` when `node` is not inside `ancestor`.
    fn offset_within(&self, ancestor: NodeId, node: NodeId, offset: usize) -> Option<usize> {
        if ancestor == node {
            return Some(offset);
        }
        let mut before = 0;
        for child in self.children(ancestor) {
            if let Some(inner) = self.offset_within(child, node, offset) {
                return Some(before + inner);
            }
            before += self.text_content(child).chars().count();
        }
        None
    }
}
