//! Document model coordinates and the command surface the input engine drives.
//!
//! The engine never owns the document. It sees it through `DocumentModel`, a
//! narrow trait covering leaf lookup, selection, and the handful of structural
//! edits a quirk handler may request after disambiguating a burst. Each edit is
//! atomic from the caller's point of view: it either applies fully or returns a
//! `ModelError` without observable partial state.
//!
//! Coordinates:
//! * `NodeKey` names a text node with a stable identity across renders.
//! * `OffsetKey` (`"key:index"`) names the `index`-th leaf (run of identically
//!   marked text) inside a text node. Rendered surfaces carry it as their stable
//!   coordinate marker.
//! * `Point` is `(key, offset)` where `offset` counts chars (Unicode scalar
//!   values) from the start of the text node, not from the start of a leaf.
//! * `Range` is an anchor/focus pair. It may be backward; `start`/`end` order
//!   the endpoints when both share a key.
//!
//! `MemoryDocument` is the in-process reference model used by tests and by
//! embedders that do not have a richer document. It records every call in a
//! journal so callers can assert exactly which edits a burst produced.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

mod memory;
pub use memory::{Block, MemoryDocument, ModelCommand, TextNode};

/// Stable identity of a text node (or block) in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable coordinate marker of a rendered leaf: `key:index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetKey {
    pub key: NodeKey,
    pub index: usize,
}

impl OffsetKey {
    pub fn new(key: NodeKey, index: usize) -> Self {
        Self { key, index }
    }

    /// Marker of the leaf immediately before this one in the same text node.
    pub fn previous(&self) -> Option<OffsetKey> {
        self.index.checked_sub(1).map(|index| OffsetKey {
            key: self.key,
            index,
        })
    }
}

impl fmt::Display for OffsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.index)
    }
}

impl FromStr for OffsetKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ModelError::MalformedOffsetKey(s.to_string());
        let (key, index) = s.split_once(':').ok_or_else(malformed)?;
        let key = key.parse::<u32>().map_err(|_| malformed())?;
        let index = index.parse::<usize>().map_err(|_| malformed())?;
        Ok(OffsetKey::new(NodeKey(key), index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    /// `[start, end)` inside a single text node.
    pub fn within(key: NodeKey, start: usize, end: usize) -> Self {
        Self::new(Point::new(key, start), Point::new(key, end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_single_node(&self) -> bool {
        self.anchor.key == self.focus.key
    }

    /// Earlier endpoint when both endpoints share a key; the anchor otherwise.
    pub fn start(&self) -> Point {
        if self.is_single_node() && self.focus.offset < self.anchor.offset {
            self.focus
        } else {
            self.anchor
        }
    }

    pub fn end(&self) -> Point {
        if self.is_single_node() && self.focus.offset < self.anchor.offset {
            self.anchor
        } else {
            self.focus
        }
    }
}

/// Formatting marks carried by a leaf (bold, italic, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Marks(BTreeSet<String>);

impl Marks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, mark: impl Into<String>) -> Self {
        self.0.insert(mark.into());
        self
    }

    pub fn contains(&self, mark: &str) -> bool {
        self.0.contains(mark)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Marks {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Marks(iter.into_iter().map(Into::into).collect())
    }
}

/// A run of text sharing one set of marks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaf {
    pub text: String,
    pub marks: Marks,
}

impl Leaf {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::none(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("unknown node key {0}")]
    UnknownKey(NodeKey),
    #[error("offset {offset} out of bounds for node {key} (len {len})")]
    OffsetOutOfBounds {
        key: NodeKey,
        offset: usize,
        len: usize,
    },
    #[error("document has no selection")]
    NoSelection,
    #[error("range spans nodes {anchor} and {focus}")]
    CrossNodeRange { anchor: NodeKey, focus: NodeKey },
    #[error("malformed offset key {0:?}")]
    MalformedOffsetKey(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Command surface the engine consumes from the document model.
///
/// Implementors must keep every structural edit atomic: on `Err` the document
/// is unchanged.
pub trait DocumentModel {
    /// Leaves of the text node `key`, or `None` when `key` is not a text node.
    fn leaves(&self, key: NodeKey) -> Option<Vec<Leaf>>;

    /// True when `key` is the last text node of its enclosing block.
    fn is_last_text_in_block(&self, key: NodeKey) -> bool;

    fn selection(&self) -> Option<Range>;

    fn set_selection(&mut self, range: Range) -> ModelResult<()>;

    /// Replace `range` (single text node) with `text` carrying `marks`.
    fn replace_text_in_range(&mut self, range: Range, text: &str, marks: &Marks)
    -> ModelResult<()>;

    /// Remove the text covered by `range` (single text node).
    fn delete_at_range(&mut self, range: Range) -> ModelResult<()>;

    fn delete_backward(&mut self, count: usize) -> ModelResult<()>;

    fn delete_forward(&mut self, count: usize) -> ModelResult<()>;

    fn split_block_at_selection(&mut self) -> ModelResult<()>;

    fn insert_text(&mut self, text: &str) -> ModelResult<()>;

    /// Text of the `index`-th leaf of `key`.
    fn leaf_text(&self, key: NodeKey, index: usize) -> Option<String> {
        self.leaves(key)?.get(index).map(|leaf| leaf.text.clone())
    }

    /// Total char length of text node `key`.
    fn text_len(&self, key: NodeKey) -> Option<usize> {
        self.leaves(key)
            .map(|leaves| leaves.iter().map(Leaf::len).sum())
    }

    /// Char span `[start, end)` of leaf `index` inside its text node.
    fn leaf_span(&self, key: NodeKey, index: usize) -> Option<(usize, usize)> {
        let leaves = self.leaves(key)?;
        let mut start = 0;
        for (i, leaf) in leaves.iter().enumerate() {
            let end = start + leaf.len();
            if i == index {
                return Some((start, end));
            }
            start = end;
        }
        None
    }
}

impl<T: DocumentModel + ?Sized> DocumentModel for &mut T {
    fn leaves(&self, key: NodeKey) -> Option<Vec<Leaf>> {
        (**self).leaves(key)
    }
    fn is_last_text_in_block(&self, key: NodeKey) -> bool {
        (**self).is_last_text_in_block(key)
    }
    fn selection(&self) -> Option<Range> {
        (**self).selection()
    }
    fn set_selection(&mut self, range: Range) -> ModelResult<()> {
        (**self).set_selection(range)
    }
    fn replace_text_in_range(
        &mut self,
        range: Range,
        text: &str,
        marks: &Marks,
    ) -> ModelResult<()> {
        (**self).replace_text_in_range(range, text, marks)
    }
    fn delete_at_range(&mut self, range: Range) -> ModelResult<()> {
        (**self).delete_at_range(range)
    }
    fn delete_backward(&mut self, count: usize) -> ModelResult<()> {
        (**self).delete_backward(count)
    }
    fn delete_forward(&mut self, count: usize) -> ModelResult<()> {
        (**self).delete_forward(count)
    }
    fn split_block_at_selection(&mut self) -> ModelResult<()> {
        (**self).split_block_at_selection()
    }
    fn insert_text(&mut self, text: &str) -> ModelResult<()> {
        (**self).insert_text(text)
    }
}
