//! In-memory reference document with a command journal.
//!
//! Structure is deliberately flat: a document is a list of blocks, a block is a
//! list of text nodes, a text node is a list of leaves. Edits operate on a
//! per-char view of a text node and regroup leaves afterwards, so adjacent runs
//! with identical marks always coalesce into one leaf.

use crate::{DocumentModel, Leaf, Marks, ModelError, ModelResult, NodeKey, Point, Range};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub key: NodeKey,
    pub leaves: Vec<Leaf>,
}

impl TextNode {
    pub fn text(&self) -> String {
        self.leaves.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.leaves.iter().map(Leaf::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn chars(&self) -> Vec<(char, Marks)> {
        self.leaves
            .iter()
            .flat_map(|leaf| leaf.text.chars().map(move |c| (c, leaf.marks.clone())))
            .collect()
    }

    fn set_chars(&mut self, chars: Vec<(char, Marks)>) {
        let fallback = self
            .leaves
            .first()
            .map(|l| l.marks.clone())
            .unwrap_or_default();
        let mut leaves: Vec<Leaf> = Vec::new();
        for (c, marks) in chars {
            match leaves.last_mut() {
                Some(last) if last.marks == marks => last.text.push(c),
                _ => leaves.push(Leaf::marked(c.to_string(), marks)),
            }
        }
        if leaves.is_empty() {
            leaves.push(Leaf::marked("", fallback));
        }
        self.leaves = leaves;
    }

    fn marks_at(&self, offset: usize) -> Marks {
        let chars = self.chars();
        if offset > 0
            && let Some((_, marks)) = chars.get(offset - 1)
        {
            return marks.clone();
        }
        chars
            .first()
            .map(|(_, m)| m.clone())
            .or_else(|| self.leaves.first().map(|l| l.marks.clone()))
            .unwrap_or_default()
    }

    fn remove_chars(&mut self, start: usize, end: usize) {
        let mut chars = self.chars();
        chars.drain(start..end);
        self.set_chars(chars);
    }

    fn insert_chars(&mut self, at: usize, text: &str, marks: &Marks) {
        let mut chars = self.chars();
        let tail = chars.split_off(at);
        chars.extend(text.chars().map(|c| (c, marks.clone())));
        chars.extend(tail);
        self.set_chars(chars);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub key: NodeKey,
    pub texts: Vec<TextNode>,
}

impl Block {
    pub fn text(&self) -> String {
        self.texts.iter().map(TextNode::text).collect()
    }
}

/// One call made against a `MemoryDocument`, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCommand {
    Select(Range),
    ReplaceText { range: Range, text: String },
    DeleteAtRange(Range),
    DeleteBackward(usize),
    DeleteForward(usize),
    SplitBlock,
    InsertText(String),
}

impl ModelCommand {
    /// Everything except selection changes mutates document content.
    pub fn is_structural(&self) -> bool {
        !matches!(self, ModelCommand::Select(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    blocks: Vec<Block>,
    selection: Option<Range>,
    next_key: u32,
    journal: Vec<ModelCommand>,
}

impl MemoryDocument {
    /// Build from blocks of text nodes of leaves. Keys are allocated in document
    /// order: each block key is followed by the keys of its text nodes.
    pub fn new(blocks: Vec<Vec<Vec<Leaf>>>) -> Self {
        let mut doc = MemoryDocument::default();
        for texts in blocks {
            let key = doc.alloc_key();
            let texts = texts
                .into_iter()
                .map(|mut leaves| {
                    if leaves.is_empty() {
                        leaves.push(Leaf::plain(""));
                    }
                    TextNode {
                        key: doc.alloc_key(),
                        leaves,
                    }
                })
                .collect();
            doc.blocks.push(Block { key, texts });
        }
        doc
    }

    /// One block with one plain text node per paragraph.
    pub fn from_paragraphs(paragraphs: &[&str]) -> Self {
        Self::new(
            paragraphs
                .iter()
                .map(|p| vec![vec![Leaf::plain(*p)]])
                .collect(),
        )
    }

    pub fn with_selection(mut self, range: Range) -> Self {
        self.selection = Some(range);
        self
    }

    fn alloc_key(&mut self) -> NodeKey {
        self.next_key += 1;
        NodeKey(self.next_key)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn text_keys(&self) -> Vec<NodeKey> {
        self.blocks
            .iter()
            .flat_map(|b| b.texts.iter().map(|t| t.key))
            .collect()
    }

    pub fn text(&self, key: NodeKey) -> Option<String> {
        let (bi, ti) = self.locate(key)?;
        Some(self.blocks[bi].texts[ti].text())
    }

    /// Block texts joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn journal(&self) -> &[ModelCommand] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<ModelCommand> {
        std::mem::take(&mut self.journal)
    }

    pub fn structural_edits(&self) -> usize {
        self.journal.iter().filter(|c| c.is_structural()).count()
    }

    fn record(&mut self, command: ModelCommand) {
        trace!(target: "ime.model", ?command, "model_command");
        self.journal.push(command);
    }

    fn locate(&self, key: NodeKey) -> Option<(usize, usize)> {
        self.blocks.iter().enumerate().find_map(|(bi, block)| {
            block
                .texts
                .iter()
                .position(|t| t.key == key)
                .map(|ti| (bi, ti))
        })
    }

    fn check_point(&self, point: Point) -> ModelResult<(usize, usize)> {
        let (bi, ti) = self.locate(point.key).ok_or(ModelError::UnknownKey(point.key))?;
        let len = self.blocks[bi].texts[ti].len();
        if point.offset > len {
            return Err(ModelError::OffsetOutOfBounds {
                key: point.key,
                offset: point.offset,
                len,
            });
        }
        Ok((bi, ti))
    }

    /// Validate a single-node range, returning its location and ordered bounds.
    fn check_range(&self, range: Range) -> ModelResult<(usize, usize, usize, usize)> {
        if !range.is_single_node() {
            return Err(ModelError::CrossNodeRange {
                anchor: range.anchor.key,
                focus: range.focus.key,
            });
        }
        let (start, end) = (range.start(), range.end());
        self.check_point(start)?;
        let (bi, ti) = self.check_point(end)?;
        Ok((bi, ti, start.offset, end.offset))
    }

    /// Shift selection endpoints in `key` after `[start, end)` became `new_len` chars.
    fn adjust_selection(&mut self, key: NodeKey, start: usize, end: usize, new_len: usize) {
        let Some(sel) = self.selection.as_mut() else {
            return;
        };
        for point in [&mut sel.anchor, &mut sel.focus] {
            if point.key != key || point.offset < start {
                continue;
            }
            if point.offset >= end {
                point.offset = point.offset - (end - start) + new_len;
            } else {
                point.offset = start + new_len.min(point.offset - start);
            }
        }
    }

    fn remove_range(&mut self, range: Range) -> ModelResult<Point> {
        let (bi, ti, start, end) = self.check_range(range)?;
        self.blocks[bi].texts[ti].remove_chars(start, end);
        self.adjust_selection(range.anchor.key, start, end, 0);
        Ok(Point::new(range.anchor.key, start))
    }

    /// Delete the char before `point`, crossing text and block boundaries.
    /// Returns the new caret or `None` at the start of the document.
    fn step_back(&mut self, point: Point) -> Option<Point> {
        let (bi, ti) = self.locate(point.key)?;
        if point.offset > 0 {
            self.blocks[bi].texts[ti].remove_chars(point.offset - 1, point.offset);
            return Some(Point::new(point.key, point.offset - 1));
        }
        if let Some(prev) = self.blocks[bi].texts[..ti]
            .iter_mut()
            .rev()
            .find(|t| !t.is_empty())
        {
            let len = prev.len();
            prev.remove_chars(len - 1, len);
            return Some(point);
        }
        if bi > 0 {
            let merged = self.blocks.remove(bi);
            self.blocks[bi - 1].texts.extend(merged.texts);
            return Some(point);
        }
        None
    }

    fn step_forward(&mut self, point: Point) -> Option<Point> {
        let (bi, ti) = self.locate(point.key)?;
        let len = self.blocks[bi].texts[ti].len();
        if point.offset < len {
            self.blocks[bi].texts[ti].remove_chars(point.offset, point.offset + 1);
            return Some(point);
        }
        if let Some(next) = self.blocks[bi].texts[ti + 1..]
            .iter_mut()
            .find(|t| !t.is_empty())
        {
            next.remove_chars(0, 1);
            return Some(point);
        }
        if bi + 1 < self.blocks.len() {
            let merged = self.blocks.remove(bi + 1);
            self.blocks[bi].texts.extend(merged.texts);
            return Some(point);
        }
        None
    }

    /// Collapse an expanded selection by deleting it; returns the caret.
    fn collapse_selection(&mut self) -> ModelResult<Point> {
        let sel = self.selection.ok_or(ModelError::NoSelection)?;
        if sel.is_collapsed() {
            self.check_point(sel.anchor)?;
            return Ok(sel.anchor);
        }
        let caret = self.remove_range(sel)?;
        self.selection = Some(Range::collapsed(caret));
        Ok(caret)
    }
}

impl DocumentModel for MemoryDocument {
    fn leaves(&self, key: NodeKey) -> Option<Vec<Leaf>> {
        let (bi, ti) = self.locate(key)?;
        Some(self.blocks[bi].texts[ti].leaves.clone())
    }

    fn is_last_text_in_block(&self, key: NodeKey) -> bool {
        self.locate(key)
            .is_some_and(|(bi, ti)| ti + 1 == self.blocks[bi].texts.len())
    }

    fn selection(&self) -> Option<Range> {
        self.selection
    }

    fn set_selection(&mut self, range: Range) -> ModelResult<()> {
        self.check_point(range.anchor)?;
        self.check_point(range.focus)?;
        self.selection = Some(range);
        self.record(ModelCommand::Select(range));
        Ok(())
    }

    fn replace_text_in_range(
        &mut self,
        range: Range,
        text: &str,
        marks: &Marks,
    ) -> ModelResult<()> {
        let (bi, ti, start, end) = self.check_range(range)?;
        let node = &mut self.blocks[bi].texts[ti];
        node.remove_chars(start, end);
        node.insert_chars(start, text, marks);
        self.adjust_selection(range.anchor.key, start, end, text.chars().count());
        self.record(ModelCommand::ReplaceText {
            range,
            text: text.to_string(),
        });
        Ok(())
    }

    fn delete_at_range(&mut self, range: Range) -> ModelResult<()> {
        self.remove_range(range)?;
        self.record(ModelCommand::DeleteAtRange(range));
        Ok(())
    }

    fn delete_backward(&mut self, count: usize) -> ModelResult<()> {
        let sel = self.selection.ok_or(ModelError::NoSelection)?;
        if !sel.is_collapsed() {
            // An expanded selection is consumed as one unit regardless of count.
            self.collapse_selection()?;
            self.record(ModelCommand::DeleteBackward(count));
            return Ok(());
        }
        self.check_point(sel.anchor)?;
        let mut caret = sel.anchor;
        for _ in 0..count {
            match self.step_back(caret) {
                Some(next) => caret = next,
                None => break,
            }
        }
        self.selection = Some(Range::collapsed(caret));
        self.record(ModelCommand::DeleteBackward(count));
        Ok(())
    }

    fn delete_forward(&mut self, count: usize) -> ModelResult<()> {
        let sel = self.selection.ok_or(ModelError::NoSelection)?;
        if !sel.is_collapsed() {
            self.collapse_selection()?;
            self.record(ModelCommand::DeleteForward(count));
            return Ok(());
        }
        self.check_point(sel.anchor)?;
        let mut caret = sel.anchor;
        for _ in 0..count {
            match self.step_forward(caret) {
                Some(next) => caret = next,
                None => break,
            }
        }
        self.selection = Some(Range::collapsed(caret));
        self.record(ModelCommand::DeleteForward(count));
        Ok(())
    }

    fn split_block_at_selection(&mut self) -> ModelResult<()> {
        let sel = self.selection.ok_or(ModelError::NoSelection)?;
        if !sel.is_collapsed() {
            self.check_range(sel)?;
        }
        let caret = self.collapse_selection()?;
        let (bi, ti) = self.check_point(caret)?;
        let block_key = self.alloc_key();
        let text_key = self.alloc_key();

        let node = &mut self.blocks[bi].texts[ti];
        let mut head = node.chars();
        let tail = head.split_off(caret.offset);
        let mut right = TextNode {
            key: text_key,
            leaves: vec![Leaf::marked("", node.marks_at(caret.offset))],
        };
        right.set_chars(tail);
        node.set_chars(head);

        let mut texts = vec![right];
        texts.extend(self.blocks[bi].texts.drain(ti + 1..));
        self.blocks.insert(
            bi + 1,
            Block {
                key: block_key,
                texts,
            },
        );
        self.selection = Some(Range::collapsed(Point::new(text_key, 0)));
        self.record(ModelCommand::SplitBlock);
        Ok(())
    }

    fn insert_text(&mut self, text: &str) -> ModelResult<()> {
        let sel = self.selection.ok_or(ModelError::NoSelection)?;
        if !sel.is_collapsed() {
            self.check_range(sel)?;
        }
        let caret = self.collapse_selection()?;
        let (bi, ti) = self.check_point(caret)?;
        let node = &mut self.blocks[bi].texts[ti];
        let marks = node.marks_at(caret.offset);
        node.insert_chars(caret.offset, text, &marks);
        self.selection = Some(Range::collapsed(Point::new(
            caret.key,
            caret.offset + text.chars().count(),
        )));
        self.record(ModelCommand::InsertText(text.to_string()));
        Ok(())
    }
}
