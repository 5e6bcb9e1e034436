//! Pull text the platform already wrote into the surface back into the model.
//!
//! `TextReconciler::reconcile(surface, model, node)` makes the model leaf that
//! `node` renders equal to `node`'s current text in one structural edit, then
//! syncs the model selection from the external selection.
//!
//! Leaf spans are located through the rendered layout of the text node, the
//! `key:index` markers still on the surface:
//! - aligned layout (the model has exactly as many leaves as were rendered):
//!   marker `index` is model leaf `index`;
//! - drifted layout (an earlier reconcile emptied a leaf and the model merged
//!   its neighbours): the span is whatever the model holds between the
//!   rendered siblings before and after the node.
//!
//! The last rendered leaf of the last text in a block has one trailing `'\n'`
//! (the renderer's artifact) stripped before comparing.
//!
//! Detached node (the platform merged it away before notifying): the run of
//! detached markers ending at the node's marker is deleted, highest index
//! first, with every span computed before the first edit. The attached
//! predecessor is then reconciled against its own span. In a drifted layout
//! the run and its predecessor are replaced together by the predecessor's text.
//!
//! The selection sync runs on every mapped call, including `Unchanged`.
//! Calling `reconcile` again with no surface change is a no-op edit-wise.

use core_model::{DocumentModel, Leaf, Marks, ModelResult, NodeKey, OffsetKey, Range};
use core_surface::{NodeId, Surface};
use tracing::{debug, trace, warn};

pub mod pending;
pub use pending::PendingNodes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The node could not be mapped to a model coordinate.
    Unmapped,
    /// Surface and model already agree.
    Unchanged,
    Replaced {
        key: NodeKey,
        range: Range,
    },
    /// Leaves removed by a detached-node cascade, latest first, plus the span
    /// of the attached predecessor if it had to be replaced.
    Removed {
        ranges: Vec<Range>,
        replaced: Option<Range>,
    },
}

impl Reconciled {
    /// True when the model content was edited.
    pub fn is_structural(&self) -> bool {
        matches!(self, Reconciled::Replaced { .. } | Reconciled::Removed { .. })
    }
}

/// One attached leaf of a text node as the surface shows it now.
#[derive(Debug)]
struct RenderedLeaf {
    index: usize,
    node: NodeId,
    text: String,
}

impl RenderedLeaf {
    fn len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Attached leaves of `key` with the trailing-newline artifact removed.
fn rendered_layout<S, M>(surface: &S, model: &M, key: NodeKey) -> Vec<RenderedLeaf>
where
    S: Surface + ?Sized,
    M: DocumentModel + ?Sized,
{
    let mut layout: Vec<RenderedLeaf> = surface
        .rendered_leaves(key)
        .into_iter()
        .map(|(node, marker)| RenderedLeaf {
            index: marker.index,
            node,
            text: surface.text_content(node),
        })
        .collect();
    if model.is_last_text_in_block(key)
        && let Some(last) = layout.last_mut()
        && last.text.ends_with('\n')
    {
        last.text.pop();
    }
    layout
}

/// True when model leaf `i` is still the leaf rendered with marker `i`.
/// `missing` counts rendered markers no longer attached.
fn is_aligned(leaves: &[Leaf], layout: &[RenderedLeaf], missing: usize) -> bool {
    leaves.len() == layout.len() + missing && layout.iter().all(|r| r.index < leaves.len())
}

fn leaf_span(leaves: &[Leaf], index: usize) -> Option<(usize, usize)> {
    let start: usize = leaves.get(..index)?.iter().map(Leaf::len).sum();
    Some((start, start + leaves.get(index)?.len()))
}

/// Marks of the leaf covering char `offset`, or of the last leaf.
fn marks_at(leaves: &[Leaf], offset: usize) -> Marks {
    let mut end = 0;
    for leaf in leaves {
        end += leaf.len();
        if end > offset {
            return leaf.marks.clone();
        }
    }
    leaves.last().map(|l| l.marks.clone()).unwrap_or_default()
}

fn slice(leaves: &[Leaf], start: usize, end: usize) -> String {
    leaves
        .iter()
        .flat_map(|l| l.text.chars())
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

/// Model span between the rendered siblings before `low` and after `high`.
fn span_between(leaves: &[Leaf], layout: &[RenderedLeaf], low: usize, high: usize) -> (usize, usize) {
    let total: usize = leaves.iter().map(Leaf::len).sum();
    let before: usize = layout.iter().filter(|r| r.index < low).map(RenderedLeaf::len).sum();
    let after: usize = layout.iter().filter(|r| r.index > high).map(RenderedLeaf::len).sum();
    let start = before.min(total);
    (start, total.saturating_sub(after).max(start))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextReconciler;

impl TextReconciler {
    pub fn reconcile<S, M>(surface: &S, model: &mut M, node: NodeId) -> ModelResult<Reconciled>
    where
        S: Surface + ?Sized,
        M: DocumentModel + ?Sized,
    {
        let outcome = Self::reconcile_text(surface, model, node)?;
        if outcome != Reconciled::Unmapped {
            Self::sync_selection(surface, model)?;
        }
        Ok(outcome)
    }

    /// Reconcile without touching the selection; batch callers sync once.
    pub fn reconcile_text<S, M>(
        surface: &S,
        model: &mut M,
        node: NodeId,
    ) -> ModelResult<Reconciled>
    where
        S: Surface + ?Sized,
        M: DocumentModel + ?Sized,
    {
        let Some((leaf_node, marker)) = surface.closest_marker(node) else {
            warn!(target: "ime.reconcile", node = %node, "node_without_marker");
            return Ok(Reconciled::Unmapped);
        };
        let leaves = match model.leaves(marker.key) {
            Some(leaves) if !leaves.is_empty() => leaves,
            _ => {
                warn!(target: "ime.reconcile", marker = %marker, "marker_key_unknown");
                return Ok(Reconciled::Unmapped);
            }
        };
        let layout = rendered_layout(surface, model, marker.key);
        match layout.iter().position(|r| r.node == leaf_node) {
            Some(pos) => Self::reconcile_attached(model, marker, &leaves, &layout, pos),
            None => match layout.iter().position(|r| r.index == marker.index) {
                // The text node went away but its leaf element is still rendered.
                Some(pos) => Self::reconcile_attached(model, marker, &leaves, &layout, pos),
                None => Self::reconcile_detached(model, marker, &leaves, &layout),
            },
        }
    }

    /// Set the model selection from the external selection when it maps.
    pub fn sync_selection<S, M>(surface: &S, model: &mut M) -> ModelResult<bool>
    where
        S: Surface + ?Sized,
        M: DocumentModel + ?Sized,
    {
        let Some(selection) = surface.selection() else {
            return Ok(false);
        };
        match core_surface::selection_to_model_range(surface, &selection, model) {
            Some(range) => {
                model.set_selection(range)?;
                Ok(true)
            }
            None => {
                warn!(target: "ime.reconcile", "selection_sync_skipped");
                Ok(false)
            }
        }
    }

    fn reconcile_attached<M>(
        model: &mut M,
        marker: OffsetKey,
        leaves: &[Leaf],
        layout: &[RenderedLeaf],
        pos: usize,
    ) -> ModelResult<Reconciled>
    where
        M: DocumentModel + ?Sized,
    {
        let rendered = &layout[pos];
        let aligned = is_aligned(leaves, layout, 0);
        let (start, end, marks) = match leaf_span(leaves, rendered.index) {
            Some((start, end)) if aligned => (start, end, leaves[rendered.index].marks.clone()),
            _ => {
                let (start, end) = span_between(leaves, layout, rendered.index, rendered.index);
                (start, end, marks_at(leaves, start))
            }
        };
        trace!(
            target: "ime.reconcile",
            marker = %marker,
            aligned,
            start,
            end,
            "leaf_span_located"
        );
        Self::replace_span(model, marker.key, leaves, (start, end), &rendered.text, &marks)
    }

    fn reconcile_detached<M>(
        model: &mut M,
        marker: OffsetKey,
        leaves: &[Leaf],
        layout: &[RenderedLeaf],
    ) -> ModelResult<Reconciled>
    where
        M: DocumentModel + ?Sized,
    {
        let key = marker.key;
        let high = marker.index;
        let mut low = high;
        while low > 0 && !layout.iter().any(|r| r.index == low - 1) {
            low -= 1;
        }
        let predecessor = low
            .checked_sub(1)
            .and_then(|i| layout.iter().find(|r| r.index == i));

        if !is_aligned(leaves, layout, high - low + 1) {
            // Drifted: the run and its predecessor become the predecessor's text.
            let from = predecessor.map_or(low, |p| p.index);
            let (start, end) = span_between(leaves, layout, from, high);
            let text = predecessor.map_or("", |p| p.text.as_str());
            debug!(target: "ime.reconcile", marker = %marker, start, end, "detached_run_merged");
            return match Self::replace_span(model, key, leaves, (start, end), text, &marks_at(leaves, start))? {
                Reconciled::Replaced { range, .. } if predecessor.is_some() => Ok(Reconciled::Removed {
                    ranges: Vec::new(),
                    replaced: Some(range),
                }),
                Reconciled::Replaced { range, .. } => Ok(Reconciled::Removed {
                    ranges: vec![range],
                    replaced: None,
                }),
                other => Ok(other),
            };
        }

        let mut ranges = Vec::new();
        for index in (low..=high).rev() {
            if let Some((start, end)) = leaf_span(leaves, index) {
                ranges.push(Range::within(key, start, end));
            }
        }
        let predecessor_span = predecessor.and_then(|p| leaf_span(leaves, p.index).map(|span| (p, span)));

        for range in &ranges {
            model.delete_at_range(*range)?;
            debug!(target: "ime.reconcile", marker = %marker, range = ?range, "detached_leaf_removed");
        }
        let mut replaced = None;
        if let Some((pred, (start, end))) = predecessor_span {
            let current = model.leaves(key).unwrap_or_default();
            let marks = leaves[pred.index].marks.clone();
            if let Reconciled::Replaced { range, .. } =
                Self::replace_span(model, key, &current, (start, end), &pred.text, &marks)?
            {
                replaced = Some(range);
            }
        }
        if ranges.is_empty() && replaced.is_none() {
            return Ok(Reconciled::Unchanged);
        }
        Ok(Reconciled::Removed { ranges, replaced })
    }

    /// Replace model chars `[start, end)` of `key` with `next` unless they
    /// already match.
    fn replace_span<M>(
        model: &mut M,
        key: NodeKey,
        leaves: &[Leaf],
        (start, end): (usize, usize),
        next: &str,
        marks: &Marks,
    ) -> ModelResult<Reconciled>
    where
        M: DocumentModel + ?Sized,
    {
        if slice(leaves, start, end) == next {
            trace!(target: "ime.reconcile", key = %key, start, end, "reconcile_unchanged");
            return Ok(Reconciled::Unchanged);
        }
        let range = Range::within(key, start, end);
        model.replace_text_in_range(range, next, marks)?;
        debug!(
            target: "ime.reconcile",
            key = %key,
            start,
            end,
            new_len = next.chars().count(),
            "reconcile_replaced"
        );
        Ok(Reconciled::Replaced { key, range })
    }
}
