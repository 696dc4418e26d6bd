// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The abstract selection model.
//!
//! Selections are values over the document — no DOM involved. The bridge
//! translates them to and from the platform's native range; everything
//! else (collapse, extend, block-set algebra, range/content extraction)
//! happens here. Offsets are `char` offsets into a block's text.

mod extend;

pub use extend::{Direction, ExtendUnit};

use crate::block::BlockId;
use crate::document::Document;

/// One endpoint of a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionPoint {
    pub block_id: BlockId,
    pub offset: usize,
}

impl SelectionPoint {
    pub fn new(block_id: BlockId, offset: usize) -> Self {
        Self { block_id, offset }
    }
}

/// Where to collapse a selection to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollapseTarget {
    Anchor,
    Focus,
    Start,
    End,
}

/// An abstract selection. Two selections are equal only when the variant
/// and every endpoint match; setting an equal selection is not a change.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    /// A single insertion point.
    Caret(SelectionPoint),
    /// Anchor and focus within one block, direction preserved.
    TextRange {
        block_id: BlockId,
        anchor: usize,
        focus: usize,
    },
    /// Anchor and focus in different blocks, plus the blocks fully
    /// contained between them in flattened order.
    CrossBlock {
        anchor: SelectionPoint,
        focus: SelectionPoint,
        spanned: Vec<BlockId>,
    },
    /// An ordered set of whole blocks.
    BlockSet { block_ids: Vec<BlockId> },
}

/// The normalised extent of a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start_block_id: BlockId,
    pub start_offset: usize,
    pub end_block_id: BlockId,
    pub end_offset: usize,
    /// Every covered block in flattened order, endpoints included.
    pub block_ids: Vec<BlockId>,
    pub is_collapsed: bool,
}

/// The text content covered by a selection.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectionContent {
    pub plain_text: String,
    pub per_block_text: Vec<(BlockId, String)>,
    pub block_ids: Vec<BlockId>,
    pub is_multi_block: bool,
}

impl Selection {
    pub fn caret(block_id: BlockId, offset: usize) -> Self {
        Selection::Caret(SelectionPoint::new(block_id, offset))
    }

    /// A within-block range; collapses to a caret when the endpoints meet.
    pub fn text_range(block_id: BlockId, anchor: usize, focus: usize) -> Self {
        if anchor == focus {
            Selection::caret(block_id, anchor)
        } else {
            Selection::TextRange {
                block_id,
                anchor,
                focus,
            }
        }
    }

    /// A range across two blocks. The spanned list (blocks strictly
    /// between the endpoints) is derived from the document; endpoints in
    /// the same block degrade to a text range.
    pub fn cross_block(doc: &Document, anchor: SelectionPoint, focus: SelectionPoint) -> Self {
        if anchor.block_id == focus.block_id {
            return Selection::text_range(anchor.block_id, anchor.offset, focus.offset);
        }
        let spanned = spanned_between(doc, &anchor.block_id, &focus.block_id);
        Selection::CrossBlock {
            anchor,
            focus,
            spanned,
        }
    }

    pub fn select_block(block_id: BlockId) -> Self {
        Selection::BlockSet {
            block_ids: vec![block_id],
        }
    }

    pub fn select_blocks(block_ids: Vec<BlockId>) -> Self {
        if block_ids.is_empty() {
            Selection::None
        } else {
            Selection::BlockSet { block_ids }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self, Selection::Caret(_))
    }

    pub fn is_block_selection(&self) -> bool {
        matches!(self, Selection::BlockSet { .. })
    }

    pub fn is_block_selected(&self, id: &BlockId) -> bool {
        match self {
            Selection::BlockSet { block_ids } => block_ids.contains(id),
            _ => false,
        }
    }

    /// The block the caret or focus endpoint sits in.
    pub fn focus_block(&self) -> Option<&BlockId> {
        match self {
            Selection::None => None,
            Selection::Caret(point) => Some(&point.block_id),
            Selection::TextRange { block_id, .. } => Some(block_id),
            Selection::CrossBlock { focus, .. } => Some(&focus.block_id),
            Selection::BlockSet { block_ids } => block_ids.last(),
        }
    }

    /// Add a block to the set. A non-set selection becomes a fresh set.
    pub fn with_block_added(&self, id: BlockId) -> Selection {
        match self {
            Selection::BlockSet { block_ids } if block_ids.contains(&id) => self.clone(),
            Selection::BlockSet { block_ids } => {
                let mut block_ids = block_ids.clone();
                block_ids.push(id);
                Selection::BlockSet { block_ids }
            }
            _ => Selection::select_block(id),
        }
    }

    /// Remove a block from the set; removing the last member clears the
    /// selection.
    pub fn with_block_removed(&self, id: &BlockId) -> Selection {
        match self {
            Selection::BlockSet { block_ids } => {
                let block_ids: Vec<BlockId> =
                    block_ids.iter().filter(|b| *b != id).cloned().collect();
                Selection::select_blocks(block_ids)
            }
            other => other.clone(),
        }
    }

    pub fn with_block_toggled(&self, id: BlockId) -> Selection {
        if self.is_block_selected(&id) {
            self.with_block_removed(&id)
        } else {
            self.with_block_added(id)
        }
    }

    /// Valid iff every referenced block resolves and every offset is
    /// within its block's text.
    pub fn is_valid(&self, doc: &Document) -> bool {
        let point_ok = |point: &SelectionPoint| {
            doc.get_block(&point.block_id)
                .is_some_and(|block| point.offset <= block.text_len())
        };
        match self {
            Selection::None => true,
            Selection::Caret(point) => point_ok(point),
            Selection::TextRange {
                block_id,
                anchor,
                focus,
            } => doc
                .get_block(block_id)
                .is_some_and(|block| *anchor <= block.text_len() && *focus <= block.text_len()),
            Selection::CrossBlock { anchor, focus, .. } => point_ok(anchor) && point_ok(focus),
            Selection::BlockSet { block_ids } => block_ids.iter().all(|id| doc.contains(id)),
        }
    }

    /// Is the selection running with the document order?
    pub fn is_forward(&self, doc: &Document) -> bool {
        match self {
            Selection::TextRange { anchor, focus, .. } => anchor <= focus,
            Selection::CrossBlock { anchor, focus, .. } => {
                let order = doc.flattened_ids();
                let a = order.iter().position(|id| *id == anchor.block_id);
                let f = order.iter().position(|id| *id == focus.block_id);
                a <= f
            }
            _ => true,
        }
    }

    /// Collapse to a caret at the requested end.
    pub fn collapse(&self, to: CollapseTarget, doc: &Document) -> Selection {
        match self {
            Selection::None => Selection::None,
            Selection::Caret(point) => Selection::Caret(point.clone()),
            Selection::TextRange {
                block_id,
                anchor,
                focus,
            } => {
                let offset = match to {
                    CollapseTarget::Anchor => *anchor,
                    CollapseTarget::Focus => *focus,
                    CollapseTarget::Start => *anchor.min(focus),
                    CollapseTarget::End => *anchor.max(focus),
                };
                Selection::caret(block_id.clone(), offset)
            }
            Selection::CrossBlock { anchor, focus, .. } => {
                let forward = self.is_forward(doc);
                let point = match to {
                    CollapseTarget::Anchor => anchor,
                    CollapseTarget::Focus => focus,
                    CollapseTarget::Start => {
                        if forward {
                            anchor
                        } else {
                            focus
                        }
                    }
                    CollapseTarget::End => {
                        if forward {
                            focus
                        } else {
                            anchor
                        }
                    }
                };
                Selection::Caret(point.clone())
            }
            Selection::BlockSet { block_ids } => {
                let id = match to {
                    CollapseTarget::Anchor | CollapseTarget::Start => block_ids.first(),
                    CollapseTarget::Focus | CollapseTarget::End => block_ids.last(),
                };
                match id {
                    Some(id) => {
                        let offset = match to {
                            CollapseTarget::Anchor | CollapseTarget::Start => 0,
                            _ => doc.get_block(id).map(|b| b.text_len()).unwrap_or(0),
                        };
                        Selection::caret(id.clone(), offset)
                    }
                    None => Selection::None,
                }
            }
        }
    }

    /// The normalised extent of the selection against `doc`.
    pub fn range(&self, doc: &Document) -> Option<SelectionRange> {
        match self {
            Selection::None => None,
            Selection::Caret(point) => Some(SelectionRange {
                start_block_id: point.block_id.clone(),
                start_offset: point.offset,
                end_block_id: point.block_id.clone(),
                end_offset: point.offset,
                block_ids: vec![point.block_id.clone()],
                is_collapsed: true,
            }),
            Selection::TextRange {
                block_id,
                anchor,
                focus,
            } => Some(SelectionRange {
                start_block_id: block_id.clone(),
                start_offset: *anchor.min(focus),
                end_block_id: block_id.clone(),
                end_offset: *anchor.max(focus),
                block_ids: vec![block_id.clone()],
                is_collapsed: anchor == focus,
            }),
            Selection::CrossBlock { anchor, focus, .. } => {
                let (start, end) = if self.is_forward(doc) {
                    (anchor, focus)
                } else {
                    (focus, anchor)
                };
                let order = doc.flattened_ids();
                let start_index = order.iter().position(|id| *id == start.block_id)?;
                let end_index = order.iter().position(|id| *id == end.block_id)?;
                Some(SelectionRange {
                    start_block_id: start.block_id.clone(),
                    start_offset: start.offset,
                    end_block_id: end.block_id.clone(),
                    end_offset: end.offset,
                    block_ids: order[start_index..=end_index].to_vec(),
                    is_collapsed: false,
                })
            }
            Selection::BlockSet { block_ids } => {
                let first = block_ids.first()?;
                let last = block_ids.last()?;
                Some(SelectionRange {
                    start_block_id: first.clone(),
                    start_offset: 0,
                    end_block_id: last.clone(),
                    end_offset: doc.get_block(last).map(|b| b.text_len()).unwrap_or(0),
                    block_ids: block_ids.clone(),
                    is_collapsed: false,
                })
            }
        }
    }

    /// The text covered by the selection, per block and joined.
    pub fn content(&self, doc: &Document) -> SelectionContent {
        let Some(range) = self.range(doc) else {
            return SelectionContent::default();
        };
        let mut per_block_text = Vec::new();
        for id in &range.block_ids {
            let Some(block) = doc.get_block(id) else {
                continue;
            };
            let chars: Vec<char> = block.text().chars().collect();
            let start = if *id == range.start_block_id {
                range.start_offset.min(chars.len())
            } else {
                0
            };
            let end = if *id == range.end_block_id && !self.is_block_selection() {
                range.end_offset.min(chars.len())
            } else {
                chars.len()
            };
            let slice: String = chars[start.min(end)..end].iter().collect();
            per_block_text.push((id.clone(), slice));
        }
        let plain_text = per_block_text
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        SelectionContent {
            plain_text,
            is_multi_block: range.block_ids.len() > 1,
            block_ids: range.block_ids,
            per_block_text,
        }
    }
}

/// Blocks strictly between `a` and `b` in flattened order.
fn spanned_between(doc: &Document, a: &BlockId, b: &BlockId) -> Vec<BlockId> {
    let order = doc.flattened_ids();
    let (Some(ai), Some(bi)) = (
        order.iter().position(|id| id == a),
        order.iter().position(|id| id == b),
    ) else {
        return Vec::new();
    };
    let (lo, hi) = (ai.min(bi), ai.max(bi));
    if hi - lo <= 1 {
        return Vec::new();
    }
    order[lo + 1..hi].to_vec()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::doc_with_roots;

    #[test]
    fn equal_selections_compare_equal() {
        let id = BlockId::from("b1");
        assert_eq!(Selection::caret(id.clone(), 3), Selection::caret(id, 3));
        assert_ne!(
            Selection::caret(BlockId::from("b1"), 3),
            Selection::caret(BlockId::from("b1"), 4)
        );
    }

    #[test]
    fn a_zero_length_text_range_is_a_caret() {
        let sel = Selection::text_range(BlockId::from("b1"), 2, 2);
        assert!(sel.is_collapsed());
    }

    #[test]
    fn collapse_picks_the_requested_end() {
        let (doc, ids) = doc_with_roots(&["hello world"]);
        let sel = Selection::text_range(ids[0].clone(), 8, 2);
        assert_eq!(
            sel.collapse(CollapseTarget::Start, &doc),
            Selection::caret(ids[0].clone(), 2)
        );
        assert_eq!(
            sel.collapse(CollapseTarget::End, &doc),
            Selection::caret(ids[0].clone(), 8)
        );
        assert_eq!(
            sel.collapse(CollapseTarget::Anchor, &doc),
            Selection::caret(ids[0].clone(), 8)
        );
    }

    #[test]
    fn cross_block_records_the_spanned_blocks() {
        let (doc, ids) = doc_with_roots(&["a", "b", "c", "d"]);
        let sel = Selection::cross_block(
            &doc,
            SelectionPoint::new(ids[0].clone(), 1),
            SelectionPoint::new(ids[3].clone(), 0),
        );
        let Selection::CrossBlock { spanned, .. } = &sel else {
            panic!("expected a cross-block selection");
        };
        assert_eq!(*spanned, vec![ids[1].clone(), ids[2].clone()]);
    }

    #[test]
    fn backward_cross_block_range_normalises_endpoints() {
        let (doc, ids) = doc_with_roots(&["abc", "def"]);
        let sel = Selection::cross_block(
            &doc,
            SelectionPoint::new(ids[1].clone(), 2),
            SelectionPoint::new(ids[0].clone(), 1),
        );
        assert!(!sel.is_forward(&doc));
        let range = sel.range(&doc).unwrap();
        assert_eq!(range.start_block_id, ids[0]);
        assert_eq!(range.start_offset, 1);
        assert_eq!(range.end_block_id, ids[1]);
        assert_eq!(range.end_offset, 2);
    }

    #[test]
    fn block_set_algebra() {
        let (_, ids) = doc_with_roots(&["a", "b"]);
        let sel = Selection::select_block(ids[0].clone());
        let sel = sel.with_block_added(ids[1].clone());
        assert!(sel.is_block_selected(&ids[0]));
        assert!(sel.is_block_selected(&ids[1]));

        let sel = sel.with_block_toggled(ids[0].clone());
        assert!(!sel.is_block_selected(&ids[0]));

        let sel = sel.with_block_toggled(ids[1].clone());
        assert_eq!(sel, Selection::None);
    }

    #[test]
    fn validity_requires_resolving_ids_and_offsets() {
        let (doc, ids) = doc_with_roots(&["abc"]);
        assert!(Selection::caret(ids[0].clone(), 3).is_valid(&doc));
        assert!(!Selection::caret(ids[0].clone(), 4).is_valid(&doc));
        assert!(!Selection::caret(BlockId::generate(), 0).is_valid(&doc));
    }

    #[test]
    fn content_of_a_cross_block_selection() {
        let (doc, ids) = doc_with_roots(&["hello", "middle", "world"]);
        let sel = Selection::cross_block(
            &doc,
            SelectionPoint::new(ids[0].clone(), 3),
            SelectionPoint::new(ids[2].clone(), 2),
        );
        let content = sel.content(&doc);
        assert!(content.is_multi_block);
        assert_eq!(content.plain_text, "lo\nmiddle\nwo");
    }

    #[test]
    fn content_of_a_block_set_takes_whole_blocks() {
        let (doc, ids) = doc_with_roots(&["one", "two"]);
        let sel = Selection::select_blocks(ids.clone());
        let content = sel.content(&doc);
        assert_eq!(content.plain_text, "one\ntwo");
        assert_eq!(content.per_block_text.len(), 2);
    }
}
