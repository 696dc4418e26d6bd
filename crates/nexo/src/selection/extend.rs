// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Selection movement: extending by character, word, line, block or all.
//!
//! Character and word movement walk the plain text (words via
//! unicode-segmentation); `line` approximates by jumping to adjacent block
//! boundaries — faithful line geometry needs host rects and stays with the
//! bridge; `block` jumps to the previous/next editable block, skipping
//! void blocks; `all` selects document-wide.

use unicode_segmentation::UnicodeSegmentation;

use crate::block::BlockId;
use crate::document::Document;
use crate::selection::{Selection, SelectionPoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Up,
    Down,
}

impl Direction {
    fn is_forward(self) -> bool {
        matches!(self, Direction::Forward | Direction::Down)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtendUnit {
    Character,
    Word,
    Line,
    Block,
    All,
}

impl Selection {
    /// Move the focus endpoint by `unit` in `direction`, keeping the
    /// anchor. A caret moves wholesale; block sets grow at the moving
    /// edge. `All` always selects the whole document.
    pub fn extend(&self, direction: Direction, unit: ExtendUnit, doc: &Document) -> Selection {
        if matches!(unit, ExtendUnit::All) {
            return select_all(doc);
        }
        match self {
            Selection::None => Selection::None,
            Selection::Caret(point) => {
                let moved = move_point(doc, point, direction, unit);
                Selection::Caret(moved)
            }
            Selection::TextRange {
                block_id,
                anchor,
                focus,
            } => {
                let focus_point = SelectionPoint::new(block_id.clone(), *focus);
                let moved = move_point(doc, &focus_point, direction, unit);
                if moved.block_id == *block_id {
                    Selection::text_range(block_id.clone(), *anchor, moved.offset)
                } else {
                    Selection::cross_block(
                        doc,
                        SelectionPoint::new(block_id.clone(), *anchor),
                        moved,
                    )
                }
            }
            Selection::CrossBlock { anchor, focus, .. } => {
                let moved = move_point(doc, focus, direction, unit);
                Selection::cross_block(doc, anchor.clone(), moved)
            }
            Selection::BlockSet { block_ids } => {
                extend_block_set(doc, block_ids, direction)
            }
        }
    }
}

/// Move one endpoint by a unit. Character and word movement cross block
/// boundaries at the block's edges.
pub(crate) fn move_point(
    doc: &Document,
    point: &SelectionPoint,
    direction: Direction,
    unit: ExtendUnit,
) -> SelectionPoint {
    let Some(block) = doc.get_block(&point.block_id) else {
        return point.clone();
    };
    let len = block.text_len();
    let offset = point.offset.min(len);
    let forward = direction.is_forward();

    match unit {
        ExtendUnit::Character => {
            if forward {
                if offset < len {
                    SelectionPoint::new(point.block_id.clone(), offset + 1)
                } else {
                    enter_neighbour(doc, &point.block_id, forward).unwrap_or_else(|| point.clone())
                }
            } else if offset > 0 {
                SelectionPoint::new(point.block_id.clone(), offset - 1)
            } else {
                enter_neighbour(doc, &point.block_id, forward).unwrap_or_else(|| point.clone())
            }
        }
        ExtendUnit::Word => {
            let target = word_boundary(block.text(), offset, forward);
            match target {
                Some(target) => SelectionPoint::new(point.block_id.clone(), target),
                None => enter_neighbour(doc, &point.block_id, forward)
                    .unwrap_or_else(|| SelectionPoint::new(point.block_id.clone(), if forward { len } else { 0 })),
            }
        }
        ExtendUnit::Line => {
            // Block-boundary approximation of line movement.
            if forward {
                if offset < len {
                    SelectionPoint::new(point.block_id.clone(), len)
                } else {
                    match doc.next_editable_block(&point.block_id) {
                        Some(next) => SelectionPoint::new(next.id.clone(), next.text_len()),
                        None => point.clone(),
                    }
                }
            } else if offset > 0 {
                SelectionPoint::new(point.block_id.clone(), 0)
            } else {
                match doc.previous_editable_block(&point.block_id) {
                    Some(previous) => SelectionPoint::new(previous.id.clone(), 0),
                    None => point.clone(),
                }
            }
        }
        ExtendUnit::Block => {
            if forward {
                match doc.next_editable_block(&point.block_id) {
                    Some(next) => SelectionPoint::new(next.id.clone(), 0),
                    None => point.clone(),
                }
            } else {
                match doc.previous_editable_block(&point.block_id) {
                    Some(previous) => SelectionPoint::new(previous.id.clone(), previous.text_len()),
                    None => point.clone(),
                }
            }
        }
        ExtendUnit::All => point.clone(),
    }
}

/// Step into the adjacent editable block: its start going forward, its end
/// going backward.
fn enter_neighbour(doc: &Document, from: &BlockId, forward: bool) -> Option<SelectionPoint> {
    if forward {
        doc.next_editable_block(from)
            .map(|next| SelectionPoint::new(next.id.clone(), 0))
    } else {
        doc.previous_editable_block(from)
            .map(|previous| SelectionPoint::new(previous.id.clone(), previous.text_len()))
    }
}

/// The next word boundary strictly beyond `offset`, or `None` at the edge.
fn word_boundary(text: &str, offset: usize, forward: bool) -> Option<usize> {
    let boundaries: Vec<usize> = {
        let mut out = vec![0];
        let mut count = 0;
        for word in text.split_word_bounds() {
            count += word.chars().count();
            out.push(count);
        }
        out.dedup();
        out
    };
    if forward {
        boundaries.iter().copied().find(|b| *b > offset)
    } else {
        boundaries.iter().rev().copied().find(|b| *b < offset)
    }
}

/// Grow a block set at the moving edge.
fn extend_block_set(doc: &Document, block_ids: &[BlockId], direction: Direction) -> Selection {
    let order = doc.flattened_ids();
    let selection = Selection::select_blocks(block_ids.to_vec());
    let edge = if direction.is_forward() {
        block_ids
            .iter()
            .filter_map(|id| order.iter().position(|o| o == id))
            .max()
            .and_then(|index| order.get(index + 1))
    } else {
        block_ids
            .iter()
            .filter_map(|id| order.iter().position(|o| o == id))
            .min()
            .and_then(|index| index.checked_sub(1).and_then(|i| order.get(i)))
    };
    match edge {
        Some(next) => selection.with_block_added(next.clone()),
        None => selection,
    }
}

/// Select the whole document as a cross-block range (or a text range when
/// there is a single block).
fn select_all(doc: &Document) -> Selection {
    let flattened = doc.flattened_blocks();
    let (Some(first), Some(last)) = (flattened.first(), flattened.last()) else {
        return Selection::None;
    };
    if first.id == last.id {
        return Selection::text_range(first.id.clone(), 0, first.text_len());
    }
    Selection::cross_block(
        doc,
        SelectionPoint::new(first.id.clone(), 0),
        SelectionPoint::new(last.id.clone(), last.text_len()),
    )
}
