// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The selection bridge: abstract selections ↔ the native text range.
//!
//! Reading walks up from a native endpoint to the nearest element tagged
//! `data-block-id`, finds its editable descendant and counts `char`s by
//! in-order traversal of text and line-break nodes. Every line break
//! counts one newline — except a trailing placeholder break, which counts
//! zero (platforms park one at the end of editable elements).
//!
//! Writing resolves the offsets back to (node, in-node offset) pairs with
//! the same walk. For a backward selection the range is first applied
//! forward, then re-applied with the endpoints swapped so the platform
//! keeps the direction. While a write is in flight a re-entrancy flag
//! suppresses the read path, so restoring a caret never re-enters the
//! input pipeline. A failed write is logged and leaves the platform range
//! untouched.

use std::cell::Cell;

use nexo_vdom::{NativeRange, NodeId, PageDom};

use crate::block::BlockId;
use crate::document::Document;
use crate::selection::{Selection, SelectionPoint};

pub const BLOCK_ID_ATTR: &str = "data-block-id";
pub const EDITABLE_ATTR: &str = "contenteditable";

/// A resolved native position: a node plus an offset within it (chars for
/// text nodes, child index for elements).
type NativePosition = (NodeId, usize);

#[derive(Default)]
pub struct SelectionBridge {
    writing: Cell<bool>,
}

impl SelectionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a write is in flight (the read path is suppressed).
    pub fn is_writing(&self) -> bool {
        self.writing.get()
    }

    // ─── Read: platform → abstract ──────────────────────────────────────

    /// Interpret the current native range as an abstract selection.
    /// Returns `None` while writing, when there is no range, or when the
    /// endpoints do not resolve to known blocks.
    pub fn read_selection(&self, page: &PageDom, doc: &Document) -> Option<Selection> {
        if self.writing.get() {
            return None;
        }
        let range = page.selection()?;
        let anchor = self.locate_endpoint(page, doc, range.anchor)?;
        let focus = self.locate_endpoint(page, doc, range.focus)?;
        if anchor.block_id == focus.block_id {
            Some(Selection::text_range(
                anchor.block_id,
                anchor.offset,
                focus.offset,
            ))
        } else {
            Some(Selection::cross_block(doc, anchor, focus))
        }
    }

    fn locate_endpoint(
        &self,
        page: &PageDom,
        doc: &Document,
        position: NativePosition,
    ) -> Option<SelectionPoint> {
        let block_el = page.ancestor_with_attr(position.0, BLOCK_ID_ATTR)?;
        let block_id = BlockId::from(page.attr(block_el, BLOCK_ID_ATTR)?);
        if !doc.contains(&block_id) {
            return None;
        }
        let editable = editable_of(page, block_el).unwrap_or(block_el);
        let offset = position_to_offset(page, editable, position)?;
        Some(SelectionPoint::new(block_id, offset))
    }

    // ─── Write: abstract → platform ─────────────────────────────────────

    /// Apply an abstract selection to the native range. Block sets and
    /// `None` clear the native range (block highlighting is a class
    /// concern, not a text-range one).
    pub fn write_selection(&self, page: &mut PageDom, doc: &Document, selection: &Selection) {
        self.writing.set(true);
        let applied = self.apply_selection(page, doc, selection);
        self.writing.set(false);
        if applied.is_none() {
            log::warn!("selection bridge could not build a native range; platform range left as-is");
        }
    }

    fn apply_selection(
        &self,
        page: &mut PageDom,
        doc: &Document,
        selection: &Selection,
    ) -> Option<()> {
        match selection {
            Selection::None | Selection::BlockSet { .. } => {
                page.clear_selection();
                Some(())
            }
            Selection::Caret(point) => {
                let position = self.resolve_point(page, doc, point)?;
                page.set_selection(NativeRange::caret(position.0, position.1));
                Some(())
            }
            Selection::TextRange {
                block_id,
                anchor,
                focus,
            } => {
                let anchor_point = SelectionPoint::new(block_id.clone(), *anchor);
                let focus_point = SelectionPoint::new(block_id.clone(), *focus);
                self.apply_two_point(page, doc, &anchor_point, &focus_point, anchor <= focus)
            }
            Selection::CrossBlock { anchor, focus, .. } => {
                let forward = selection.is_forward(doc);
                self.apply_two_point(page, doc, anchor, focus, forward)
            }
        }
    }

    fn apply_two_point(
        &self,
        page: &mut PageDom,
        doc: &Document,
        anchor: &SelectionPoint,
        focus: &SelectionPoint,
        forward: bool,
    ) -> Option<()> {
        let anchor_pos = self.resolve_point(page, doc, anchor)?;
        let focus_pos = self.resolve_point(page, doc, focus)?;
        // Set start/end forward first, then extend back to the anchor so
        // the platform records the backward direction.
        let (start, end) = if forward {
            (anchor_pos, focus_pos)
        } else {
            (focus_pos, anchor_pos)
        };
        page.set_selection(NativeRange {
            anchor: start,
            focus: end,
        });
        if !forward {
            page.set_selection(NativeRange {
                anchor: anchor_pos,
                focus: focus_pos,
            });
        }
        Some(())
    }

    fn resolve_point(
        &self,
        page: &PageDom,
        doc: &Document,
        point: &SelectionPoint,
    ) -> Option<NativePosition> {
        let block = doc.get_block(&point.block_id)?;
        let block_el = page.find_by_attr(BLOCK_ID_ATTR, point.block_id.as_str())?;
        let editable = editable_of(page, block_el).unwrap_or(block_el);
        let offset = point.offset.min(block.text_len());
        Some(offset_to_position(page, editable, offset))
    }

    // ─── Convenience ────────────────────────────────────────────────────

    /// Focus the block's editable descendant.
    pub fn focus_block(&self, page: &mut PageDom, id: &BlockId) {
        let Some(block_el) = page.find_by_attr(BLOCK_ID_ATTR, id.as_str()) else {
            log::warn!("focus_block: no element for block {id}");
            return;
        };
        let target = editable_of(page, block_el).unwrap_or(block_el);
        page.set_focus(Some(target));
    }

    pub fn set_cursor(&self, page: &mut PageDom, doc: &Document, id: &BlockId, offset: usize) {
        self.write_selection(page, doc, &Selection::caret(id.clone(), offset));
        self.focus_block(page, id);
    }

    pub fn set_cursor_to_end(&self, page: &mut PageDom, doc: &Document, id: &BlockId) {
        let offset = doc.get_block(id).map(|b| b.text_len()).unwrap_or(0);
        self.set_cursor(page, doc, id, offset);
    }
}

/// The editable descendant of a block element.
pub(crate) fn editable_of(page: &PageDom, block_el: NodeId) -> Option<NodeId> {
    page.descendant_with_attr(block_el, EDITABLE_ATTR, "true")
}

// ─── Offset walking ─────────────────────────────────────────────────────

enum Walk {
    Found(usize),
    Continue(usize),
}

/// Chars contributed by a line break: one, unless it is the trailing
/// placeholder break of the editable.
fn br_len(page: &PageDom, editable: NodeId, br: NodeId) -> usize {
    if page.last_inline_node(editable) == Some(br) {
        0
    } else {
        1
    }
}

/// Map a native (node, in-node offset) to a char offset from the start of
/// `editable`. Returns `None` when the node is not inside the editable.
fn position_to_offset(
    page: &PageDom,
    editable: NodeId,
    position: NativePosition,
) -> Option<usize> {
    if position.0 == editable && page.children(editable).is_empty() {
        return Some(0);
    }
    match walk_to_position(page, editable, editable, position) {
        Walk::Found(offset) => Some(offset),
        Walk::Continue(total) => {
            // The endpoint was the editable element itself with a child
            // index past everything we walked, or a node we never met;
            // clamp to the end for the former.
            if position.0 == editable {
                Some(total)
            } else {
                None
            }
        }
    }
}

fn walk_to_position(
    page: &PageDom,
    editable: NodeId,
    current: NodeId,
    position: NativePosition,
) -> Walk {
    let mut acc = 0;
    if current == position.0 && page.element(current).is_some() {
        // Element endpoint: the offset is a child index; count the
        // content of the children before it.
        for child in page.children(current).iter().take(position.1) {
            acc += subtree_len(page, editable, *child);
        }
        return Walk::Found(acc);
    }
    if page.is_text(current) {
        let len = page.text(current).map(|t| t.chars().count()).unwrap_or(0);
        return if current == position.0 {
            Walk::Found(position.1.min(len))
        } else {
            Walk::Continue(len)
        };
    }
    if page.is_br(current) {
        return Walk::Continue(br_len(page, editable, current));
    }
    for child in page.children(current).to_vec() {
        match walk_to_position(page, editable, child, position) {
            Walk::Found(offset) => return Walk::Found(acc + offset),
            Walk::Continue(len) => acc += len,
        }
    }
    Walk::Continue(acc)
}

fn subtree_len(page: &PageDom, editable: NodeId, node: NodeId) -> usize {
    if page.is_text(node) {
        return page.text(node).map(|t| t.chars().count()).unwrap_or(0);
    }
    if page.is_br(node) {
        return br_len(page, editable, node);
    }
    page.children(node)
        .iter()
        .map(|child| subtree_len(page, editable, *child))
        .sum()
}

/// Map a char offset to the native (node, in-node offset) it lands in.
/// Offsets beyond the content clamp to the end; an empty editable yields
/// `(editable, 0)`.
fn offset_to_position(page: &PageDom, editable: NodeId, offset: usize) -> NativePosition {
    match walk_to_offset(page, editable, editable, offset) {
        WalkOffset::Found(position) => position,
        WalkOffset::Continue(_) => {
            // Past the end: land after the last child of the editable.
            let children = page.children(editable);
            (editable, children.len())
        }
    }
}

enum WalkOffset {
    Found(NativePosition),
    Continue(usize),
}

fn walk_to_offset(
    page: &PageDom,
    editable: NodeId,
    current: NodeId,
    offset: usize,
) -> WalkOffset {
    if page.is_text(current) {
        let len = page.text(current).map(|t| t.chars().count()).unwrap_or(0);
        return if offset <= len {
            WalkOffset::Found((current, offset))
        } else {
            WalkOffset::Continue(len)
        };
    }
    if page.is_br(current) {
        let len = br_len(page, editable, current);
        return if offset < len {
            // A caret "at" a line break sits before it in its parent.
            let parent = page.parent(current).unwrap_or(editable);
            let index = page
                .children(parent)
                .iter()
                .position(|c| *c == current)
                .unwrap_or(0);
            WalkOffset::Found((parent, index))
        } else {
            WalkOffset::Continue(len)
        };
    }
    let mut remaining = offset;
    for child in page.children(current).to_vec() {
        match walk_to_offset(page, editable, child, remaining) {
            WalkOffset::Found(position) => return WalkOffset::Found(position),
            WalkOffset::Continue(len) => remaining -= len.min(remaining),
        }
    }
    WalkOffset::Continue(offset - remaining)
}
