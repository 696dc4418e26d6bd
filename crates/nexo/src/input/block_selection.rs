// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Multi-block selection gestures, and block-set copy/cut/delete.

use crate::block::BlockId;
use crate::controller::EditorController;
use crate::input::{ClipboardPayload, MouseEvent, MouseKind};
use crate::operation::Operation;
use crate::selection::Selection;
use crate::block::Block;
use crate::event::EventSource;

/// Mouse gesture state for block-level selection: plain click clears,
/// shift-click ranges from the anchor, Ctrl/Cmd-click toggles, and a drag
/// with a known anchor extends the range.
#[derive(Default)]
pub struct SelectionGesture {
    anchor: Option<BlockId>,
    dragging: bool,
}

impl SelectionGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_mouse(&mut self, controller: &mut EditorController, event: &MouseEvent) {
        match event.kind {
            MouseKind::Down => {
                let Some(id) = &event.block_id else {
                    // Click outside any block clears a block selection.
                    if controller.get_selection().is_block_selection() {
                        controller.set_selection(Selection::None);
                    }
                    self.anchor = None;
                    return;
                };
                if event.primary {
                    let toggled = controller.get_selection().with_block_toggled(id.clone());
                    controller.set_selection(toggled);
                    self.anchor = Some(id.clone());
                } else if event.shift {
                    if let Some(anchor) = self.anchor.clone() {
                        self.select_range(controller, &anchor, id);
                    } else {
                        self.anchor = Some(id.clone());
                    }
                } else {
                    // Plain click: drop any existing block-set and arm the
                    // anchor for a possible drag.
                    if controller.get_selection().is_block_selection() {
                        controller.set_selection(Selection::None);
                    }
                    self.anchor = Some(id.clone());
                    self.dragging = true;
                }
            }
            MouseKind::Move => {
                if !event.button_down || !self.dragging {
                    return;
                }
                let (Some(anchor), Some(id)) = (self.anchor.clone(), &event.block_id) else {
                    return;
                };
                if anchor != *id {
                    self.select_range(controller, &anchor, id);
                }
            }
            MouseKind::Up => {
                self.dragging = false;
            }
        }
    }

    fn select_range(&self, controller: &mut EditorController, from: &BlockId, to: &BlockId) {
        let order = controller.get_document().flattened_ids();
        let (Some(a), Some(b)) = (
            order.iter().position(|id| id == from),
            order.iter().position(|id| id == to),
        ) else {
            return;
        };
        let (lo, hi) = (a.min(b), a.max(b));
        controller.set_selection(Selection::select_blocks(order[lo..=hi].to_vec()));
    }
}

/// Copy the selected blocks: plain text one block per line, plus a
/// minimal HTML form tagging each block's type.
pub fn copy_selection(controller: &EditorController) -> Option<ClipboardPayload> {
    let selection = controller.get_selection();
    let content = selection.content(controller.get_document());
    if content.block_ids.is_empty() {
        return None;
    }
    let mut html = String::new();
    for (id, text) in &content.per_block_text {
        let kind = controller
            .get_block(id)
            .map(|block| block.kind.to_string())
            .unwrap_or_else(|| "paragraph".to_owned());
        html.push_str(&format!(
            "<div data-block-type=\"{}\">{}</div>",
            kind,
            html_escape::encode_text(text)
        ));
    }
    Some(ClipboardPayload {
        plain_text: content.plain_text,
        html,
    })
}

/// Cut: copy, then delete the selected blocks.
pub fn cut_selection(controller: &mut EditorController) -> Option<ClipboardPayload> {
    let payload = copy_selection(controller)?;
    delete_selected_blocks(controller);
    Some(payload)
}

/// Delete every block in the active block-set as one transaction, then
/// put the caret on the block at the deleted range's start index,
/// clamped.
pub fn delete_selected_blocks(controller: &mut EditorController) {
    let Selection::BlockSet { block_ids } = controller.get_selection().clone() else {
        return;
    };
    let doc = controller.get_document();
    let order = doc.flattened_ids();
    let start_index = block_ids
        .iter()
        .filter_map(|id| order.iter().position(|o| o == id))
        .min()
        .unwrap_or(0);

    // Descendants of other selected blocks go down with their parents;
    // deleting them twice is a harmless no-op in the log.
    let mut operations: Vec<Operation> = block_ids
        .iter()
        .map(|id| Operation::DeleteBlock {
            block_id: id.clone(),
        })
        .collect();
    let subtree: std::collections::HashSet<&BlockId> = block_ids
        .iter()
        .flat_map(|id| {
            std::iter::once(id).chain(doc.descendants(id).into_iter().map(|b| &b.id))
        })
        .collect();
    if subtree.len() == doc.block_count() {
        operations.push(Operation::InsertBlock {
            blocks: vec![Block::empty_paragraph()],
            parent_id: None,
            index: 0,
        });
    }

    controller.set_selection(Selection::None);
    controller.execute("delete blocks", operations, EventSource::User);

    let remaining = controller.get_document().flattened_ids();
    if remaining.is_empty() {
        return;
    }
    let target = remaining[start_index.min(remaining.len() - 1)].clone();
    controller.set_cursor_to_start(&target);
}
