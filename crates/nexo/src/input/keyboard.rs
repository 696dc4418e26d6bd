// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The keyboard handler.
//!
//! Enter and Backspace carry the block semantics (split, demote, merge);
//! Tab nests; Ctrl/Cmd chords cover history, formatting and block-set
//! clipboard. Before any structural Enter handling the current DOM text
//! is flushed into the store through the history-recording path, so undo
//! restores the text as it was before the gesture.

use crate::annotate::InlineFormat;
use crate::block::{BlockData, BlockType};
use crate::controller::EditorController;
use crate::geometry::{caret_near_bottom, caret_near_top};
use crate::input::{
    copy_selection, cut_selection, delete_selected_blocks, Key, KeyEvent, KeyOutcome,
};
use crate::render::Compiler;
use crate::selection::{Direction, ExtendUnit, Selection};

/// Pixels from a block edge within which vertical arrows leave the block.
const EDGE_THRESHOLD: f64 = 20.0;

pub fn handle_key(
    controller: &mut EditorController,
    compiler: &mut Compiler,
    event: &KeyEvent,
) -> KeyOutcome {
    let Some(key) = event.key else {
        return KeyOutcome::pass();
    };

    // Block-set selections capture the keyboard first.
    if controller.get_selection().is_block_selection() {
        match key {
            Key::Backspace | Key::Delete => {
                delete_selected_blocks(controller);
                if let Some(id) = controller.get_current_block_id() {
                    compiler.focus(&id);
                }
                return KeyOutcome::handled();
            }
            Key::Escape => {
                controller.set_selection(Selection::None);
                return KeyOutcome::handled();
            }
            Key::Char('c') | Key::Char('C') if event.modifiers.primary() => {
                return KeyOutcome::with_clipboard(copy_selection(controller));
            }
            Key::Char('x') | Key::Char('X') if event.modifiers.primary() => {
                return KeyOutcome::with_clipboard(cut_selection(controller));
            }
            Key::Char('a') | Key::Char('A') if event.modifiers.primary() => {
                controller.select_all_blocks();
                return KeyOutcome::handled();
            }
            _ => {}
        }
    }

    // Global history chords.
    if event.modifiers.primary() {
        match key {
            Key::Char('z') | Key::Char('Z') => {
                if event.modifiers.shift {
                    controller.redo();
                } else {
                    controller.undo();
                }
                return KeyOutcome::handled();
            }
            Key::Char('y') | Key::Char('Y') => {
                controller.redo();
                return KeyOutcome::handled();
            }
            _ => {}
        }
    }

    // Select-all: whole-block selection unless a text range is active.
    if event.modifiers.primary() && matches!(key, Key::Char('a') | Key::Char('A')) {
        if controller.get_selection().is_collapsed()
            || controller.get_selection().is_none()
        {
            controller.select_all_blocks();
        } else {
            controller.extend_selection(Direction::Forward, ExtendUnit::All);
        }
        return KeyOutcome::handled();
    }

    let Some(block_id) = controller.get_current_block_id() else {
        return KeyOutcome::pass();
    };
    let Some(kind) = controller.get_block(&block_id).map(|b| b.kind) else {
        return KeyOutcome::pass();
    };

    // Inline format chords (outside code blocks).
    if event.modifiers.primary() && kind != BlockType::Code {
        let format = match key {
            Key::Char('b') | Key::Char('B') => Some(InlineFormat::Bold),
            Key::Char('i') | Key::Char('I') => Some(InlineFormat::Italic),
            Key::Char('u') | Key::Char('U') => Some(InlineFormat::Underline),
            Key::Char('s') | Key::Char('S') if event.modifiers.shift => {
                Some(InlineFormat::StrikeThrough)
            }
            _ => None,
        };
        if let Some(format) = format {
            controller.toggle_format(format);
            return KeyOutcome::handled();
        }
    }

    match key {
        Key::Enter => handle_enter(controller, compiler, kind),
        Key::Backspace => handle_backspace(controller, compiler, kind),
        Key::Tab if kind != BlockType::Code => {
            if event.modifiers.shift {
                controller.outdent_block(&block_id);
            } else {
                controller.indent_block(&block_id);
            }
            KeyOutcome::handled()
        }
        Key::ArrowUp | Key::ArrowDown => handle_vertical_arrow(controller, compiler, event, key),
        _ => KeyOutcome::pass(),
    }
}

/// Flush the DOM text into the store (history-recording) before a
/// structural edit, so undo restores the pre-gesture text.
fn flush_dom_text(controller: &mut EditorController, compiler: &Compiler) {
    let Some(block_id) = controller.get_current_block_id() else {
        return;
    };
    let Some(dom_text) = compiler.read_block_text(controller.get_document(), &block_id) else {
        return;
    };
    if controller.get_block_text(&block_id) != Some(dom_text.as_str()) {
        controller.update_block(&block_id, &BlockData::with_text(dom_text));
    }
}

fn handle_enter(
    controller: &mut EditorController,
    compiler: &mut Compiler,
    kind: BlockType,
) -> KeyOutcome {
    if kind == BlockType::Code {
        // Enter inside code inserts a newline; the platform default does
        // that better than we would.
        return KeyOutcome::pass();
    }
    flush_dom_text(controller, compiler);
    let Some(block_id) = controller.get_current_block_id() else {
        return KeyOutcome::pass();
    };
    let Some(block) = controller.get_block(&block_id) else {
        return KeyOutcome::pass();
    };

    // Empty non-paragraph: Enter demotes instead of splitting.
    if block.text().is_empty() && kind != BlockType::Paragraph {
        controller.change_block_type(&block_id, BlockType::Paragraph);
        return KeyOutcome::handled();
    }

    if controller.is_at_block_end() {
        let created =
            controller.create_block(BlockType::Paragraph, BlockData::with_text(""), Some(&block_id));
        if let Some(created) = created {
            controller.set_cursor_to_start(&created.id);
            compiler.focus(&created.id);
        }
        return KeyOutcome::handled();
    }

    let offset = match controller.get_selection() {
        Selection::Caret(point) => point.offset,
        _ => return KeyOutcome::pass(),
    };
    if let Some(created) = controller.split_block(&block_id, offset) {
        controller.set_cursor_to_start(&created.id);
        compiler.focus(&created.id);
    }
    KeyOutcome::handled()
}

fn handle_backspace(
    controller: &mut EditorController,
    compiler: &mut Compiler,
    kind: BlockType,
) -> KeyOutcome {
    // Only the collapsed-at-start case belongs to us; everything else is
    // ordinary character deletion.
    if !(controller.get_selection().is_collapsed() && controller.is_at_block_start()) {
        return KeyOutcome::pass();
    }
    let Some(block_id) = controller.get_current_block_id() else {
        return KeyOutcome::pass();
    };

    if kind != BlockType::Paragraph {
        controller.change_block_type(&block_id, BlockType::Paragraph);
        return KeyOutcome::handled();
    }

    flush_dom_text(controller, compiler);
    let Some(previous) = controller
        .get_document()
        .previous_editable_block(&block_id)
        .map(|block| (block.id.clone(), block.text_len()))
    else {
        return KeyOutcome::pass();
    };
    let (previous_id, previous_len) = previous;
    if controller.merge_blocks(&block_id, &previous_id) {
        controller.set_cursor(&previous_id, previous_len);
        compiler.set_cursor(controller.get_document(), &previous_id, previous_len);
        return KeyOutcome::handled();
    }
    KeyOutcome::pass()
}

/// Vertical arrows move between blocks only when the caret hugs the
/// block's top/bottom edge; anywhere else the platform moves the caret
/// within the block.
fn handle_vertical_arrow(
    controller: &mut EditorController,
    compiler: &mut Compiler,
    event: &KeyEvent,
    key: Key,
) -> KeyOutcome {
    let (Some(caret), Some(block)) = (event.caret_rect, event.block_rect) else {
        return KeyOutcome::pass();
    };
    let Some(block_id) = controller.get_current_block_id() else {
        return KeyOutcome::pass();
    };

    if key == Key::ArrowUp && caret_near_top(&caret, &block, EDGE_THRESHOLD) {
        if let Some(previous) = controller.get_document().previous_editable_block(&block_id) {
            let target = previous.id.clone();
            controller.set_cursor_to_end(&target);
            compiler.focus(&target);
            return KeyOutcome::handled();
        }
    }
    if key == Key::ArrowDown && caret_near_bottom(&caret, &block, EDGE_THRESHOLD) {
        if let Some(next) = controller.get_document().next_editable_block(&block_id) {
            let target = next.id.clone();
            controller.set_cursor_to_start(&target);
            compiler.focus(&target);
            return KeyOutcome::handled();
        }
    }
    KeyOutcome::pass()
}
