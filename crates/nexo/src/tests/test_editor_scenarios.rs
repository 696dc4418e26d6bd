// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! End-to-end gesture scenarios, each starting from a fresh editor with
//! one empty paragraph.

use crate::block::BlockType;
use crate::event::{EditorEvent, EventKind};
use crate::input::Key;
use crate::selection::Selection;
use crate::tests::testutils_editor::{fresh_editor, text_data, Harness};

use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn type_and_split() {
    let (mut editor, p0) = fresh_editor();
    editor.type_text(&p0, "Hello world");
    editor.controller.set_cursor(&p0, 5);

    let outcome = editor.press(Key::Enter);
    assert!(outcome.is_handled());

    assert_eq!(editor.root_texts(), vec!["Hello", " world"]);
    let roots = editor.controller.get_document().root_ids.clone();
    assert_eq!(roots.len(), 2);
    assert_eq!(editor.block_kind(&roots[0]), Some(BlockType::Paragraph));
    assert_eq!(editor.block_kind(&roots[1]), Some(BlockType::Paragraph));
    assert_eq!(
        *editor.controller.get_selection(),
        Selection::caret(roots[1].clone(), 0)
    );
}

#[test]
fn slash_command_to_heading() {
    let (mut editor, p0) = fresh_editor();
    let menu_events = Rc::new(RefCell::new(Vec::new()));
    let sink = menu_events.clone();
    editor.controller.on(EventKind::FocusChanged, move |envelope| {
        if let EditorEvent::FocusChanged {
            block_id,
            show_slash_menu,
            ..
        } = &envelope.event
        {
            sink.borrow_mut().push((block_id.clone(), *show_slash_menu));
        }
    });

    editor.type_text(&p0, "/");
    assert_eq!(
        *menu_events.borrow(),
        vec![(Some(p0.clone()), true)],
        "typing a lone slash should announce the slash menu"
    );
    // The slash is left in place for the menu to consume.
    assert_eq!(editor.block_text(&p0), Some(""));

    // The consumer picks "Heading 1" from the menu.
    editor.controller.change_block_type(&p0, BlockType::Heading1);
    editor.controller.update_block(&p0, &text_data(""));
    editor.pump();

    assert_eq!(editor.controller.block_count(), 1);
    assert_eq!(editor.block_kind(&p0), Some(BlockType::Heading1));
    assert_eq!(editor.block_text(&p0), Some(""));
}

#[test]
fn undo_a_structural_move() {
    let (mut editor, ids) = Harness::with_texts(&["a", "b", "c"]);
    editor.controller.move_block(&ids[2], None, 0);
    editor.pump();
    assert_eq!(editor.root_texts(), vec!["c", "a", "b"]);

    assert!(editor.controller.undo());
    assert_eq!(editor.root_texts(), vec!["a", "b", "c"]);
    assert!(!editor.controller.can_undo());
    assert!(editor.controller.can_redo());
}

#[test]
fn merge_via_backspace() {
    let (mut editor, ids) = Harness::with_texts(&["foo", "bar"]);
    editor.controller.set_cursor(&ids[1], 0);

    let outcome = editor.press(Key::Backspace);
    assert!(outcome.is_handled());

    assert_eq!(editor.root_texts(), vec!["foobar"]);
    assert_eq!(
        *editor.controller.get_selection(),
        Selection::caret(ids[0].clone(), 3)
    );
}

#[test]
fn indent_then_outdent_restores_the_shape() {
    let (mut editor, ids) = Harness::with_texts(&["A", "B", "C"]);
    editor.retag_roots(BlockType::BulletList);
    editor.controller.set_cursor(&ids[1], 0);

    editor.press(Key::Tab);
    let doc = editor.controller.get_document();
    assert_eq!(
        doc.get_block(&ids[0]).unwrap().children_ids,
        vec![ids[1].clone()]
    );
    assert_eq!(doc.root_ids, vec![ids[0].clone(), ids[2].clone()]);

    editor.press_with(Key::Tab, crate::input::Modifiers::shift_only());
    let doc = editor.controller.get_document();
    assert_eq!(
        doc.root_ids,
        vec![ids[0].clone(), ids[1].clone(), ids[2].clone()]
    );
    assert!(doc.get_block(&ids[0]).unwrap().children_ids.is_empty());
}

#[test]
fn markdown_shortcut_makes_a_heading() {
    let (mut editor, p0) = fresh_editor();
    editor.type_text(&p0, "## ");

    assert_eq!(editor.block_kind(&p0), Some(BlockType::Heading2));
    assert_eq!(editor.block_text(&p0), Some(""));
    assert_eq!(
        *editor.controller.get_selection(),
        Selection::caret(p0.clone(), 0)
    );
}

#[test]
fn enter_in_an_empty_heading_demotes_without_creating_a_block() {
    let (mut editor, p0) = fresh_editor();
    editor.controller.change_block_type(&p0, BlockType::Heading1);
    editor.controller.set_cursor(&p0, 0);
    editor.pump();

    editor.press(Key::Enter);
    assert_eq!(editor.controller.block_count(), 1);
    assert_eq!(editor.block_kind(&p0), Some(BlockType::Paragraph));
}

#[test]
fn backspace_at_start_of_a_heading_demotes_not_merges() {
    let (mut editor, ids) = Harness::with_texts(&["above", "title"]);
    editor
        .controller
        .change_block_type(&ids[1], BlockType::Heading1);
    editor.controller.set_cursor(&ids[1], 0);
    editor.pump();

    editor.press(Key::Backspace);
    assert_eq!(editor.controller.block_count(), 2);
    assert_eq!(editor.block_kind(&ids[1]), Some(BlockType::Paragraph));
    assert_eq!(editor.block_text(&ids[1]), Some("title"));
}

#[test]
fn enter_at_end_creates_a_following_paragraph() {
    let (mut editor, p0) = fresh_editor();
    editor.type_text(&p0, "done");
    editor.controller.set_cursor_to_end(&p0);

    editor.press(Key::Enter);
    let roots = editor.controller.get_document().root_ids.clone();
    assert_eq!(roots.len(), 2);
    assert_eq!(editor.block_text(&roots[1]), Some(""));
    assert_eq!(
        *editor.controller.get_selection(),
        Selection::caret(roots[1].clone(), 0)
    );
}

#[test]
fn divider_shortcut_adds_a_paragraph_below() {
    let (mut editor, p0) = fresh_editor();
    editor.type_text(&p0, "---");

    assert_eq!(editor.block_kind(&p0), Some(BlockType::Divider));
    let roots = editor.controller.get_document().root_ids.clone();
    assert_eq!(roots.len(), 2);
    assert_eq!(editor.block_kind(&roots[1]), Some(BlockType::Paragraph));
    assert_eq!(
        *editor.controller.get_selection(),
        Selection::caret(roots[1].clone(), 0)
    );
}
