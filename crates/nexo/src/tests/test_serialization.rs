// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! JSON round trips for the document model and the controller surface.

use indoc::indoc;
use speculoos::assert_that;

use crate::block::{BlockData, BlockType};
use crate::controller::{EditorConfig, EditorController};
use crate::document::Document;
use crate::error::DocumentError;
use crate::tests::testutils_editor::Harness;

#[test]
fn document_serde_round_trips() {
    let (mut editor, ids) = Harness::with_texts(&["title", "body", "note"]);
    editor.controller.change_block_type(&ids[0], BlockType::Heading1);
    editor.controller.indent_block(&ids[2]);

    let doc = editor.controller.get_document().clone();
    let json = serde_json::to_value(&doc).expect("serialize");
    let back: Document = serde_json::from_value(json).expect("deserialize");

    assert_that!(back.root_ids).is_equal_to(doc.root_ids.clone());
    assert_that!(back.blocks.len()).is_equal_to(doc.blocks.len());
    for (id, block) in &doc.blocks {
        let other = &back.blocks[id];
        assert_that!(other.kind).is_equal_to(block.kind);
        assert_that!(&other.data).is_equal_to(&block.data);
        assert_that!(&other.children_ids).is_equal_to(&block.children_ids);
    }
}

#[test]
fn wire_format_uses_the_documented_field_names() {
    let (editor, ids) = Harness::with_texts(&["x"]);
    let json = editor.controller.to_json();

    assert!(json.get("rootIds").is_some());
    assert!(json.get("blocks").is_some());
    let block = &json["blocks"][ids[0].as_str()];
    assert_eq!(block["type"], "paragraph");
    assert!(block.get("childrenIds").is_some());
    assert!(block.get("parentId").is_some());
    assert!(block["meta"].get("createdAt").is_some());
    assert!(block["meta"].get("updatedAt").is_some());
}

#[test]
fn from_json_recomputes_parent_pointers() {
    // Parent pointers are denormalised; the loader must rebuild them from
    // the children lists even when the input lies about them.
    let json = indoc! {r#"
        {
          "id": "doc1",
          "rootIds": ["a"],
          "blocks": {
            "a": {
              "id": "a",
              "type": "paragraph",
              "data": { "text": "root" },
              "parentId": null,
              "childrenIds": ["b"],
              "meta": { "createdAt": 0, "updatedAt": 0, "version": 0 }
            },
            "b": {
              "id": "b",
              "type": "paragraph",
              "data": { "text": "child" },
              "parentId": null,
              "childrenIds": [],
              "meta": { "createdAt": 0, "updatedAt": 0, "version": 0 }
            }
          },
          "meta": { "createdAt": 0, "updatedAt": 0, "version": 0 }
        }
    "#};

    let mut controller = EditorController::create(EditorConfig::default());
    controller.from_json_str(json).expect("load");
    let b = controller.get_block(&"b".into()).unwrap();
    assert_eq!(b.parent_id, Some("a".into()));
}

#[test]
fn from_json_clears_history() {
    let (mut editor, ids) = Harness::with_texts(&["x"]);
    editor
        .controller
        .update_block(&ids[0], &BlockData::with_text("y"));
    assert!(editor.controller.can_undo());

    let json = editor.controller.to_json();
    editor.controller.from_json(json).expect("load");
    assert!(!editor.controller.can_undo());
    assert!(!editor.controller.can_redo());
}

#[test]
fn from_json_rejects_orphans() {
    let json = indoc! {r#"
        {
          "id": "doc1",
          "rootIds": ["a"],
          "blocks": {
            "a": {
              "id": "a",
              "type": "paragraph",
              "data": { "text": "" },
              "parentId": null,
              "childrenIds": [],
              "meta": { "createdAt": 0, "updatedAt": 0, "version": 0 }
            },
            "stray": {
              "id": "stray",
              "type": "paragraph",
              "data": { "text": "lost" },
              "parentId": null,
              "childrenIds": [],
              "meta": { "createdAt": 0, "updatedAt": 0, "version": 0 }
            }
          },
          "meta": { "createdAt": 0, "updatedAt": 0, "version": 0 }
        }
    "#};

    let mut controller = EditorController::create(EditorConfig::default());
    let error = controller.from_json_str(json).unwrap_err();
    assert!(matches!(error, DocumentError::Orphan { .. }));
}

#[test]
fn from_json_rejects_malformed_json() {
    let mut controller = EditorController::create(EditorConfig::default());
    let error = controller.from_json_str("{not json").unwrap_err();
    assert!(matches!(error, DocumentError::Parse(_)));
}

#[test]
fn controller_round_trip_preserves_annotations() {
    let (mut editor, ids) = Harness::with_texts(&["hello world"]);
    editor
        .controller
        .set_selection(crate::selection::Selection::text_range(ids[0].clone(), 0, 5));
    editor.controller.toggle_format(crate::annotate::InlineFormat::Bold);

    let json = editor.controller.to_json();
    let mut restored = EditorController::create(EditorConfig::default());
    restored.from_json(json).expect("load");
    let spans = crate::annotate::spans_of(&restored.get_block(&ids[0]).unwrap().data);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].start, 0);
    assert_eq!(spans[0].end, 5);
}
