// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The text input handler: DOM → store sync, slash detection, markdown
//! shortcuts, and IME composition.
//!
//! Normal typing flows through the controller's direct (non-history)
//! update so a gesture does not leave one history entry per keystroke.
//! Text that matches a markdown prefix converts the block instead, as
//! one undoable transaction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::{data_keys, Block, BlockData, BlockId, BlockType};
use crate::event::{EditorEvent, EventSource};
use crate::controller::EditorController;
use crate::input::{CompositionEvent, TextInputEvent};
use crate::operation::Operation;
use crate::render::Compiler;

/// A recognised markdown prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shortcut {
    Heading(u8),
    Bullet,
    Numbered,
    Todo { checked: bool },
    Quote,
    Code { language: Option<String> },
    Divider,
}

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(\w*)$").expect("static regex"));

static RULES: Lazy<Vec<(Regex, Shortcut)>> = Lazy::new(|| {
    let rule = |pattern: &str| Regex::new(pattern).expect("static regex");
    vec![
        (rule(r"^# $"), Shortcut::Heading(1)),
        (rule(r"^## $"), Shortcut::Heading(2)),
        (rule(r"^### $"), Shortcut::Heading(3)),
        (rule(r"^[-*] $"), Shortcut::Bullet),
        (rule(r"^\d+\. $"), Shortcut::Numbered),
        (rule(r"^\[ \] $"), Shortcut::Todo { checked: false }),
        (rule(r"^\[x\] $"), Shortcut::Todo { checked: true }),
        (rule(r"^- \[ \] $"), Shortcut::Todo { checked: false }),
        (rule(r"^- \[x\] $"), Shortcut::Todo { checked: true }),
        (rule(r"^> $"), Shortcut::Quote),
        (rule(r#"^" $"#), Shortcut::Quote),
        (rule(r"^---$"), Shortcut::Divider),
        (rule(r"^\*\*\*$"), Shortcut::Divider),
        (rule(r"^___$"), Shortcut::Divider),
    ]
});

/// Match `text` against the markdown rule table.
pub fn detect_shortcut(text: &str) -> Option<Shortcut> {
    if let Some(captures) = CODE_FENCE.captures(text) {
        let language = captures.get(1).map(|m| m.as_str()).filter(|s| !s.is_empty());
        return Some(Shortcut::Code {
            language: language.map(str::to_owned),
        });
    }
    RULES
        .iter()
        .find(|(regex, _)| regex.is_match(text))
        .map(|(_, shortcut)| shortcut.clone())
}

/// Handle an input event: read the editable's current text and either
/// trigger the slash menu, apply a markdown conversion, or sync the text
/// into the store through the direct path.
pub fn handle_text_input(
    controller: &mut EditorController,
    compiler: &mut Compiler,
    event: &TextInputEvent,
) {
    // Mid-composition the editable holds transient text; compositionend
    // performs the single sync.
    if compiler.is_composing() {
        return;
    }
    let Some(text) = compiler.read_block_text(controller.get_document(), &event.block_id) else {
        return;
    };
    let Some(kind) = controller.get_block(&event.block_id).map(|b| b.kind) else {
        return;
    };

    if kind != BlockType::Code {
        if text == "/" {
            // The slash stays in place; the menu consumes or clears it.
            controller.emit(
                EditorEvent::FocusChanged {
                    block_id: Some(event.block_id.clone()),
                    show_slash_menu: true,
                    anchor: event.anchor,
                },
                EventSource::User,
            );
            return;
        }
        if let Some(shortcut) = detect_shortcut(&text) {
            apply_shortcut(controller, compiler, &event.block_id, shortcut);
            return;
        }
    }

    sync_block_text(controller, &event.block_id, text);
}

/// Convert the block per the matched shortcut, as one transaction, and
/// put the caret back at offset 0.
fn apply_shortcut(
    controller: &mut EditorController,
    compiler: &mut Compiler,
    block_id: &BlockId,
    shortcut: Shortcut,
) {
    let mut operations = vec![Operation::SetBlockData {
        block_id: block_id.clone(),
        path: data_keys::TEXT.to_owned(),
        value: Some(serde_json::Value::String(String::new())),
    }];
    let mut focus_target = block_id.clone();

    match shortcut {
        Shortcut::Heading(level) => {
            let kind = match level {
                1 => BlockType::Heading1,
                2 => BlockType::Heading2,
                _ => BlockType::Heading3,
            };
            operations.push(Operation::SetBlockType {
                block_id: block_id.clone(),
                kind,
            });
        }
        Shortcut::Bullet => operations.push(Operation::SetBlockType {
            block_id: block_id.clone(),
            kind: BlockType::BulletList,
        }),
        Shortcut::Numbered => operations.push(Operation::SetBlockType {
            block_id: block_id.clone(),
            kind: BlockType::NumberedList,
        }),
        Shortcut::Todo { checked } => {
            operations.push(Operation::SetBlockData {
                block_id: block_id.clone(),
                path: data_keys::CHECKED.to_owned(),
                value: Some(serde_json::Value::Bool(checked)),
            });
            operations.push(Operation::SetBlockType {
                block_id: block_id.clone(),
                kind: BlockType::TodoList,
            });
        }
        Shortcut::Quote => operations.push(Operation::SetBlockType {
            block_id: block_id.clone(),
            kind: BlockType::Quote,
        }),
        Shortcut::Code { language } => {
            if let Some(language) = language {
                operations.push(Operation::SetBlockData {
                    block_id: block_id.clone(),
                    path: data_keys::LANGUAGE.to_owned(),
                    value: Some(serde_json::Value::String(language)),
                });
            }
            operations.push(Operation::SetBlockType {
                block_id: block_id.clone(),
                kind: BlockType::Code,
            });
        }
        Shortcut::Divider => {
            operations.push(Operation::SetBlockType {
                block_id: block_id.clone(),
                kind: BlockType::Divider,
            });
            // A divider cannot hold the caret; type continues below it.
            let paragraph = Block::empty_paragraph();
            focus_target = paragraph.id.clone();
            let parent_id = controller
                .get_block(block_id)
                .and_then(|block| block.parent_id.clone());
            let index = controller
                .get_document()
                .block_index(block_id)
                .map(|index| index + 1)
                .unwrap_or(0);
            operations.push(Operation::InsertBlock {
                blocks: vec![paragraph],
                parent_id,
                index,
            });
        }
    }

    controller.execute("markdown shortcut", operations, EventSource::User);
    controller.set_cursor_to_start(&focus_target);
    compiler.focus(&focus_target);
}

/// The single text sync, used by plain input and composition end.
fn sync_block_text(controller: &mut EditorController, block_id: &BlockId, text: String) {
    if controller.get_block_text(block_id) == Some(text.as_str()) {
        return;
    }
    controller.update_block_direct(block_id, &BlockData::with_text(text));
}

/// Composition started: renders must leave the composed block alone.
pub fn handle_composition_start(compiler: &mut Compiler, event: &CompositionEvent) {
    compiler.begin_composition(event.block_id.clone());
}

/// Composition ended: one sync of the composed text into the store.
pub fn handle_composition_end(controller: &mut EditorController, compiler: &mut Compiler) {
    let Some(block_id) = compiler.end_composition() else {
        return;
    };
    if let Some(text) = compiler.read_block_text(controller.get_document(), &block_id) {
        sync_block_text(controller, &block_id, text);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn heading_rules_require_the_trailing_space() {
        assert_eq!(detect_shortcut("# "), Some(Shortcut::Heading(1)));
        assert_eq!(detect_shortcut("## "), Some(Shortcut::Heading(2)));
        assert_eq!(detect_shortcut("### "), Some(Shortcut::Heading(3)));
        assert_eq!(detect_shortcut("#"), None);
        assert_eq!(detect_shortcut("# x"), None);
    }

    #[test]
    fn list_and_todo_rules() {
        assert_eq!(detect_shortcut("- "), Some(Shortcut::Bullet));
        assert_eq!(detect_shortcut("* "), Some(Shortcut::Bullet));
        assert_eq!(detect_shortcut("3. "), Some(Shortcut::Numbered));
        assert_eq!(
            detect_shortcut("[ ] "),
            Some(Shortcut::Todo { checked: false })
        );
        assert_eq!(
            detect_shortcut("- [x] "),
            Some(Shortcut::Todo { checked: true })
        );
    }

    #[test]
    fn quote_code_and_divider_rules() {
        assert_eq!(detect_shortcut("> "), Some(Shortcut::Quote));
        assert_eq!(detect_shortcut("\" "), Some(Shortcut::Quote));
        assert_eq!(
            detect_shortcut("```rust"),
            Some(Shortcut::Code {
                language: Some("rust".to_owned())
            })
        );
        assert_eq!(detect_shortcut("```"), Some(Shortcut::Code { language: None }));
        assert_eq!(detect_shortcut("---"), Some(Shortcut::Divider));
        assert_eq!(detect_shortcut("***"), Some(Shortcut::Divider));
        assert_eq!(detect_shortcut("___"), Some(Shortcut::Divider));
        assert_eq!(detect_shortcut("--- "), None);
    }
}
