// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Typed operations with inverse generation.
//!
//! Each operation applies forward against a document snapshot and, at the
//! same time, constructs the operation that undoes it — captured against
//! the pre-state, so a delete's inverse carries the full subtree it
//! removed and a text deletion's inverse carries the removed characters.
//! An operation whose target does not resolve applies as a no-op with no
//! inverse.

use serde_json::Value;

use crate::annotate::{spans_of, spans_to_value, AnnotationSpan};
use crate::block::{data_keys, Block, BlockId, BlockType};
use crate::document::{CapturedSubtree, Document};

/// One entry of the operation log.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Insert a captured subtree (blocks in DFS pre-order, root first) at
    /// a position. Freshly created blocks are a one-element capture.
    InsertBlock {
        blocks: Vec<Block>,
        parent_id: Option<BlockId>,
        index: usize,
    },
    /// Remove a block and its descendants. The subtree is captured when
    /// the operation executes, not when it is built.
    DeleteBlock { block_id: BlockId },
    MoveBlock {
        block_id: BlockId,
        new_parent_id: Option<BlockId>,
        new_index: usize,
    },
    SetBlockType {
        block_id: BlockId,
        kind: BlockType,
    },
    /// Write `value` at a dotted path within the block's data record.
    /// `None` removes the leaf.
    SetBlockData {
        block_id: BlockId,
        path: String,
        value: Option<Value>,
    },
    InsertText {
        block_id: BlockId,
        offset: usize,
        text: String,
    },
    DeleteText {
        block_id: BlockId,
        offset: usize,
        len: usize,
    },
    /// Replace the block's annotation span list wholesale. The previous
    /// list is the natural inverse payload.
    SetAnnotations {
        block_id: BlockId,
        spans: Vec<AnnotationSpan>,
    },
}

/// The result of applying one operation: the next snapshot plus the
/// inverse, absent when the operation was a no-op.
pub struct Applied {
    pub doc: Document,
    pub inverse: Option<Operation>,
}

impl Applied {
    fn noop(doc: &Document) -> Self {
        Self {
            doc: doc.clone(),
            inverse: None,
        }
    }
}

impl Operation {
    /// The block this operation is about, for dirty tracking.
    pub fn target(&self) -> Option<&BlockId> {
        match self {
            Operation::InsertBlock { blocks, .. } => blocks.first().map(|b| &b.id),
            Operation::DeleteBlock { block_id }
            | Operation::MoveBlock { block_id, .. }
            | Operation::SetBlockType { block_id, .. }
            | Operation::SetBlockData { block_id, .. }
            | Operation::InsertText { block_id, .. }
            | Operation::DeleteText { block_id, .. }
            | Operation::SetAnnotations { block_id, .. } => Some(block_id),
        }
    }

    /// Apply forward, producing the next snapshot and the inverse.
    pub fn apply(&self, doc: &Document) -> Applied {
        match self {
            Operation::InsertBlock {
                blocks,
                parent_id,
                index,
            } => Self::apply_insert(doc, blocks, parent_id.as_ref(), *index),
            Operation::DeleteBlock { block_id } => Self::apply_delete(doc, block_id),
            Operation::MoveBlock {
                block_id,
                new_parent_id,
                new_index,
            } => Self::apply_move(doc, block_id, new_parent_id.as_ref(), *new_index),
            Operation::SetBlockType { block_id, kind } => {
                let Some(block) = doc.get_block(block_id) else {
                    return Applied::noop(doc);
                };
                let old_kind = block.kind;
                let next = doc.change_block_type(block_id, *kind);
                Applied {
                    doc: next,
                    inverse: Some(Operation::SetBlockType {
                        block_id: block_id.clone(),
                        kind: old_kind,
                    }),
                }
            }
            Operation::SetBlockData {
                block_id,
                path,
                value,
            } => {
                if !doc.contains(block_id) {
                    return Applied::noop(doc);
                }
                let mut next = doc.clone();
                let old = next
                    .block_mut(block_id)
                    .and_then(|block| block.data.set_path(path, value.clone()));
                next.bump_block(block_id);
                Applied {
                    doc: next,
                    inverse: Some(Operation::SetBlockData {
                        block_id: block_id.clone(),
                        path: path.clone(),
                        value: old,
                    }),
                }
            }
            Operation::InsertText {
                block_id,
                offset,
                text,
            } => {
                let Some(block) = doc.get_block(block_id) else {
                    return Applied::noop(doc);
                };
                let offset = (*offset).min(block.text_len());
                let mut next = doc.clone();
                next.splice_text(block_id, offset, 0, text);
                Applied {
                    doc: next,
                    inverse: Some(Operation::DeleteText {
                        block_id: block_id.clone(),
                        offset,
                        len: text.chars().count(),
                    }),
                }
            }
            Operation::DeleteText {
                block_id,
                offset,
                len,
            } => {
                if !doc.contains(block_id) {
                    return Applied::noop(doc);
                }
                let mut next = doc.clone();
                let Some(removed) = next.splice_text(block_id, *offset, *len, "") else {
                    return Applied::noop(doc);
                };
                let offset = (*offset).min(doc.get_block(block_id).map(Block::text_len).unwrap_or(0));
                Applied {
                    doc: next,
                    inverse: Some(Operation::InsertText {
                        block_id: block_id.clone(),
                        offset,
                        text: removed,
                    }),
                }
            }
            Operation::SetAnnotations { block_id, spans } => {
                let Some(block) = doc.get_block(block_id) else {
                    return Applied::noop(doc);
                };
                let old_spans = spans_of(&block.data);
                let mut next = doc.clone();
                if let Some(block) = next.block_mut(block_id) {
                    if spans.is_empty() {
                        block.data.remove(data_keys::ANNOTATIONS);
                    } else {
                        block.data.set(data_keys::ANNOTATIONS, spans_to_value(spans));
                    }
                }
                next.bump_block(block_id);
                Applied {
                    doc: next,
                    inverse: Some(Operation::SetAnnotations {
                        block_id: block_id.clone(),
                        spans: old_spans,
                    }),
                }
            }
        }
    }

    fn apply_insert(
        doc: &Document,
        blocks: &[Block],
        parent_id: Option<&BlockId>,
        index: usize,
    ) -> Applied {
        let Some(root) = blocks.first() else {
            return Applied::noop(doc);
        };
        if let Some(parent) = parent_id {
            if !doc.contains(parent) {
                return Applied::noop(doc);
            }
        }
        if blocks.iter().any(|block| doc.contains(&block.id)) {
            return Applied::noop(doc);
        }
        let mut next = doc.clone();
        next.insert_subtree(&CapturedSubtree {
            blocks: blocks.to_vec(),
            parent_id: parent_id.cloned(),
            index,
        });
        next.bump_doc();
        Applied {
            doc: next,
            inverse: Some(Operation::DeleteBlock {
                block_id: root.id.clone(),
            }),
        }
    }

    fn apply_delete(doc: &Document, block_id: &BlockId) -> Applied {
        if !doc.contains(block_id) {
            return Applied::noop(doc);
        }
        let mut next = doc.clone();
        let Some(capture) = next.remove_subtree(block_id) else {
            return Applied::noop(doc);
        };
        next.bump_doc();
        Applied {
            doc: next,
            inverse: Some(Operation::InsertBlock {
                blocks: capture.blocks,
                parent_id: capture.parent_id,
                index: capture.index,
            }),
        }
    }

    fn apply_move(
        doc: &Document,
        block_id: &BlockId,
        new_parent_id: Option<&BlockId>,
        new_index: usize,
    ) -> Applied {
        let Some(block) = doc.get_block(block_id) else {
            return Applied::noop(doc);
        };
        if let Some(new_parent) = new_parent_id {
            if !doc.contains(new_parent)
                || new_parent == block_id
                || doc.is_ancestor(block_id, new_parent)
            {
                return Applied::noop(doc);
            }
        }
        let old_parent = block.parent_id.clone();
        let old_index = doc.block_index(block_id).unwrap_or(0);
        if old_parent.as_ref() == new_parent_id && old_index == new_index {
            return Applied::noop(doc);
        }
        let next = doc.move_block(block_id, new_parent_id, new_index);
        Applied {
            doc: next,
            inverse: Some(Operation::MoveBlock {
                block_id: block_id.clone(),
                new_parent_id: old_parent,
                new_index: old_index,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::BlockData;
    use crate::document::doc_with_roots;

    fn roundtrip(doc: &Document, op: Operation) -> Document {
        let applied = op.apply(doc);
        let inverse = applied.inverse.expect("operation should be invertible");
        inverse.apply(&applied.doc).doc
    }

    /// Block-set equivalence: same ids, types, data and tree shape.
    fn assert_equivalent(a: &Document, b: &Document) {
        assert_eq!(a.root_ids, b.root_ids);
        assert_eq!(a.blocks.len(), b.blocks.len());
        for (id, block) in &a.blocks {
            let other = b.get_block(id).expect("block sets should match");
            assert_eq!(block.kind, other.kind);
            assert_eq!(block.data, other.data);
            assert_eq!(block.parent_id, other.parent_id);
            assert_eq!(block.children_ids, other.children_ids);
        }
    }

    #[test]
    fn delete_inverse_restores_the_subtree() {
        let (doc, ids) = doc_with_roots(&["a", "b", "c"]);
        let (doc, child) = doc.create_block(
            BlockType::Paragraph,
            BlockData::with_text("b1"),
            Some(&ids[1]),
            None,
        );
        assert!(child.is_some());
        let restored = roundtrip(
            &doc,
            Operation::DeleteBlock {
                block_id: ids[1].clone(),
            },
        );
        assert_equivalent(&doc, &restored);
    }

    #[test]
    fn move_inverse_returns_to_the_old_position() {
        let (doc, ids) = doc_with_roots(&["a", "b", "c"]);
        let restored = roundtrip(
            &doc,
            Operation::MoveBlock {
                block_id: ids[2].clone(),
                new_parent_id: None,
                new_index: 0,
            },
        );
        assert_equivalent(&doc, &restored);
    }

    #[test]
    fn invalid_move_applies_as_a_noop_without_inverse() {
        let (doc, ids) = doc_with_roots(&["a"]);
        let applied = Operation::MoveBlock {
            block_id: ids[0].clone(),
            new_parent_id: Some(ids[0].clone()),
            new_index: 0,
        }
        .apply(&doc);
        assert!(applied.inverse.is_none());
        assert_eq!(applied.doc.blocks, doc.blocks);
    }

    #[test]
    fn text_operations_are_symmetric() {
        let (doc, ids) = doc_with_roots(&["hello"]);
        let restored = roundtrip(
            &doc,
            Operation::InsertText {
                block_id: ids[0].clone(),
                offset: 5,
                text: " world".to_owned(),
            },
        );
        assert_equivalent(&doc, &restored);

        let restored = roundtrip(
            &doc,
            Operation::DeleteText {
                block_id: ids[0].clone(),
                offset: 1,
                len: 3,
            },
        );
        assert_equivalent(&doc, &restored);
    }

    #[test]
    fn set_data_inverse_restores_the_old_value() {
        let (doc, ids) = doc_with_roots(&[""]);
        let applied = Operation::SetBlockData {
            block_id: ids[0].clone(),
            path: "checked".to_owned(),
            value: Some(Value::Bool(true)),
        }
        .apply(&doc);
        assert!(applied.doc.get_block(&ids[0]).unwrap().data.checked());
        // The key did not exist before, so the inverse removes it.
        let inverse = applied.inverse.unwrap();
        let restored = inverse.apply(&applied.doc).doc;
        assert_eq!(
            restored.get_block(&ids[0]).unwrap().data.get("checked"),
            None
        );
    }

    #[test]
    fn set_type_inverse_restores_the_old_tag() {
        let (doc, ids) = doc_with_roots(&["x"]);
        let restored = roundtrip(
            &doc,
            Operation::SetBlockType {
                block_id: ids[0].clone(),
                kind: BlockType::Heading2,
            },
        );
        assert_equivalent(&doc, &restored);
    }

    #[test]
    fn versions_never_decrease_across_apply() {
        let (doc, ids) = doc_with_roots(&["hello"]);
        let before = doc.get_block(&ids[0]).unwrap().meta.version;
        let applied = Operation::InsertText {
            block_id: ids[0].clone(),
            offset: 0,
            text: "x".to_owned(),
        }
        .apply(&doc);
        let after = applied.doc.get_block(&ids[0]).unwrap().meta.version;
        assert_eq!(after, before + 1);
        assert!(applied.doc.meta.version > doc.meta.version);
    }

    #[test]
    fn operations_on_unknown_blocks_are_noops() {
        let (doc, _) = doc_with_roots(&["a"]);
        let ghost = BlockId::generate();
        for op in [
            Operation::DeleteBlock {
                block_id: ghost.clone(),
            },
            Operation::SetBlockType {
                block_id: ghost.clone(),
                kind: BlockType::Quote,
            },
            Operation::InsertText {
                block_id: ghost.clone(),
                offset: 0,
                text: "x".to_owned(),
            },
        ] {
            let applied = op.apply(&doc);
            assert!(applied.inverse.is_none());
            assert_eq!(applied.doc.blocks, doc.blocks);
        }
    }
}
