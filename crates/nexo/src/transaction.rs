// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Transactions: ordered operation groups applied atomically as one
//! history entry.

use uuid::Uuid;

use crate::block::now_ms;
use crate::document::Document;
use crate::operation::Operation;

/// An ordered group of operations with an id, a timestamp and a
/// human-readable description (surfaced by history UIs and events).
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub timestamp: u64,
    pub description: String,
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn new(description: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            timestamp: now_ms(),
            description: description.into(),
            operations,
        }
    }

    pub fn single(description: impl Into<String>, operation: Operation) -> Self {
        Self::new(description, vec![operation])
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply every operation in order, threading the document through the
    /// intermediate states, and build the inverse transaction: the
    /// reverse-ordered list of per-operation inverses, each constructed
    /// against the state it will actually undo.
    pub fn apply(&self, doc: &Document) -> (Document, Transaction) {
        let mut current = doc.clone();
        let mut inverses = Vec::with_capacity(self.operations.len());
        for operation in &self.operations {
            let applied = operation.apply(&current);
            current = applied.doc;
            if let Some(inverse) = applied.inverse {
                inverses.push(inverse);
            }
        }
        inverses.reverse();
        let inverse = Transaction::new(self.description.clone(), inverses);
        (current, inverse)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::{Block, BlockData, BlockType};
    use crate::document::doc_with_roots;
    use crate::operation::Operation;

    #[test]
    fn a_transaction_applies_operations_in_order() {
        let (doc, ids) = doc_with_roots(&["hello"]);
        let tx = Transaction::new(
            "type and retag",
            vec![
                Operation::InsertText {
                    block_id: ids[0].clone(),
                    offset: 5,
                    text: " world".to_owned(),
                },
                Operation::SetBlockType {
                    block_id: ids[0].clone(),
                    kind: BlockType::Heading1,
                },
            ],
        );
        let (next, _) = tx.apply(&doc);
        let block = next.get_block(&ids[0]).unwrap();
        assert_eq!(block.text(), "hello world");
        assert_eq!(block.kind, BlockType::Heading1);
    }

    #[test]
    fn the_inverse_transaction_unwinds_the_whole_group() {
        let (doc, ids) = doc_with_roots(&["abc", "def"]);
        let extra = Block::new(BlockType::Quote, BlockData::with_text("quoted"));
        let tx = Transaction::new(
            "edit",
            vec![
                Operation::DeleteBlock {
                    block_id: ids[1].clone(),
                },
                Operation::InsertBlock {
                    blocks: vec![extra],
                    parent_id: None,
                    index: 1,
                },
                Operation::InsertText {
                    block_id: ids[0].clone(),
                    offset: 3,
                    text: "!".to_owned(),
                },
            ],
        );
        let (next, inverse) = tx.apply(&doc);
        assert_ne!(next.root_ids, doc.root_ids);
        let (restored, _) = inverse.apply(&next);
        assert_eq!(restored.root_ids, doc.root_ids);
        assert_eq!(
            restored.get_block(&ids[0]).unwrap().text(),
            doc.get_block(&ids[0]).unwrap().text()
        );
        assert!(restored.contains(&ids[1]));
    }

    #[test]
    fn inverses_are_built_against_intermediate_states() {
        // Two inserts at the same index: the inverse must delete them in
        // reverse order or the second delete would target a moved block.
        let (doc, _) = doc_with_roots(&["base"]);
        let first = Block::new(BlockType::Paragraph, BlockData::with_text("first"));
        let second = Block::new(BlockType::Paragraph, BlockData::with_text("second"));
        let tx = Transaction::new(
            "double insert",
            vec![
                Operation::InsertBlock {
                    blocks: vec![first],
                    parent_id: None,
                    index: 0,
                },
                Operation::InsertBlock {
                    blocks: vec![second],
                    parent_id: None,
                    index: 0,
                },
            ],
        );
        let (next, inverse) = tx.apply(&doc);
        assert_eq!(next.root_ids.len(), 3);
        let (restored, _) = inverse.apply(&next);
        assert_eq!(restored.root_ids, doc.root_ids);
    }

    #[test]
    fn noop_operations_contribute_no_inverse() {
        let (doc, ids) = doc_with_roots(&["a"]);
        let tx = Transaction::new(
            "mixed",
            vec![
                Operation::DeleteBlock {
                    block_id: crate::block::BlockId::generate(),
                },
                Operation::InsertText {
                    block_id: ids[0].clone(),
                    offset: 1,
                    text: "x".to_owned(),
                },
            ],
        );
        let (_, inverse) = tx.apply(&doc);
        assert_eq!(inverse.operations.len(), 1);
    }
}
