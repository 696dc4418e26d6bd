// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The command engine: bounded undo/redo stacks over transactions.
//!
//! `past` holds applied transactions together with the inverses computed
//! while applying them; undo replays the stored inverse rather than
//! re-deriving one against the wrong state. A new execution clears the
//! redo stack; overflowing `max_history` drops the oldest entry.

use std::collections::VecDeque;

use crate::document::Document;
use crate::transaction::Transaction;

pub const DEFAULT_MAX_HISTORY: usize = 100;

/// One history entry: the transaction as executed and its inverse.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub transaction: Transaction,
    pub inverse: Transaction,
}

/// Bounded undo/redo stacks.
pub struct CommandEngine {
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,
    max_history: usize,
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl CommandEngine {
    pub fn new(max_history: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_history: max_history.max(1),
        }
    }

    /// Apply `transaction` forward, record it, and clear the redo stack.
    pub fn execute(&mut self, doc: &Document, transaction: Transaction) -> Document {
        let (next, inverse) = transaction.apply(doc);
        self.future.clear();
        self.past.push_back(HistoryEntry {
            transaction,
            inverse,
        });
        if self.past.len() > self.max_history {
            self.past.pop_front();
        }
        next
    }

    /// Undo the most recent transaction. Returns the reverted snapshot and
    /// the undone entry's description, or `None` when there is nothing to
    /// undo.
    pub fn undo(&mut self, doc: &Document) -> Option<(Document, String)> {
        let entry = self.past.pop_back()?;
        let (next, _) = entry.inverse.apply(doc);
        let description = entry.transaction.description.clone();
        self.future.push(entry);
        Some((next, description))
    }

    /// Redo the most recently undone transaction. The forward transaction
    /// re-applies and its inverse is captured afresh against the current
    /// state.
    pub fn redo(&mut self, doc: &Document) -> Option<(Document, String)> {
        let entry = self.future.pop()?;
        let (next, inverse) = entry.transaction.apply(doc);
        let description = entry.transaction.description.clone();
        self.past.push_back(HistoryEntry {
            transaction: entry.transaction,
            inverse,
        });
        if self.past.len() > self.max_history {
            self.past.pop_front();
        }
        Some((next, description))
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    #[cfg(test)]
    pub(crate) fn past_len(&self) -> usize {
        self.past.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::BlockType;
    use crate::document::doc_with_roots;
    use crate::operation::Operation;

    fn retag(ids: &[crate::block::BlockId], kind: BlockType) -> Transaction {
        Transaction::single(
            "retag",
            Operation::SetBlockType {
                block_id: ids[0].clone(),
                kind,
            },
        )
    }

    #[test]
    fn execute_then_undo_then_redo() {
        let (doc, ids) = doc_with_roots(&["x"]);
        let mut engine = CommandEngine::default();

        let doc1 = engine.execute(&doc, retag(&ids, BlockType::Heading1));
        assert_eq!(doc1.get_block(&ids[0]).unwrap().kind, BlockType::Heading1);
        assert!(engine.can_undo());
        assert!(!engine.can_redo());

        let (doc2, _) = engine.undo(&doc1).unwrap();
        assert_eq!(doc2.get_block(&ids[0]).unwrap().kind, BlockType::Paragraph);
        assert!(!engine.can_undo());
        assert!(engine.can_redo());

        let (doc3, _) = engine.redo(&doc2).unwrap();
        assert_eq!(doc3.get_block(&ids[0]).unwrap().kind, BlockType::Heading1);
        assert!(engine.can_undo());
        assert!(!engine.can_redo());
    }

    #[test]
    fn undo_on_empty_history_returns_none() {
        let (doc, _) = doc_with_roots(&["x"]);
        let mut engine = CommandEngine::default();
        assert!(engine.undo(&doc).is_none());
        assert!(engine.redo(&doc).is_none());
    }

    #[test]
    fn a_new_execution_clears_the_redo_stack() {
        let (doc, ids) = doc_with_roots(&["x"]);
        let mut engine = CommandEngine::default();
        let doc1 = engine.execute(&doc, retag(&ids, BlockType::Heading1));
        let (doc2, _) = engine.undo(&doc1).unwrap();
        let _doc3 = engine.execute(&doc2, retag(&ids, BlockType::Quote));
        assert!(!engine.can_redo());
    }

    #[test]
    fn history_is_bounded_and_drops_the_oldest() {
        let (mut doc, ids) = doc_with_roots(&["x"]);
        let mut engine = CommandEngine::new(3);
        for kind in [
            BlockType::Heading1,
            BlockType::Heading2,
            BlockType::Heading3,
            BlockType::Quote,
        ] {
            doc = engine.execute(&doc, retag(&ids, kind));
        }
        assert_eq!(engine.past_len(), 3);

        // Three undos exhaust the bounded stack; the first retag is gone.
        for _ in 0..3 {
            let (next, _) = engine.undo(&doc).unwrap();
            doc = next;
        }
        assert!(engine.undo(&doc).is_none());
        assert_eq!(doc.get_block(&ids[0]).unwrap().kind, BlockType::Heading1);
    }
}
