// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Structural store operations: creation, insertion, deletion and moves.
//!
//! Every operation takes a snapshot and returns a new one. An operation
//! targeting an unknown id returns the input unchanged; structurally
//! invalid moves (into the moved block's own subtree) are refused the same
//! way.

use crate::block::{Block, BlockData, BlockId, BlockType};
use crate::document::Document;

impl Document {
    /// Allocate a new block of `kind` and insert it under `parent_id`
    /// (root when `None`) at `index`, appending when `index` is `None`.
    /// Returns the new snapshot and the created block, or `None` when the
    /// parent does not resolve.
    pub fn create_block(
        &self,
        kind: BlockType,
        data: BlockData,
        parent_id: Option<&BlockId>,
        index: Option<usize>,
    ) -> (Document, Option<Block>) {
        if let Some(parent) = parent_id {
            if !self.contains(parent) {
                return (self.clone(), None);
            }
        }
        let mut doc = self.clone();
        let block = Block::new(kind, data);
        let siblings_len = match parent_id {
            Some(parent) => doc.children(parent).len(),
            None => doc.root_ids.len(),
        };
        let index = index.unwrap_or(siblings_len).min(siblings_len);
        doc.attach(block.clone(), parent_id, index);
        doc.bump_doc();
        let created = doc.get_block(&block.id).cloned();
        doc.assert_store_invariants();
        (doc, created)
    }

    /// Insert `block` as the next sibling of `after_id`.
    pub fn insert_block_after(&self, block: Block, after_id: &BlockId) -> Document {
        let Some(index) = self.block_index(after_id) else {
            return self.clone();
        };
        let parent = self
            .get_block(after_id)
            .and_then(|after| after.parent_id.clone());
        let mut doc = self.clone();
        doc.attach(block, parent.as_ref(), index + 1);
        doc.bump_doc();
        doc.assert_store_invariants();
        doc
    }

    /// Insert `block` as the previous sibling of `before_id`.
    pub fn insert_block_before(&self, block: Block, before_id: &BlockId) -> Document {
        let Some(index) = self.block_index(before_id) else {
            return self.clone();
        };
        let parent = self
            .get_block(before_id)
            .and_then(|before| before.parent_id.clone());
        let mut doc = self.clone();
        doc.attach(block, parent.as_ref(), index);
        doc.bump_doc();
        doc.assert_store_invariants();
        doc
    }

    /// Remove `id` and every descendant. Deleting the last block leaves a
    /// fresh empty paragraph so the document is never empty.
    pub fn delete_block(&self, id: &BlockId) -> Document {
        if !self.contains(id) {
            return self.clone();
        }
        let mut doc = self.clone();
        doc.remove_subtree(id);
        if doc.blocks.is_empty() {
            let paragraph = Block::empty_paragraph();
            doc.attach(paragraph, None, 0);
        }
        doc.bump_doc();
        doc.assert_store_invariants();
        doc
    }

    /// Relocate the subtree at `id` under `new_parent_id` at `new_index`.
    /// Refused (input returned unchanged) when the target is the block
    /// itself or one of its descendants; a move to the identical position
    /// is a no-op.
    pub fn move_block(
        &self,
        id: &BlockId,
        new_parent_id: Option<&BlockId>,
        new_index: usize,
    ) -> Document {
        let Some(block) = self.get_block(id) else {
            return self.clone();
        };
        if let Some(new_parent) = new_parent_id {
            if !self.contains(new_parent)
                || new_parent == id
                || self.is_ancestor(id, new_parent)
            {
                return self.clone();
            }
        }
        let current_parent = block.parent_id.clone();
        let current_index = self.block_index(id).unwrap_or(0);
        if current_parent.as_ref() == new_parent_id && current_index == new_index {
            return self.clone();
        }

        let mut doc = self.clone();
        doc.detach(id);
        if let Some(block) = doc.block_mut(id) {
            block.parent_id = new_parent_id.cloned();
        }
        if let Some(siblings) = doc.sibling_ids_mut(new_parent_id) {
            let index = new_index.min(siblings.len());
            siblings.insert(index, id.clone());
        }
        doc.bump_block(id);
        doc.assert_store_invariants();
        doc
    }

    /// Move `id` to the end of its previous sibling's children. No-op when
    /// there is no previous sibling.
    pub fn indent_block(&self, id: &BlockId) -> Document {
        let Some(previous) = self.previous_sibling(id) else {
            return self.clone();
        };
        if previous.is_void() {
            return self.clone();
        }
        let new_parent = previous.id.clone();
        let new_index = previous.children_ids.len();
        self.move_block(id, Some(&new_parent), new_index)
    }

    /// Move `id` to become the next sibling of its parent. No-op at root.
    pub fn outdent_block(&self, id: &BlockId) -> Document {
        let Some(parent) = self.parent(id) else {
            return self.clone();
        };
        let parent_id = parent.id.clone();
        let grandparent = parent.parent_id.clone();
        let Some(parent_index) = self.block_index(&parent_id) else {
            return self.clone();
        };
        self.move_block(id, grandparent.as_ref(), parent_index + 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::doc_with_roots;

    #[test]
    fn create_block_appends_at_root() {
        let (doc, _) = doc_with_roots(&["a"]);
        let (doc, created) =
            doc.create_block(BlockType::Paragraph, BlockData::with_text("b"), None, None);
        let created = created.expect("block should be created");
        assert_eq!(doc.root_ids.len(), 2);
        assert_eq!(doc.root_ids[1], created.id);
        assert_eq!(created.parent_id, None);
    }

    #[test]
    fn create_block_under_missing_parent_is_refused() {
        let (doc, _) = doc_with_roots(&["a"]);
        let ghost = BlockId::generate();
        let before = doc.clone();
        let (doc, created) = doc.create_block(
            BlockType::Paragraph,
            BlockData::new(),
            Some(&ghost),
            None,
        );
        assert!(created.is_none());
        assert_eq!(doc.blocks, before.blocks);
    }

    #[test]
    fn insert_after_lands_between_siblings() {
        let (doc, ids) = doc_with_roots(&["a", "c"]);
        let block = Block::new(BlockType::Paragraph, BlockData::with_text("b"));
        let b_id = block.id.clone();
        let doc = doc.insert_block_after(block, &ids[0]);
        assert_eq!(doc.root_ids, vec![ids[0].clone(), b_id, ids[1].clone()]);
    }

    #[test]
    fn delete_cascades_to_descendants() {
        let (doc, ids) = doc_with_roots(&["a", "b"]);
        let (doc, child) = doc.create_block(
            BlockType::Paragraph,
            BlockData::with_text("a1"),
            Some(&ids[0]),
            None,
        );
        let child = child.unwrap();
        let doc = doc.delete_block(&ids[0]);
        assert!(!doc.contains(&ids[0]));
        assert!(!doc.contains(&child.id));
        assert!(doc.contains(&ids[1]));
    }

    #[test]
    fn deleting_the_only_block_synthesises_a_paragraph() {
        let (doc, ids) = doc_with_roots(&["only"]);
        let doc = doc.delete_block(&ids[0]);
        assert_eq!(doc.block_count(), 1);
        let root = doc.root_blocks()[0];
        assert_eq!(root.kind, BlockType::Paragraph);
        assert_eq!(root.text(), "");
        assert_ne!(root.id, ids[0]);
    }

    #[test]
    fn move_into_own_descendant_is_refused() {
        let (doc, ids) = doc_with_roots(&["a"]);
        let (doc, child) = doc.create_block(
            BlockType::Paragraph,
            BlockData::with_text("a1"),
            Some(&ids[0]),
            None,
        );
        let child = child.unwrap();
        let before = doc.clone();
        let doc = doc.move_block(&ids[0], Some(&child.id), 0);
        assert_eq!(doc.blocks, before.blocks);
        assert_eq!(doc.root_ids, before.root_ids);

        let doc = doc.move_block(&ids[0], Some(&ids[0]), 0);
        assert_eq!(doc.root_ids, before.root_ids);
    }

    #[test]
    fn move_to_identical_position_is_a_noop() {
        let (doc, ids) = doc_with_roots(&["a", "b"]);
        let before_version = doc.meta.version;
        let doc = doc.move_block(&ids[1], None, 1);
        assert_eq!(doc.meta.version, before_version);
    }

    #[test]
    fn move_reorders_roots() {
        let (doc, ids) = doc_with_roots(&["a", "b", "c"]);
        let doc = doc.move_block(&ids[2], None, 0);
        assert_eq!(
            doc.root_ids,
            vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]
        );
    }

    #[test]
    fn indent_nests_under_previous_sibling() {
        let (doc, ids) = doc_with_roots(&["a", "b", "c"]);
        let doc = doc.indent_block(&ids[1]);
        assert_eq!(doc.get_block(&ids[0]).unwrap().children_ids, vec![ids[1].clone()]);
        assert_eq!(doc.root_ids, vec![ids[0].clone(), ids[2].clone()]);
        assert_eq!(
            doc.get_block(&ids[1]).unwrap().parent_id,
            Some(ids[0].clone())
        );
    }

    #[test]
    fn indent_without_previous_sibling_is_a_noop() {
        let (doc, ids) = doc_with_roots(&["a", "b"]);
        let before = doc.clone();
        let doc = doc.indent_block(&ids[0]);
        assert_eq!(doc.root_ids, before.root_ids);
    }

    #[test]
    fn outdent_restores_the_original_shape() {
        let (doc, ids) = doc_with_roots(&["a", "b", "c"]);
        let indented = doc.indent_block(&ids[1]);
        let restored = indented.outdent_block(&ids[1]);
        assert_eq!(restored.root_ids, doc.root_ids);
        assert_eq!(restored.get_block(&ids[1]).unwrap().parent_id, None);
    }

    #[test]
    fn outdent_at_root_is_a_noop() {
        let (doc, ids) = doc_with_roots(&["a"]);
        let before = doc.clone();
        let doc = doc.outdent_block(&ids[0]);
        assert_eq!(doc.root_ids, before.root_ids);
    }
}
