// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Content-level store operations: data updates, type changes, merge and
//! split.

use crate::annotate;
use crate::block::{data_keys, Block, BlockData, BlockId, BlockType};
use crate::document::Document;

impl Document {
    /// Merge `patch` into the block's data record and bump its version.
    pub fn update_block(&self, id: &BlockId, patch: &BlockData) -> Document {
        if !self.contains(id) {
            return self.clone();
        }
        let mut doc = self.clone();
        if let Some(block) = doc.block_mut(id) {
            block.data.merge(patch);
        }
        doc.bump_block(id);
        doc.assert_store_invariants();
        doc
    }

    /// Change the block's tag, preserving data and children.
    pub fn change_block_type(&self, id: &BlockId, kind: BlockType) -> Document {
        if !self.contains(id) {
            return self.clone();
        }
        let mut doc = self.clone();
        if let Some(block) = doc.block_mut(id) {
            block.kind = kind;
        }
        doc.bump_block(id);
        doc.assert_store_invariants();
        doc
    }

    /// Append the source's text (and annotations, shifted) to the target,
    /// move the source's children to the end of the target's children, and
    /// delete the source. The target keeps its type. Void blocks cannot
    /// take part in a merge.
    pub fn merge_blocks(&self, source_id: &BlockId, target_id: &BlockId) -> Document {
        let (Some(source), Some(target)) = (self.get_block(source_id), self.get_block(target_id))
        else {
            return self.clone();
        };
        if source_id == target_id || source.is_void() || target.is_void() {
            return self.clone();
        }

        let target_len = target.text_len();
        let merged_text = format!("{}{}", target.text(), source.text());
        let source_spans = annotate::spans_of(&source.data);
        let target_spans = annotate::spans_of(&target.data);
        let merged_spans = {
            let mut spans = target_spans;
            for span in source_spans {
                spans.push(annotate::AnnotationSpan::new(
                    span.start + target_len,
                    span.end + target_len,
                    span.format,
                ));
            }
            annotate::normalize(spans)
        };
        let moved_children = source.children_ids.clone();

        let mut doc = self.clone();
        for child in &moved_children {
            doc.detach(child);
            if let Some(block) = doc.block_mut(child) {
                block.parent_id = Some(target_id.clone());
            }
        }
        // The source sheds its children first so removing it cannot
        // cascade into the blocks we just re-homed.
        if let Some(block) = doc.block_mut(source_id) {
            block.children_ids.clear();
        }
        if let Some(block) = doc.block_mut(target_id) {
            block.data.set_text(merged_text);
            if merged_spans.is_empty() {
                block.data.remove(data_keys::ANNOTATIONS);
            } else {
                block
                    .data
                    .set(data_keys::ANNOTATIONS, annotate::spans_to_value(&merged_spans));
            }
            block.children_ids.extend(moved_children);
        }
        doc.remove_subtree(source_id);
        doc.bump_block(target_id);
        doc.assert_store_invariants();
        doc
    }

    /// Truncate the block's text at `offset` (clamped) and create a new
    /// paragraph holding the remainder as the immediate next sibling.
    /// Children stay with the original block.
    pub fn split_block(&self, id: &BlockId, offset: usize) -> (Document, Option<Block>) {
        let Some(block) = self.get_block(id) else {
            return (self.clone(), None);
        };
        if block.is_void() {
            return (self.clone(), None);
        }
        let offset = offset.min(block.text_len());
        let chars: Vec<char> = block.text().chars().collect();
        let head: String = chars[..offset].iter().collect();
        let tail: String = chars[offset..].iter().collect();

        let spans = annotate::spans_of(&block.data);
        let head_spans = annotate::splice(&spans, offset, chars.len() - offset, 0);
        let tail_spans = annotate::splice(&spans, 0, offset, 0);

        let mut doc = self.clone();
        if let Some(block) = doc.block_mut(id) {
            block.data.set_text(head);
            if head_spans.is_empty() {
                block.data.remove(data_keys::ANNOTATIONS);
            } else {
                block
                    .data
                    .set(data_keys::ANNOTATIONS, annotate::spans_to_value(&head_spans));
            }
        }
        doc.bump_block(id);

        let mut data = BlockData::with_text(tail);
        if !tail_spans.is_empty() {
            data.set(data_keys::ANNOTATIONS, annotate::spans_to_value(&tail_spans));
        }
        let new_block = Block::new(BlockType::Paragraph, data);
        let doc = doc.insert_block_after(new_block.clone(), id);
        let created = doc.get_block(&new_block.id).cloned();
        doc.assert_store_invariants();
        (doc, created)
    }

    /// Splice the block's text in place: remove `removed` chars at
    /// `offset` and insert `inserted` there, shifting annotations along.
    /// Offsets clamp to the text. Used by the text operations.
    pub(crate) fn splice_text(
        &mut self,
        id: &BlockId,
        offset: usize,
        removed: usize,
        inserted: &str,
    ) -> Option<String> {
        let block = self.get_block(id)?;
        let chars: Vec<char> = block.text().chars().collect();
        let offset = offset.min(chars.len());
        let removed = removed.min(chars.len() - offset);
        let removed_text: String = chars[offset..offset + removed].iter().collect();
        let mut new_text: String = chars[..offset].iter().collect();
        new_text.push_str(inserted);
        new_text.extend(chars[offset + removed..].iter());

        let spans = annotate::spans_of(&block.data);
        let spans = annotate::splice(&spans, offset, removed, inserted.chars().count());

        let block = self.block_mut(id)?;
        block.data.set_text(new_text);
        if spans.is_empty() {
            block.data.remove(data_keys::ANNOTATIONS);
        } else {
            block
                .data
                .set(data_keys::ANNOTATIONS, annotate::spans_to_value(&spans));
        }
        self.bump_block(id);
        Some(removed_text)
    }
}
