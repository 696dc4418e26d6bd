// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::{now_ms, Block, BlockId};

/// Creation/update stamps and the document-level version, advanced on
/// every mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocMeta {
    pub created_at: u64,
    pub updated_at: u64,
    pub version: u64,
}

impl DocMeta {
    fn fresh() -> Self {
        let now = now_ms();
        Self {
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

/// A captured subtree: the blocks of a removed subtree in depth-first
/// pre-order (root first) plus the position it was detached from. This is
/// exactly the payload a delete's inverse needs.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CapturedSubtree {
    pub blocks: Vec<Block>,
    pub parent_id: Option<BlockId>,
    pub index: usize,
}

/// The document: id-keyed block map plus the ordered root list. Order
/// lives only in `root_ids` and each block's `children_ids`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub blocks: HashMap<BlockId, Block>,
    pub root_ids: Vec<BlockId>,
    pub meta: DocMeta,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A fresh document containing one empty paragraph.
    pub fn new() -> Self {
        let paragraph = Block::empty_paragraph();
        let mut blocks = HashMap::new();
        let root_ids = vec![paragraph.id.clone()];
        blocks.insert(paragraph.id.clone(), paragraph);
        Self {
            id: Uuid::new_v4().simple().to_string(),
            blocks,
            root_ids,
            meta: DocMeta::fresh(),
        }
    }

    // ─── Queries ────────────────────────────────────────────────────────

    pub fn get_block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn root_blocks(&self) -> Vec<&Block> {
        self.root_ids
            .iter()
            .filter_map(|id| self.blocks.get(id))
            .collect()
    }

    pub fn children(&self, id: &BlockId) -> Vec<&Block> {
        self.get_block(id)
            .map(|block| {
                block
                    .children_ids
                    .iter()
                    .filter_map(|child| self.blocks.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parent(&self, id: &BlockId) -> Option<&Block> {
        self.get_block(id)?
            .parent_id
            .as_ref()
            .and_then(|parent| self.blocks.get(parent))
    }

    /// Ancestors from the nearest parent up to a root block.
    pub fn ancestors(&self, id: &BlockId) -> Vec<&Block> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(block) = current {
            out.push(block);
            current = self.parent(&block.id);
        }
        out
    }

    /// All blocks of the subtree below `id`, depth-first pre-order, `id`
    /// excluded.
    pub fn descendants(&self, id: &BlockId) -> Vec<&Block> {
        let mut out = Vec::new();
        if let Some(block) = self.get_block(id) {
            for child in &block.children_ids {
                self.collect_subtree(child, &mut out);
            }
        }
        out
    }

    fn collect_subtree<'a>(&'a self, id: &BlockId, out: &mut Vec<&'a Block>) {
        if let Some(block) = self.get_block(id) {
            out.push(block);
            for child in &block.children_ids {
                self.collect_subtree(child, out);
            }
        }
    }

    /// The sibling list `id` belongs to, `id` included.
    pub fn siblings(&self, id: &BlockId) -> Vec<&Block> {
        self.sibling_ids_of(id)
            .map(|ids| ids.iter().filter_map(|id| self.blocks.get(id)).collect())
            .unwrap_or_default()
    }

    /// Index of `id` within its sibling list.
    pub fn block_index(&self, id: &BlockId) -> Option<usize> {
        self.sibling_ids_of(id)?
            .iter()
            .position(|candidate| candidate == id)
    }

    pub fn previous_sibling(&self, id: &BlockId) -> Option<&Block> {
        let siblings = self.sibling_ids_of(id)?;
        let index = siblings.iter().position(|candidate| candidate == id)?;
        siblings
            .get(index.checked_sub(1)?)
            .and_then(|id| self.blocks.get(id))
    }

    pub fn next_sibling(&self, id: &BlockId) -> Option<&Block> {
        let siblings = self.sibling_ids_of(id)?;
        let index = siblings.iter().position(|candidate| candidate == id)?;
        siblings.get(index + 1).and_then(|id| self.blocks.get(id))
    }

    /// Every block in depth-first pre-order of the whole forest, the
    /// order blocks appear on screen.
    pub fn flattened_blocks(&self) -> Vec<&Block> {
        let mut out = Vec::with_capacity(self.blocks.len());
        for root in &self.root_ids {
            self.collect_subtree(root, &mut out);
        }
        out
    }

    pub fn flattened_ids(&self) -> Vec<BlockId> {
        self.flattened_blocks()
            .into_iter()
            .map(|block| block.id.clone())
            .collect()
    }

    /// The closest editable block before `id` in flattened order, skipping
    /// void blocks (divider, image).
    pub fn previous_editable_block(&self, id: &BlockId) -> Option<&Block> {
        let flattened = self.flattened_blocks();
        let index = flattened.iter().position(|block| &block.id == id)?;
        flattened[..index]
            .iter()
            .rev()
            .find(|block| block.is_editable())
            .copied()
    }

    /// The closest editable block after `id` in flattened order.
    pub fn next_editable_block(&self, id: &BlockId) -> Option<&Block> {
        let flattened = self.flattened_blocks();
        let index = flattened.iter().position(|block| &block.id == id)?;
        flattened[index + 1..]
            .iter()
            .find(|block| block.is_editable())
            .copied()
    }

    /// Is `ancestor` a (transitive) ancestor of `id`?
    pub fn is_ancestor(&self, ancestor: &BlockId, id: &BlockId) -> bool {
        self.ancestors(id).iter().any(|block| &block.id == ancestor)
    }

    /// The deepest last block of the subtree rooted at `id`.
    pub fn last_descendant(&self, id: &BlockId) -> Option<&Block> {
        let mut current = self.get_block(id)?;
        while let Some(last_child) = current
            .children_ids
            .last()
            .and_then(|child| self.blocks.get(child))
        {
            current = last_child;
        }
        Some(current)
    }

    fn sibling_ids_of(&self, id: &BlockId) -> Option<&Vec<BlockId>> {
        let block = self.get_block(id)?;
        match &block.parent_id {
            Some(parent) => self.blocks.get(parent).map(|p| &p.children_ids),
            None => Some(&self.root_ids),
        }
    }

    // ─── Mutating helpers for the store ops and the operation log ───────

    pub(crate) fn block_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id)
    }

    /// Bump a block's version/update stamp along with the document's.
    pub(crate) fn bump_block(&mut self, id: &BlockId) {
        if let Some(block) = self.blocks.get_mut(id) {
            block.meta.bump();
        }
        self.bump_doc();
    }

    pub(crate) fn bump_doc(&mut self) {
        self.meta.updated_at = now_ms();
        self.meta.version += 1;
    }

    /// The mutable sibling id list for a parent (`None` = root list).
    pub(crate) fn sibling_ids_mut(&mut self, parent: Option<&BlockId>) -> Option<&mut Vec<BlockId>> {
        match parent {
            Some(parent) => self.blocks.get_mut(parent).map(|p| &mut p.children_ids),
            None => Some(&mut self.root_ids),
        }
    }

    /// Attach an already-built block under `parent` at `index` (clamped),
    /// preserving the block's id. The block's own children are expected to
    /// be inserted separately (or to already exist in the map).
    pub(crate) fn attach(&mut self, mut block: Block, parent: Option<&BlockId>, index: usize) {
        block.parent_id = parent.cloned();
        let id = block.id.clone();
        self.blocks.insert(id.clone(), block);
        if let Some(siblings) = self.sibling_ids_mut(parent) {
            let index = index.min(siblings.len());
            siblings.insert(index, id);
        }
    }

    /// Re-insert a captured subtree at its recorded position. Blocks keep
    /// their ids; internal parent/child wiring is taken from the capture.
    pub(crate) fn insert_subtree(&mut self, capture: &CapturedSubtree) {
        let Some((root, rest)) = capture.blocks.split_first() else {
            return;
        };
        self.attach(root.clone(), capture.parent_id.as_ref(), capture.index);
        for block in rest {
            self.blocks.insert(block.id.clone(), block.clone());
        }
    }

    /// Detach a block from its sibling list without removing it from the
    /// map.
    pub(crate) fn detach(&mut self, id: &BlockId) {
        let parent = self.get_block(id).and_then(|block| block.parent_id.clone());
        if let Some(siblings) = self.sibling_ids_mut(parent.as_ref()) {
            siblings.retain(|candidate| candidate != id);
        }
    }

    /// Clone the subtree rooted at `id` (DFS pre-order) together with its
    /// position. Returns `None` for an unknown id.
    pub(crate) fn capture_subtree(&self, id: &BlockId) -> Option<CapturedSubtree> {
        let block = self.get_block(id)?;
        let index = self.block_index(id)?;
        let mut refs = Vec::new();
        self.collect_subtree(id, &mut refs);
        let blocks = refs.into_iter().cloned().collect();
        Some(CapturedSubtree {
            blocks,
            parent_id: block.parent_id.clone(),
            index,
        })
    }

    /// Remove the subtree rooted at `id` from the map and its sibling
    /// list. No safety net here: the public `delete_block` adds the
    /// empty-document paragraph; the operation log composes it explicitly.
    pub(crate) fn remove_subtree(&mut self, id: &BlockId) -> Option<CapturedSubtree> {
        let capture = self.capture_subtree(id)?;
        self.detach(id);
        for block in &capture.blocks {
            self.blocks.remove(&block.id);
        }
        Some(capture)
    }
}

/// Build a document whose roots are paragraphs with the given texts.
/// Test-only scaffolding shared by the store and operation suites.
#[cfg(test)]
pub(crate) fn doc_with_roots(texts: &[&str]) -> (Document, Vec<BlockId>) {
    use crate::block::{BlockData, BlockType};

    let mut doc = Document::new();
    doc.blocks.clear();
    doc.root_ids.clear();
    let mut ids = Vec::new();
    for text in texts {
        let block = Block::new(BlockType::Paragraph, BlockData::with_text(*text));
        ids.push(block.id.clone());
        let index = doc.root_ids.len();
        doc.attach(block, None, index);
    }
    (doc, ids)
}
