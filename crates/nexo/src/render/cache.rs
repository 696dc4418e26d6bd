// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Per-block render memoisation.
//!
//! Entries are keyed by block id and validated against the block version
//! they were rendered from (plus the numbered-list index, which can change
//! without a version bump when a sibling changes type). A bounded LRU
//! evicts down to 80% of capacity under pressure.

use std::collections::{HashMap, VecDeque};

use nexo_vdom::VNode;

use crate::block::{Block, BlockId};

pub const DEFAULT_CACHE_CAPACITY: usize = 500;

struct CacheEntry {
    version: u64,
    list_index: Option<usize>,
    node: VNode,
}

pub struct RenderCache {
    entries: HashMap<BlockId, CacheEntry>,
    order: VecDeque<BlockId>,
    capacity: usize,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl RenderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// The cached node for `block`, only when it was rendered from the
    /// same version (and list index). A hit refreshes LRU recency.
    pub fn get(&mut self, block: &Block, list_index: Option<usize>) -> Option<VNode> {
        let entry = self.entries.get(&block.id)?;
        if entry.version != block.meta.version || entry.list_index != list_index {
            return None;
        }
        let node = entry.node.clone();
        self.touch(&block.id);
        Some(node)
    }

    pub fn put(&mut self, block: &Block, list_index: Option<usize>, node: VNode) {
        self.entries.insert(
            block.id.clone(),
            CacheEntry {
                version: block.meta.version,
                list_index,
                node,
            },
        );
        self.touch(&block.id);
        self.evict_under_pressure();
    }

    pub fn invalidate(&mut self, id: &BlockId) {
        self.entries.remove(id);
        self.order.retain(|candidate| candidate != id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, id: &BlockId) {
        self.order.retain(|candidate| candidate != id);
        self.order.push_back(id.clone());
    }

    fn evict_under_pressure(&mut self) {
        if self.entries.len() <= self.capacity {
            return;
        }
        let target = (self.capacity * 4) / 5;
        while self.entries.len() > target {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::{BlockData, BlockType};

    fn block(text: &str) -> Block {
        Block::new(BlockType::Paragraph, BlockData::with_text(text))
    }

    #[test]
    fn hits_require_a_matching_version() {
        let mut cache = RenderCache::default();
        let mut b = block("a");
        cache.put(&b, None, VNode::text("rendered"));
        assert!(cache.get(&b, None).is_some());

        b.meta.bump();
        assert!(cache.get(&b, None).is_none());
    }

    #[test]
    fn hits_require_a_matching_list_index() {
        let mut cache = RenderCache::default();
        let b = block("1.");
        cache.put(&b, Some(1), VNode::text("rendered"));
        assert!(cache.get(&b, Some(1)).is_some());
        assert!(cache.get(&b, Some(2)).is_none());
    }

    #[test]
    fn invalidate_drops_the_entry() {
        let mut cache = RenderCache::default();
        let b = block("a");
        cache.put(&b, None, VNode::text("rendered"));
        cache.invalidate(&b.id);
        assert!(cache.get(&b, None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn pressure_evicts_to_eighty_percent_lru_first() {
        let mut cache = RenderCache::new(10);
        let blocks: Vec<Block> = (0..11).map(|i| block(&i.to_string())).collect();
        for b in &blocks {
            cache.put(b, None, VNode::text(b.text()));
        }
        assert_eq!(cache.len(), 8);
        // The oldest entries went first.
        assert!(cache.get(&blocks[0], None).is_none());
        assert!(cache.get(&blocks[10], None).is_some());
    }
}
