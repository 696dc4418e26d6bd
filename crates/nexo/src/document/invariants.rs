// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Assertions that guarantee the document store is in a known state.
//!
//! Every public store operation checks these on the snapshot it returns.
//! Outside tests nothing is asserted; compile with the `assert-invariants`
//! feature to keep the checks in release builds.

use crate::document::Document;

impl Document {
    /// Invariant check entry point for store operations. A no-op unless
    /// compiled for tests or with `assert-invariants`.
    pub(crate) fn assert_store_invariants(&self) {
        #[cfg(any(test, feature = "assert-invariants"))]
        self.assert_invariants();
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    pub(crate) fn assert_invariants(&self) {
        self.assert_not_empty();
        self.assert_references_resolve();
        self.assert_parent_links_agree();
        self.assert_no_orphans_or_cycles();
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    fn assert_not_empty(&self) {
        if self.blocks.is_empty() || self.root_ids.is_empty() {
            panic!("Document has no blocks; the empty-paragraph safety net failed");
        }
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    fn assert_references_resolve(&self) {
        for id in &self.root_ids {
            if !self.blocks.contains_key(id) {
                panic!("Dangling root reference: {id}");
            }
        }
        for block in self.blocks.values() {
            for child in &block.children_ids {
                if !self.blocks.contains_key(child) {
                    panic!("Dangling child reference {child} under {}", block.id);
                }
            }
        }
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    fn assert_parent_links_agree(&self) {
        for block in self.blocks.values() {
            match &block.parent_id {
                Some(parent) => {
                    let Some(parent_block) = self.blocks.get(parent) else {
                        panic!("Block {} points at missing parent {parent}", block.id);
                    };
                    if !parent_block.children_ids.contains(&block.id) {
                        panic!(
                            "Block {} claims parent {parent} but is not among its children",
                            block.id
                        );
                    }
                }
                None => {
                    if !self.root_ids.contains(&block.id) {
                        panic!("Parentless block {} is not a root", block.id);
                    }
                }
            }
        }
    }

    /// Walking from the roots must reach every block exactly once,
    /// covering both the no-orphans and the acyclicity invariants.
    #[cfg(any(test, feature = "assert-invariants"))]
    fn assert_no_orphans_or_cycles(&self) {
        let flattened = self.flattened_ids();
        let mut seen = std::collections::HashSet::new();
        for id in &flattened {
            if !seen.insert(id.clone()) {
                panic!("Block {id} reachable twice: cycle or duplicated child entry");
            }
        }
        if flattened.len() != self.blocks.len() {
            panic!(
                "{} blocks reachable from the roots but {} stored: orphaned blocks",
                flattened.len(),
                self.blocks.len()
            );
        }
    }
}
