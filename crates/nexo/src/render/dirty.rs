// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Dirty tracking: which blocks have moved past their rendered state, and
//! why.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use strum_macros::Display;

use crate::block::BlockId;
use crate::event::{EditorEvent, Envelope};

/// Why a block needs re-rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DirtyReason {
    Created,
    Updated,
    Deleted,
    Moved,
    TypeChanged,
    ChildrenChanged,
    ParentChanged,
}

type DirtyListener = Rc<dyn Fn(&BlockId, DirtyReason)>;

/// Records per-block dirty reasons plus the set of deleted ids.
#[derive(Default)]
pub struct DirtyTracker {
    dirty: HashMap<BlockId, BTreeSet<DirtyReason>>,
    deleted: HashSet<BlockId>,
    listeners: RefCell<Vec<(u64, DirtyListener)>>,
    next_listener: u64,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: BlockId, reason: DirtyReason) {
        if reason == DirtyReason::Deleted {
            self.deleted.insert(id.clone());
        }
        self.dirty.entry(id.clone()).or_default().insert(reason);
        for (_, listener) in self.listeners.borrow().iter() {
            listener(&id, reason);
        }
    }

    /// Derive marks from an emitted editor event; the event stream is the
    /// operation stream as seen by renderers.
    pub fn mark_event(&mut self, envelope: &Envelope) {
        match &envelope.event {
            EditorEvent::BlockCreated { block } => {
                self.mark(block.id.clone(), DirtyReason::Created);
                if let Some(parent) = &block.parent_id {
                    self.mark(parent.clone(), DirtyReason::ChildrenChanged);
                }
            }
            EditorEvent::BlockUpdated { block } => {
                self.mark(block.id.clone(), DirtyReason::Updated);
            }
            EditorEvent::BlockDeleted { block_id } => {
                self.mark(block_id.clone(), DirtyReason::Deleted);
            }
            EditorEvent::BlockMoved {
                block_id,
                new_parent_id,
                ..
            } => {
                self.mark(block_id.clone(), DirtyReason::Moved);
                self.mark(block_id.clone(), DirtyReason::ParentChanged);
                if let Some(parent) = new_parent_id {
                    self.mark(parent.clone(), DirtyReason::ChildrenChanged);
                }
            }
            _ => {}
        }
    }

    pub fn is_dirty(&self, id: &BlockId) -> bool {
        self.dirty.contains_key(id)
    }

    pub fn reasons(&self, id: &BlockId) -> Vec<DirtyReason> {
        self.dirty
            .get(id)
            .map(|reasons| reasons.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn deleted_ids(&self) -> impl Iterator<Item = &BlockId> {
        self.deleted.iter()
    }

    pub fn dirty_ids(&self) -> impl Iterator<Item = &BlockId> {
        self.dirty.keys()
    }

    pub fn any_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn clear(&mut self) {
        self.dirty.clear();
        self.deleted.clear();
    }

    /// Observe marks as they land. Returns an id for `unsubscribe`.
    pub fn subscribe(&mut self, listener: impl Fn(&BlockId, DirtyReason) + 'static) -> u64 {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: u64) {
        self.listeners
            .borrow_mut()
            .retain(|(candidate, _)| *candidate != id);
    }
}
