// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Typed pub/sub for document, block and selection events.
//!
//! Delivery is synchronous within `emit`; a panicking subscriber is caught
//! and logged so it cannot poison the remaining subscribers. Handlers may
//! subscribe or unsubscribe re-entrantly — the subscriber list is
//! snapshotted before each delivery pass.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use strum_macros::{Display, EnumIter};

use crate::block::{now_ms, Block, BlockId};
use crate::document::Document;
use crate::geometry::Rect;
use crate::selection::Selection;

/// The event vocabulary. `Display` yields the wire names consumers match
/// on (`document:changed`, `block:created`, …).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum EventKind {
    #[strum(serialize = "document:changed")]
    DocumentChanged,
    #[strum(serialize = "block:created")]
    BlockCreated,
    #[strum(serialize = "block:updated")]
    BlockUpdated,
    #[strum(serialize = "block:deleted")]
    BlockDeleted,
    #[strum(serialize = "block:moved")]
    BlockMoved,
    #[strum(serialize = "selection:changed")]
    SelectionChanged,
    #[strum(serialize = "focus:changed")]
    FocusChanged,
    #[strum(serialize = "command:executed")]
    CommandExecuted,
    #[strum(serialize = "command:undone")]
    CommandUndone,
    #[strum(serialize = "command:redone")]
    CommandRedone,
}

/// Where a mutation originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSource {
    User,
    Api,
    History,
    Collaboration,
}

/// An event with its payload.
#[derive(Clone, Debug)]
pub enum EditorEvent {
    DocumentChanged {
        previous: Box<Document>,
        current: Box<Document>,
    },
    BlockCreated {
        block: Block,
    },
    BlockUpdated {
        block: Block,
    },
    BlockDeleted {
        block_id: BlockId,
    },
    BlockMoved {
        block_id: BlockId,
        new_parent_id: Option<BlockId>,
        new_index: usize,
    },
    SelectionChanged {
        selection: Selection,
    },
    FocusChanged {
        block_id: Option<BlockId>,
        show_slash_menu: bool,
        anchor: Option<Rect>,
    },
    CommandExecuted {
        description: String,
    },
    CommandUndone {
        description: String,
    },
    CommandRedone {
        description: String,
    },
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::DocumentChanged { .. } => EventKind::DocumentChanged,
            EditorEvent::BlockCreated { .. } => EventKind::BlockCreated,
            EditorEvent::BlockUpdated { .. } => EventKind::BlockUpdated,
            EditorEvent::BlockDeleted { .. } => EventKind::BlockDeleted,
            EditorEvent::BlockMoved { .. } => EventKind::BlockMoved,
            EditorEvent::SelectionChanged { .. } => EventKind::SelectionChanged,
            EditorEvent::FocusChanged { .. } => EventKind::FocusChanged,
            EditorEvent::CommandExecuted { .. } => EventKind::CommandExecuted,
            EditorEvent::CommandUndone { .. } => EventKind::CommandUndone,
            EditorEvent::CommandRedone { .. } => EventKind::CommandRedone,
        }
    }
}

/// What a subscriber receives: the event, its source, and the emit stamp.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub event: EditorEvent,
    pub source: EventSource,
    pub timestamp: u64,
}

/// Handle returned by `on`/`on_any`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&Envelope)>;

struct Subscriber {
    id: SubscriptionId,
    kind: Option<EventKind>,
    handler: Handler,
}

/// The bus. Cheap to clone handles around via `Rc`.
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event kind.
    pub fn on(&self, kind: EventKind, handler: impl Fn(&Envelope) + 'static) -> SubscriptionId {
        self.subscribe(Some(kind), Rc::new(handler))
    }

    /// Subscribe to every event.
    pub fn on_any(&self, handler: impl Fn(&Envelope) + 'static) -> SubscriptionId {
        self.subscribe(None, Rc::new(handler))
    }

    fn subscribe(&self, kind: Option<EventKind>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            kind,
            handler,
        });
        id
    }

    pub fn off(&self, id: SubscriptionId) {
        self.subscribers
            .borrow_mut()
            .retain(|subscriber| subscriber.id != id);
    }

    /// Deliver `event` synchronously to every matching subscriber, in
    /// subscription order. A panicking handler is logged and skipped.
    pub fn emit(&self, event: EditorEvent, source: EventSource) {
        let envelope = Envelope {
            event,
            source,
            timestamp: now_ms(),
        };
        let kind = envelope.event.kind();
        let snapshot: Vec<(SubscriptionId, Option<EventKind>, Handler)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|s| (s.id, s.kind, s.handler.clone()))
            .collect();
        for (id, wanted, handler) in snapshot {
            if wanted.is_some_and(|wanted| wanted != kind) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&envelope)));
            if outcome.is_err() {
                log::error!("event subscriber {id:?} panicked handling {kind}; continuing");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}
