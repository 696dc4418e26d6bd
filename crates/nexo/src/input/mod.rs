// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Input handling: translating platform gestures into commands.
//!
//! There is no browser here, so the platform events are crate-defined
//! values the embedding host constructs from its own event loop and feeds
//! to the handler functions. Geometry-dependent rules (the arrow-key edge
//! threshold, the slash-menu anchor rect) read the geometry carried on
//! the event; the handlers never measure layout themselves.

mod block_selection;
mod keyboard;
mod text;

pub use block_selection::{
    copy_selection, cut_selection, delete_selected_blocks, SelectionGesture,
};
pub use keyboard::handle_key;
pub use text::{detect_shortcut, handle_composition_end, handle_composition_start, handle_text_input, Shortcut};

use crate::block::BlockId;
use crate::geometry::Rect;

/// Fired after the platform mutated a block's editable element. The
/// handler reads the element's current text itself.
#[derive(Clone, Debug)]
pub struct TextInputEvent {
    pub block_id: BlockId,
    /// Bounding rect of the editable, for anchoring the slash menu.
    pub anchor: Option<Rect>,
}

#[derive(Clone, Debug)]
pub struct CompositionEvent {
    pub block_id: BlockId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    ArrowUp,
    ArrowDown,
    Char(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn primary(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn primary_only() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn primary_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::default()
        }
    }

    pub fn shift_only() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct KeyEvent {
    pub key: Option<Key>,
    pub modifiers: Modifiers,
    /// Caret rect, when the host knows it (arrow-key edge detection).
    pub caret_rect: Option<Rect>,
    /// Rect of the block containing the caret.
    pub block_rect: Option<Rect>,
}

impl KeyEvent {
    pub fn of(key: Key) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key: Some(key),
            modifiers,
            ..Self::default()
        }
    }
}

/// Whether the editor consumed the key or the platform default should
/// run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDisposition {
    Handled,
    Pass,
}

/// Clipboard text produced by copy/cut: one line per block plus a
/// minimal HTML form tagging each block's type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub plain_text: String,
    pub html: String,
}

/// The result of a key dispatch.
#[derive(Debug)]
pub struct KeyOutcome {
    pub disposition: KeyDisposition,
    pub clipboard: Option<ClipboardPayload>,
}

impl KeyOutcome {
    pub(crate) fn handled() -> Self {
        Self {
            disposition: KeyDisposition::Handled,
            clipboard: None,
        }
    }

    pub(crate) fn pass() -> Self {
        Self {
            disposition: KeyDisposition::Pass,
            clipboard: None,
        }
    }

    pub(crate) fn with_clipboard(payload: Option<ClipboardPayload>) -> Self {
        Self {
            disposition: KeyDisposition::Handled,
            clipboard: payload,
        }
    }

    pub fn is_handled(&self) -> bool {
        self.disposition == KeyDisposition::Handled
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseKind {
    Down,
    Move,
    Up,
}

#[derive(Clone, Debug)]
pub struct MouseEvent {
    pub kind: MouseKind,
    /// The block element under the pointer, if any.
    pub block_id: Option<BlockId>,
    pub shift: bool,
    /// Ctrl/Cmd held.
    pub primary: bool,
    /// A button is held (drag in progress).
    pub button_down: bool,
}
