// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

mod annotate;
mod block;
mod bridge;
mod controller;
mod document;
mod error;
mod event;
mod geometry;
mod history;
mod input;
mod operation;
mod plugin;
mod render;
mod selection;
mod tests;
mod transaction;

pub use crate::annotate::AnnotationSpan;
pub use crate::annotate::InlineFormat;
pub use crate::block::Block;
pub use crate::block::BlockData;
pub use crate::block::BlockId;
pub use crate::block::BlockMeta;
pub use crate::block::BlockType;
pub use crate::bridge::SelectionBridge;
pub use crate::controller::EditorConfig;
pub use crate::controller::EditorController;
pub use crate::controller::RelativePosition;
pub use crate::document::DocMeta;
pub use crate::document::Document;
pub use crate::error::DocumentError;
pub use crate::event::EditorEvent;
pub use crate::event::Envelope;
pub use crate::event::EventBus;
pub use crate::event::EventKind;
pub use crate::event::EventSource;
pub use crate::event::SubscriptionId;
pub use crate::geometry::Rect;
pub use crate::history::CommandEngine;
pub use crate::input::copy_selection;
pub use crate::input::cut_selection;
pub use crate::input::delete_selected_blocks;
pub use crate::input::detect_shortcut;
pub use crate::input::handle_composition_end;
pub use crate::input::handle_composition_start;
pub use crate::input::handle_key;
pub use crate::input::handle_text_input;
pub use crate::input::Shortcut;
pub use crate::input::ClipboardPayload;
pub use crate::input::CompositionEvent;
pub use crate::input::Key;
pub use crate::input::KeyDisposition;
pub use crate::input::KeyEvent;
pub use crate::input::KeyOutcome;
pub use crate::input::Modifiers;
pub use crate::input::MouseEvent;
pub use crate::input::MouseKind;
pub use crate::input::SelectionGesture;
pub use crate::input::TextInputEvent;
pub use crate::operation::Applied;
pub use crate::operation::Operation;
pub use crate::plugin::Plugin;
pub use crate::plugin::PluginHost;
pub use crate::render::Compiler;
pub use crate::render::DirtyReason;
pub use crate::render::DirtyTracker;
pub use crate::render::RenderCache;
pub use crate::render::TemplateRegistry;
pub use crate::render::Viewport;
pub use crate::render::WindowConfig;
pub use crate::selection::CollapseTarget;
pub use crate::selection::Direction;
pub use crate::selection::ExtendUnit;
pub use crate::selection::Selection;
pub use crate::selection::SelectionContent;
pub use crate::selection::SelectionPoint;
pub use crate::selection::SelectionRange;
pub use crate::transaction::Transaction;

// The host surface types, re-exported for embedding hosts.
pub use nexo_vdom;

