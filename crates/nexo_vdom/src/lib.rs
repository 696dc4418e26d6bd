// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Virtual element tree, keyed diffing and the live host surface.
//!
//! The editor core builds [`VNode`] trees describing what each document
//! block should look like, [`diff`]s them against the previously rendered
//! tree, and applies the resulting [`Patch`] list to a [`PageDom`] — an
//! in-process element arena standing in for the platform's contenteditable
//! surface. The `PageDom` also carries the platform-level text selection
//! ([`NativeRange`]) and focus state that the editor's selection bridge
//! reads and writes.

mod diff;
mod host;
mod patch;
mod props;
mod vnode;

pub use crate::diff::diff;
pub use crate::host::HostElement;
pub use crate::host::HostNode;
pub use crate::host::NativeRange;
pub use crate::host::NodeId;
pub use crate::host::PageDom;
pub use crate::patch::apply_patches;
pub use crate::patch::materialize;
pub use crate::patch::Patch;
pub use crate::props::HandlerId;
pub use crate::props::PropValue;
pub use crate::props::StyleMap;
pub use crate::props::VProps;
pub use crate::vnode::VComponent;
pub use crate::vnode::VElement;
pub use crate::vnode::VNode;
