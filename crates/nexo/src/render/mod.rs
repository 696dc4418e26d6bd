// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The incremental renderer: virtual-tree compilation, per-block
//! memoisation, dirty tracking and viewport windowing.

mod cache;
mod compiler;
mod dirty;
mod templates;
mod window;

pub use cache::{RenderCache, DEFAULT_CACHE_CAPACITY};
pub use compiler::Compiler;
pub use dirty::{DirtyReason, DirtyTracker};
pub use templates::{numbered_indices, RenderContext, TemplateFn, TemplateRegistry};
pub use window::{plan, Viewport, WindowConfig, WindowPlan};
