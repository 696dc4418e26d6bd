// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Viewport-windowed rendering for large documents.
//!
//! Once the flattened document reaches the threshold, only the root
//! blocks intersecting the viewport (plus a buffer each side) are
//! rendered; two inert spacer elements stand in for the omitted heights
//! so the scroll geometry is preserved. Heights come from the host's
//! measurements after each render, with an estimate for blocks it has
//! not measured yet.

use std::time::Duration;

/// Windowed rendering tunables.
#[derive(Clone, Copy, Debug)]
pub struct WindowConfig {
    /// Flattened block count at which windowing switches on.
    pub threshold: usize,
    /// Extra blocks rendered above and below the visible range.
    pub buffer: usize,
    /// Height assumed for blocks the host has not measured.
    pub estimated_height: f64,
    /// Minimum gap between handled scroll events.
    pub scroll_throttle: Duration,
    /// Settle time before a resize is applied.
    pub resize_debounce: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            threshold: 50,
            buffer: 5,
            estimated_height: 36.0,
            scroll_throttle: Duration::from_millis(16),
            resize_debounce: Duration::from_millis(150),
        }
    }
}

/// The host's scroll viewport over the editor container.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

/// The computed root-block window: `[start, end)` plus spacer heights for
/// what was left out.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowPlan {
    pub start: usize,
    pub end: usize,
    pub top_spacer: f64,
    pub bottom_spacer: f64,
}

impl WindowPlan {
    /// A plan that renders everything (no spacers).
    pub fn full(len: usize) -> Self {
        Self {
            start: 0,
            end: len,
            top_spacer: 0.0,
            bottom_spacer: 0.0,
        }
    }

    pub fn is_windowed(&self, len: usize) -> bool {
        self.start > 0 || self.end < len
    }
}

/// Compute the visible index range over root blocks with the given
/// per-block heights.
pub fn plan(heights: &[f64], viewport: &Viewport, buffer: usize) -> WindowPlan {
    if heights.is_empty() {
        return WindowPlan::full(0);
    }
    let viewport_top = viewport.scroll_top.max(0.0);
    let viewport_bottom = viewport_top + viewport.height.max(0.0);

    let mut first_visible = heights.len() - 1;
    let mut last_visible = 0usize;
    let mut cursor = 0.0;
    for (index, height) in heights.iter().enumerate() {
        let top = cursor;
        let bottom = cursor + height;
        if bottom > viewport_top && top < viewport_bottom {
            first_visible = first_visible.min(index);
            last_visible = last_visible.max(index);
        }
        cursor = bottom;
    }
    if last_visible < first_visible {
        // Scrolled past the end; keep the tail visible.
        first_visible = heights.len() - 1;
        last_visible = heights.len() - 1;
    }

    let start = first_visible.saturating_sub(buffer);
    let end = (last_visible + buffer + 1).min(heights.len());
    WindowPlan {
        start,
        end,
        top_spacer: heights[..start].iter().sum(),
        bottom_spacer: heights[end..].iter().sum(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn uniform(count: usize, height: f64) -> Vec<f64> {
        vec![height; count]
    }

    #[test]
    fn a_small_viewport_windows_the_middle() {
        let heights = uniform(100, 40.0);
        let viewport = Viewport {
            scroll_top: 2000.0,
            height: 400.0,
        };
        let plan = plan(&heights, &viewport, 5);
        // Visible rows are 50..60; the buffer widens that by 5 each way.
        assert_eq!(plan.start, 45);
        assert_eq!(plan.end, 65);
        assert!(plan.is_windowed(heights.len()));
    }

    #[test]
    fn spacers_preserve_the_scroll_height() {
        let heights = uniform(100, 40.0);
        let viewport = Viewport {
            scroll_top: 2000.0,
            height: 400.0,
        };
        let plan = plan(&heights, &viewport, 5);
        let rendered: f64 = heights[plan.start..plan.end].iter().sum();
        let total: f64 = heights.iter().sum();
        assert!((plan.top_spacer + rendered + plan.bottom_spacer - total).abs() < f64::EPSILON);
    }

    #[test]
    fn the_top_of_the_document_has_no_top_spacer() {
        let heights = uniform(100, 40.0);
        let viewport = Viewport {
            scroll_top: 0.0,
            height: 400.0,
        };
        let plan = plan(&heights, &viewport, 5);
        assert_eq!(plan.start, 0);
        assert_eq!(plan.top_spacer, 0.0);
        assert!(plan.end >= 10);
    }

    #[test]
    fn scrolling_past_the_end_clamps_to_the_tail() {
        let heights = uniform(10, 40.0);
        let viewport = Viewport {
            scroll_top: 10_000.0,
            height: 400.0,
        };
        let plan = plan(&heights, &viewport, 2);
        assert_eq!(plan.end, 10);
        assert!(plan.start >= 7);
    }

    #[test]
    fn uneven_heights_shift_the_window() {
        let mut heights = uniform(20, 40.0);
        heights[0] = 400.0;
        let viewport = Viewport {
            scroll_top: 0.0,
            height: 300.0,
        };
        let plan = plan(&heights, &viewport, 0);
        assert_eq!(plan.start, 0);
        assert_eq!(plan.end, 1);
    }
}
