// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The compiler: owns the live page, reconciles it with the document, and
//! restores the caret afterwards.
//!
//! Render pipeline, per frame:
//!
//! 1. Capture the current native selection and focused block.
//! 2. Build a virtual tree over the root blocks (windowed when the
//!    document is large), consulting the render cache per block.
//! 3. First render materialises the tree; later renders diff and patch.
//! 4. Rebuild the block-id → element map from `data-block-id`.
//! 5. Clear the dirty tracker.
//! 6. Re-apply the saved selection through the bridge and re-focus.
//!
//! `schedule_render` only sets a flag; the embedding host pumps `tick`
//! once per animation frame, which collapses any number of mutations into
//! one render. While IME composition is active the render is deferred
//! wholesale so the composed block is never touched mid-composition.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use nexo_vdom::{apply_patches, diff, materialize, NodeId, PageDom, VElement, VNode};

use crate::block::{Block, BlockId};
use crate::bridge::SelectionBridge;
use crate::document::Document;
use crate::event::{EditorEvent, EventBus, SubscriptionId};
use crate::render::cache::RenderCache;
use crate::render::dirty::DirtyTracker;
use crate::render::templates::{numbered_indices, RenderContext, TemplateRegistry};
use crate::render::window::{plan, Viewport, WindowConfig, WindowPlan};
use crate::selection::Selection;

/// State shared with the event-bus subscriptions: they run without access
/// to the compiler itself and leave signals for the next tick.
#[derive(Default)]
pub(crate) struct RenderSignals {
    pending: Cell<bool>,
    force_full: Cell<bool>,
    tracker: RefCell<DirtyTracker>,
    selected: RefCell<Vec<BlockId>>,
    focused: RefCell<Option<BlockId>>,
}

pub struct Compiler {
    page: PageDom,
    container: Option<NodeId>,
    content_root: Option<NodeId>,
    vtree: Option<VNode>,
    cache: RenderCache,
    templates: TemplateRegistry,
    bridge: SelectionBridge,
    block_elements: HashMap<BlockId, NodeId>,
    signals: Rc<RenderSignals>,
    bus: Option<Rc<EventBus>>,
    subscriptions: Vec<SubscriptionId>,
    composing: Option<BlockId>,
    heights: HashMap<BlockId, f64>,
    viewport: Option<Viewport>,
    window_cfg: WindowConfig,
    last_scroll: Option<Instant>,
    pending_resize: Option<(Instant, Viewport)>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}

impl Compiler {
    pub fn new(window_cfg: WindowConfig) -> Self {
        Self {
            page: PageDom::new(),
            container: None,
            content_root: None,
            vtree: None,
            cache: RenderCache::default(),
            templates: TemplateRegistry::default(),
            bridge: SelectionBridge::new(),
            block_elements: HashMap::new(),
            signals: Rc::new(RenderSignals::default()),
            bus: None,
            subscriptions: Vec::new(),
            composing: None,
            heights: HashMap::new(),
            viewport: None,
            window_cfg,
            last_scroll: None,
            pending_resize: None,
        }
    }

    /// Attach to the page and the event bus. Creates the editor container
    /// and wires the subscriptions that schedule renders.
    pub fn init(&mut self, bus: Rc<EventBus>) {
        let root = self.page.root();
        let container = self.page.create_element("div");
        self.page.set_attr(container, "class", "nexo-editor");
        self.page.append_child(root, container);
        self.container = Some(container);

        let signals = self.signals.clone();
        let subscription = bus.on_any(move |envelope| {
            match &envelope.event {
                EditorEvent::DocumentChanged { .. } => {
                    signals.pending.set(true);
                }
                EditorEvent::BlockCreated { .. }
                | EditorEvent::BlockUpdated { .. }
                | EditorEvent::BlockDeleted { .. }
                | EditorEvent::BlockMoved { .. } => {
                    signals.tracker.borrow_mut().mark_event(envelope);
                    signals.pending.set(true);
                }
                EditorEvent::SelectionChanged { selection } => {
                    let mut selected = signals.selected.borrow_mut();
                    *selected = match selection {
                        Selection::BlockSet { block_ids } => block_ids.clone(),
                        _ => Vec::new(),
                    };
                    signals.pending.set(true);
                }
                EditorEvent::FocusChanged { block_id, .. } => {
                    *signals.focused.borrow_mut() = block_id.clone();
                    signals.pending.set(true);
                }
                EditorEvent::CommandUndone { .. } | EditorEvent::CommandRedone { .. } => {
                    // Height measurements are stale after a structural
                    // rewind; force the next render to start from scratch.
                    signals.force_full.set(true);
                    signals.pending.set(true);
                }
                EditorEvent::CommandExecuted { .. } => {}
            }
        });
        self.subscriptions.push(subscription);
        self.bus = Some(bus);
    }

    // ─── Scheduling ─────────────────────────────────────────────────────

    /// Ask for a render on the next tick. Repeat calls coalesce.
    pub fn schedule_render(&self) {
        self.signals.pending.set(true);
    }

    pub fn has_pending_render(&self) -> bool {
        self.signals.pending.get() || self.signals.force_full.get()
    }

    /// The host's once-per-animation-frame entry point.
    pub fn tick(&mut self, doc: &Document) {
        if self.container.is_none() {
            return;
        }
        if let Some((since, viewport)) = self.pending_resize {
            if since.elapsed() >= self.window_cfg.resize_debounce {
                self.viewport = Some(viewport);
                self.pending_resize = None;
                self.signals.pending.set(true);
            }
        }
        if !self.has_pending_render() {
            return;
        }
        if self.signals.force_full.get() {
            self.heights.clear();
        }
        self.render(doc);
    }

    // ─── Rendering ──────────────────────────────────────────────────────

    /// Build and reconcile the whole tree now. Prefer `schedule_render` +
    /// `tick`; this is the forced path.
    pub fn render(&mut self, doc: &Document) {
        let Some(container) = self.container else {
            return;
        };
        if self.composing.is_some() {
            // Mid-composition the editable is the platform's; come back
            // once composition ends.
            self.signals.pending.set(true);
            return;
        }

        let saved_selection = self.bridge.read_selection(&self.page, doc);
        let saved_focus = self.signals.focused.borrow().clone();

        let tree = self.build_content(doc);
        match (self.content_root, self.vtree.take()) {
            (Some(live), Some(old_tree)) => {
                let patches = diff(&self.page, &old_tree, &tree, live);
                apply_patches(&mut self.page, patches);
            }
            _ => {
                if let Some(id) = materialize(&mut self.page, &tree) {
                    self.page.append_child(container, id);
                    self.content_root = Some(id);
                }
            }
        }
        self.vtree = Some(tree);

        self.rebuild_block_elements();
        {
            let mut tracker = self.signals.tracker.borrow_mut();
            for id in tracker.deleted_ids() {
                self.cache.invalidate(id);
                self.heights.remove(id);
            }
            tracker.clear();
        }
        self.signals.pending.set(false);
        self.signals.force_full.set(false);

        if let Some(selection) = saved_selection {
            if selection.is_valid(doc) {
                self.bridge.write_selection(&mut self.page, doc, &selection);
            }
        }
        if let Some(focus) = saved_focus {
            if doc.contains(&focus) {
                self.bridge.focus_block(&mut self.page, &focus);
            }
        }
    }

    fn build_content(&mut self, doc: &Document) -> VNode {
        let roots = doc.root_blocks();
        let plan = self.window_plan(doc, &roots);
        let indices = numbered_indices(&roots);

        let mut children: Vec<VNode> = Vec::with_capacity(plan.end - plan.start + 2);
        if plan.top_spacer > 0.0 {
            children.push(spacer("spacer-top", plan.top_spacer));
        }
        for &block in &roots[plan.start..plan.end] {
            let list_index = indices.get(&block.id).copied();
            children.push(self.build_block(doc, block, list_index));
        }
        if plan.bottom_spacer > 0.0 {
            children.push(spacer("spacer-bottom", plan.bottom_spacer));
        }

        VElement::new("div")
            .prop("className", "nexo-editor-content")
            .children(children)
            .into_node()
    }

    fn window_plan(&self, doc: &Document, roots: &[&Block]) -> WindowPlan {
        let flattened_len = doc.flattened_blocks().len();
        let windowable = flattened_len >= self.window_cfg.threshold
            && !self.signals.force_full.get()
            && self.viewport.is_some();
        if !windowable {
            return WindowPlan::full(roots.len());
        }
        let viewport = self.viewport.expect("checked above");
        let heights: Vec<f64> = roots
            .iter()
            .map(|block| {
                self.heights
                    .get(&block.id)
                    .copied()
                    .unwrap_or(self.window_cfg.estimated_height)
            })
            .collect();
        plan(&heights, &viewport, self.window_cfg.buffer)
    }

    fn build_block(&mut self, doc: &Document, block: &Block, list_index: Option<usize>) -> VNode {
        let content = match self.cache.get(block, list_index) {
            Some(node) => node,
            None => {
                let ctx = RenderContext { list_index };
                let node = self.templates.render(block, &ctx);
                self.cache.put(block, list_index, node.clone());
                node
            }
        };

        let focused = self.signals.focused.borrow().as_ref() == Some(&block.id);
        let selected = self.signals.selected.borrow().contains(&block.id);
        let mut class = String::from("nexo-block");
        if focused {
            class.push_str(" nexo-block-focused");
        }
        if selected {
            class.push_str(" nexo-block-selected");
        }

        let mut wrapper = VElement::new("div")
            .keyed(block.id.as_str())
            .prop("className", class)
            .prop("data-block-id", block.id.as_str())
            .prop("data-block-type", block.kind.to_string())
            .child(content);

        let children = doc.children(&block.id);
        if !children.is_empty() {
            let indices = numbered_indices(&children);
            let nodes: Vec<VNode> = children
                .iter()
                .map(|&child| {
                    let list_index = indices.get(&child.id).copied();
                    self.build_block(doc, child, list_index)
                })
                .collect();
            wrapper = wrapper.child(
                VElement::new("div")
                    .prop("className", "nexo-block-children")
                    .children(nodes)
                    .into_node(),
            );
        }
        wrapper.into_node()
    }

    /// Render one block's content through the template registry,
    /// consulting the cache.
    pub fn render_block(&mut self, block: &Block, ctx: &RenderContext) -> VNode {
        match self.cache.get(block, ctx.list_index) {
            Some(node) => node,
            None => {
                let node = self.templates.render(block, ctx);
                self.cache.put(block, ctx.list_index, node.clone());
                node
            }
        }
    }

    /// Targeted refresh of one block: drop its cached content and
    /// reconcile now.
    pub fn update_block(&mut self, doc: &Document, id: &BlockId) {
        self.cache.invalidate(id);
        self.signals
            .tracker
            .borrow_mut()
            .mark(id.clone(), crate::render::DirtyReason::Updated);
        self.render(doc);
    }

    /// Drop a block's live element and cached state. The rendered tree no
    /// longer matches the stored virtual tree afterwards, so the next
    /// render starts from a fresh materialisation.
    pub fn remove_block(&mut self, id: &BlockId) {
        if let Some(element) = self.block_elements.remove(id) {
            self.page.remove_node(element);
        }
        self.cache.invalidate(id);
        self.heights.remove(id);
        if let Some(content_root) = self.content_root.take() {
            self.page.remove_node(content_root);
        }
        self.vtree = None;
        self.signals.pending.set(true);
    }

    fn rebuild_block_elements(&mut self) {
        self.block_elements.clear();
        for element in self.page.query_attr("data-block-id") {
            if let Some(value) = self.page.attr(element, "data-block-id") {
                self.block_elements
                    .insert(BlockId::from(value), element);
            }
        }
    }

    // ─── IME composition ────────────────────────────────────────────────

    pub fn begin_composition(&mut self, block_id: BlockId) {
        self.composing = Some(block_id);
    }

    /// Ends composition and returns the block that was being composed so
    /// the input handler can sync its text.
    pub fn end_composition(&mut self) -> Option<BlockId> {
        let block = self.composing.take();
        self.signals.pending.set(true);
        block
    }

    pub fn is_composing(&self) -> bool {
        self.composing.is_some()
    }

    pub fn composing_block(&self) -> Option<&BlockId> {
        self.composing.as_ref()
    }

    // ─── Viewport & geometry ────────────────────────────────────────────

    /// Record a measured block height (host calls this after layout).
    pub fn record_height(&mut self, id: &BlockId, height: f64) {
        self.heights.insert(id.clone(), height);
    }

    /// Scroll events, throttled: at most one handled per throttle window.
    pub fn handle_scroll(&mut self, scroll_top: f64) {
        if let Some(last) = self.last_scroll {
            if last.elapsed() < self.window_cfg.scroll_throttle {
                return;
            }
        }
        self.last_scroll = Some(Instant::now());
        let height = self.viewport.map(|v| v.height).unwrap_or(0.0);
        self.viewport = Some(Viewport {
            scroll_top,
            height,
        });
        self.signals.pending.set(true);
    }

    /// Resize events, debounced: applied once the size settles.
    pub fn handle_resize(&mut self, viewport: Viewport) {
        if self.viewport.is_none() {
            self.viewport = Some(viewport);
            self.signals.pending.set(true);
        } else {
            self.pending_resize = Some((Instant::now(), viewport));
        }
    }

    #[cfg(test)]
    pub(crate) fn expire_resize_debounce(&mut self) {
        if let Some((since, _)) = &mut self.pending_resize {
            *since = Instant::now() - self.window_cfg.resize_debounce;
        }
    }

    // ─── Introspection & focus ──────────────────────────────────────────

    pub fn get_container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn get_block_element(&self, id: &BlockId) -> Option<NodeId> {
        self.block_elements.get(id).copied()
    }

    pub fn page(&self) -> &PageDom {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut PageDom {
        &mut self.page
    }

    pub fn bridge(&self) -> &SelectionBridge {
        &self.bridge
    }

    /// Focus a block's editable element and mark it focused for the next
    /// render's classes.
    pub fn focus(&mut self, id: &BlockId) {
        self.bridge.focus_block(&mut self.page, id);
        *self.signals.focused.borrow_mut() = Some(id.clone());
        self.signals.pending.set(true);
    }

    /// Restore the caret to `(block, offset)` through the bridge.
    pub fn set_cursor(&mut self, doc: &Document, id: &BlockId, offset: usize) {
        self.bridge.set_cursor(&mut self.page, doc, id, offset);
        *self.signals.focused.borrow_mut() = Some(id.clone());
    }

    /// Apply an abstract selection to the native range.
    pub fn write_selection(&mut self, doc: &Document, selection: &Selection) {
        self.bridge.write_selection(&mut self.page, doc, selection);
    }

    /// Read the native range back as an abstract selection.
    pub fn read_selection(&self, doc: &Document) -> Option<Selection> {
        self.bridge.read_selection(&self.page, doc)
    }

    /// The block text as the platform currently renders it: code blocks
    /// read the newline-preserving text, everything else plain content.
    pub fn read_block_text(&self, doc: &Document, id: &BlockId) -> Option<String> {
        let block = doc.get_block(id)?;
        let element = self.get_block_element(id)?;
        let editable = crate::bridge::editable_of(&self.page, element)?;
        Some(if block.kind == crate::block::BlockType::Code {
            self.page.rendered_text(editable)
        } else {
            self.page.text_content(editable)
        })
    }

    pub(crate) fn tracker(&self) -> std::cell::Ref<'_, DirtyTracker> {
        self.signals.tracker.borrow()
    }

    // ─── Teardown ───────────────────────────────────────────────────────

    /// Remove listeners, clear caches and detach the container. A pending
    /// render firing afterwards is a no-op.
    pub fn destroy(&mut self) {
        if let Some(bus) = &self.bus {
            for subscription in self.subscriptions.drain(..) {
                bus.off(subscription);
            }
        }
        self.bus = None;
        if let Some(container) = self.container.take() {
            self.page.remove_node(container);
        }
        self.content_root = None;
        self.vtree = None;
        self.cache.clear();
        self.block_elements.clear();
        self.heights.clear();
        self.signals.pending.set(false);
        self.signals.force_full.set(false);
        self.signals.tracker.borrow_mut().clear();
    }
}

fn spacer(key: &str, height: f64) -> VNode {
    let mut style = nexo_vdom::StyleMap::new();
    style.insert("height".to_owned(), format!("{height:.0}px"));
    VElement::new("div")
        .keyed(key)
        .prop("className", "nexo-window-spacer")
        .prop("contentEditable", "false")
        .prop("style", nexo_vdom::PropValue::Style(style))
        .into_node()
}
