// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The live host surface: an arena of element, text and line-break nodes.
//!
//! `PageDom` stands in for the platform document the editor renders into.
//! It owns the node arena, the native text-selection range and the focused
//! element — the three platform primitives the compiler and the selection
//! bridge need. Node identity is an arena index wrapped in [`NodeId`];
//! replacing a node keeps its id stable so that pending patches referring
//! to it stay valid.

use std::collections::BTreeMap;

use crate::props::HandlerId;

/// Stable identity of one live node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A live node: an element with attributes and children, a text run, or a
/// line break.
#[derive(Clone, Debug, PartialEq)]
pub enum HostNode {
    Element(HostElement),
    Text(String),
    Br,
}

/// A live element.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct HostElement {
    pub tag: String,
    attrs: BTreeMap<String, String>,
    handlers: BTreeMap<String, HandlerId>,
    children: Vec<NodeId>,
}

impl HostElement {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&String, &String)> {
        self.attrs.iter()
    }

    pub fn handler(&self, event: &str) -> Option<HandlerId> {
        self.handlers.get(event).copied()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A native selection range: two (node, offset) endpoints in the order the
/// user created them. Offsets index `char`s within a text node, or child
/// positions within an element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NativeRange {
    pub anchor: (NodeId, usize),
    pub focus: (NodeId, usize),
}

impl NativeRange {
    pub fn caret(node: NodeId, offset: usize) -> Self {
        Self {
            anchor: (node, offset),
            focus: (node, offset),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

enum Slot {
    Occupied { node: HostNode, parent: Option<NodeId> },
    Free,
}

/// The live page: node arena plus selection and focus state.
pub struct PageDom {
    slots: Vec<Slot>,
    root: NodeId,
    selection: Option<NativeRange>,
    focused: Option<NodeId>,
}

impl Default for PageDom {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDom {
    pub fn new() -> Self {
        let mut page = Self {
            slots: Vec::new(),
            root: NodeId(0),
            selection: None,
            focused: None,
        };
        page.root = page.alloc(HostNode::Element(HostElement::new("body")), None);
        page
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ─── Node creation ──────────────────────────────────────────────────

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(HostNode::Element(HostElement::new(tag)), None)
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(HostNode::Text(content.into()), None)
    }

    pub fn create_br(&mut self) -> NodeId {
        self.alloc(HostNode::Br, None)
    }

    fn alloc(&mut self, node: HostNode, parent: Option<NodeId>) -> NodeId {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if matches!(slot, Slot::Free) {
                *slot = Slot::Occupied { node, parent };
                return NodeId(index);
            }
        }
        self.slots.push(Slot::Occupied { node, parent });
        NodeId(self.slots.len() - 1)
    }

    // ─── Lookup ─────────────────────────────────────────────────────────

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Slot::Occupied { .. }))
    }

    pub fn node(&self, id: NodeId) -> Option<&HostNode> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied { node, .. }) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut HostNode> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Occupied { node, .. }) => Some(node),
            _ => None,
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&HostElement> {
        match self.node(id) {
            Some(HostNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut HostElement> {
        match self.node_mut(id) {
            Some(HostNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied { parent, .. }) => *parent,
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id).map(HostElement::children).unwrap_or(&[])
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id), Some(HostNode::Text(_)))
    }

    pub fn is_br(&self, id: NodeId) -> bool {
        matches!(self.node(id), Some(HostNode::Br))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Some(HostNode::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    // ─── Tree mutation ──────────────────────────────────────────────────

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `child` at `index` under `parent`, detaching it from any
    /// previous parent first. Out-of-range indexes clamp to the end.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            log::warn!("insert_child on missing node; skipping");
            return;
        }
        self.detach(child);
        let Some(el) = self.element_mut(parent) else {
            log::warn!("insert_child: parent {parent:?} is not an element");
            return;
        };
        let index = index.min(el.children.len());
        el.children.insert(index, child);
        if let Some(Slot::Occupied { parent: p, .. }) = self.slots.get_mut(child.0) {
            *p = Some(parent);
        }
    }

    /// Reposition an existing child of `parent` to `index`. No-op when the
    /// node is already there or is not a child of `parent`.
    pub fn move_child(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let children = self.children(parent);
        let Some(current) = children.iter().position(|c| *c == child) else {
            return;
        };
        let index = index.min(children.len().saturating_sub(1));
        if current == index {
            return;
        }
        let Some(el) = self.element_mut(parent) else {
            return;
        };
        el.children.remove(current);
        el.children.insert(index, child);
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(el) = self.element_mut(parent) {
            el.children.retain(|c| *c != child);
        }
        if let Some(Slot::Occupied { parent: p, .. }) = self.slots.get_mut(child.0) {
            *p = None;
        }
    }

    /// Remove a node and its whole subtree, releasing their ids. Selection
    /// and focus referring into the removed subtree are dropped.
    pub fn remove_node(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);
        self.free_subtree(id);
        if let Some(range) = self.selection {
            if !self.contains(range.anchor.0) || !self.contains(range.focus.0) {
                self.selection = None;
            }
        }
        if let Some(focused) = self.focused {
            if !self.contains(focused) {
                self.focused = None;
            }
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.free_subtree(child);
        }
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = Slot::Free;
        }
    }

    /// Overwrite the node stored at `id` in place, freeing its old subtree.
    /// The id stays valid, so patches queued against it keep working.
    pub fn replace_in_place(&mut self, id: NodeId, node: HostNode) {
        if !self.contains(id) {
            log::warn!("replace_in_place on missing node {id:?}");
            return;
        }
        let children = self.children(id).to_vec();
        for child in children {
            self.free_subtree(child);
        }
        if let Some(Slot::Occupied { node: slot_node, .. }) = self.slots.get_mut(id.0) {
            *slot_node = node;
        }
        if let Some(range) = self.selection {
            if !self.contains(range.anchor.0) || !self.contains(range.focus.0) {
                self.selection = None;
            }
        }
    }

    // ─── Attributes & handlers ──────────────────────────────────────────

    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.insert(name.into(), value.into());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.remove(name);
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn set_handler(&mut self, id: NodeId, event: impl Into<String>, handler: HandlerId) {
        if let Some(el) = self.element_mut(id) {
            el.handlers.insert(event.into(), handler);
        }
    }

    pub fn remove_handler(&mut self, id: NodeId, event: &str) {
        if let Some(el) = self.element_mut(id) {
            el.handlers.remove(event);
        }
    }

    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) {
        if let Some(HostNode::Text(t)) = self.node_mut(id) {
            *t = content.into();
        }
    }

    // ─── Queries ────────────────────────────────────────────────────────

    /// All element ids in tree (pre-)order, root included.
    pub fn elements_in_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(self.root, &mut out);
        out
    }

    fn collect_elements(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.element(id).is_some() {
            out.push(id);
        }
        for child in self.children(id).to_vec() {
            self.collect_elements(child, out);
        }
    }

    /// First element carrying `attr = value`, in tree order.
    pub fn find_by_attr(&self, attr: &str, value: &str) -> Option<NodeId> {
        self.elements_in_order()
            .into_iter()
            .find(|id| self.attr(*id, attr) == Some(value))
    }

    /// All elements carrying `attr` (any value), in tree order.
    pub fn query_attr(&self, attr: &str) -> Vec<NodeId> {
        self.elements_in_order()
            .into_iter()
            .filter(|id| self.attr(*id, attr).is_some())
            .collect()
    }

    /// Nearest ancestor-or-self element carrying `attr`.
    pub fn ancestor_with_attr(&self, start: NodeId, attr: &str) -> Option<NodeId> {
        let mut current = Some(start);
        while let Some(id) = current {
            if self.attr(id, attr).is_some() {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// First descendant-or-self element for which `attr = value`.
    pub fn descendant_with_attr(&self, root: NodeId, attr: &str, value: &str) -> Option<NodeId> {
        if self.attr(root, attr) == Some(value) {
            return Some(root);
        }
        for child in self.children(root).to_vec() {
            if let Some(found) = self.descendant_with_attr(child, attr, value) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text content of a subtree, ignoring line breaks — the
    /// platform `textContent` reading.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, false, &mut out);
        out
    }

    /// Text content with each line break contributing one `\n` — except a
    /// trailing placeholder break, which contributes nothing. This is the
    /// newline-preserving reading used for code blocks and offset walking.
    pub fn rendered_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, true, &mut out);
        if out.ends_with('\n') && self.last_inline_is_br(id) {
            out.pop();
        }
        out
    }

    fn collect_text(&self, id: NodeId, brs_as_newlines: bool, out: &mut String) {
        match self.node(id) {
            Some(HostNode::Text(t)) => out.push_str(t),
            Some(HostNode::Br) => {
                if brs_as_newlines {
                    out.push('\n');
                }
            }
            Some(HostNode::Element(_)) => {
                for child in self.children(id).to_vec() {
                    self.collect_text(child, brs_as_newlines, out);
                }
            }
            None => {}
        }
    }

    /// Whether the last text-or-break node of the subtree is a line break.
    /// Browsers keep a placeholder `<br>` at the end of editable elements;
    /// offset arithmetic must not count it.
    pub fn last_inline_is_br(&self, id: NodeId) -> bool {
        match self.last_inline(id) {
            Some(last) => self.is_br(last),
            None => false,
        }
    }

    /// The last text-or-break node of the subtree, in document order.
    pub fn last_inline_node(&self, id: NodeId) -> Option<NodeId> {
        self.last_inline(id)
    }

    fn last_inline(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id) {
            Some(HostNode::Text(_)) | Some(HostNode::Br) => Some(id),
            Some(HostNode::Element(_)) => self
                .children(id)
                .iter()
                .rev()
                .find_map(|child| self.last_inline(*child)),
            None => None,
        }
    }

    /// Document-order comparison: does `a` come before `b`?
    pub fn is_before(&self, a: NodeId, b: NodeId) -> bool {
        self.path_from_root(a) < self.path_from_root(b)
    }

    fn path_from_root(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let index = self
                .children(parent)
                .iter()
                .position(|c| *c == current)
                .unwrap_or(0);
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    // ─── Selection & focus ──────────────────────────────────────────────

    pub fn selection(&self) -> Option<NativeRange> {
        self.selection
    }

    /// Set the native range. Endpoints on missing nodes are rejected, which
    /// is what a platform throws as an invalid-range error.
    pub fn set_selection(&mut self, range: NativeRange) -> bool {
        if !self.contains(range.anchor.0) || !self.contains(range.focus.0) {
            log::warn!("set_selection on detached nodes; range not applied");
            return false;
        }
        self.selection = Some(range);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Whether the current range runs focus-before-anchor in document
    /// order (a backward selection).
    pub fn selection_is_backward(&self) -> bool {
        match self.selection {
            Some(range) if !range.is_collapsed() => {
                let (a, f) = (range.anchor, range.focus);
                if a.0 == f.0 {
                    f.1 < a.1
                } else {
                    self.is_before(f.0, a.0)
                }
            }
            _ => false,
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn set_focus(&mut self, id: Option<NodeId>) {
        match id {
            Some(id) if !self.contains(id) => {
                log::warn!("set_focus on missing node {id:?}");
            }
            other => self.focused = other,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_page() -> (PageDom, NodeId, NodeId, NodeId) {
        let mut page = PageDom::new();
        let block = page.create_element("div");
        page.set_attr(block, "data-block-id", "b1");
        let editable = page.create_element("p");
        page.set_attr(editable, "contenteditable", "true");
        let text = page.create_text("hello");
        let root = page.root();
        page.append_child(root, block);
        page.append_child(block, editable);
        page.append_child(editable, text);
        (page, block, editable, text)
    }

    #[test]
    fn append_and_lookup_children() {
        let (page, block, editable, text) = sample_page();
        assert_eq!(page.children(block), &[editable]);
        assert_eq!(page.children(editable), &[text]);
        assert_eq!(page.parent(text), Some(editable));
    }

    #[test]
    fn remove_node_frees_the_subtree_and_clears_selection() {
        let (mut page, block, _editable, text) = sample_page();
        page.set_selection(NativeRange::caret(text, 3));
        page.remove_node(block);
        assert!(!page.contains(block));
        assert!(!page.contains(text));
        assert_eq!(page.selection(), None);
    }

    #[test]
    fn replace_in_place_keeps_the_id_valid() {
        let (mut page, _block, editable, text) = sample_page();
        page.replace_in_place(editable, HostNode::Element(HostElement::new("h1")));
        assert_eq!(page.tag(editable), Some("h1"));
        assert!(page.children(editable).is_empty());
        assert!(!page.contains(text));
    }

    #[test]
    fn ancestor_with_attr_walks_up_to_the_block() {
        let (page, block, _editable, text) = sample_page();
        assert_eq!(page.ancestor_with_attr(text, "data-block-id"), Some(block));
    }

    #[test]
    fn rendered_text_counts_brs_except_a_trailing_placeholder() {
        let mut page = PageDom::new();
        let el = page.create_element("pre");
        let t1 = page.create_text("line one");
        let br = page.create_br();
        let t2 = page.create_text("line two");
        let placeholder = page.create_br();
        for id in [t1, br, t2, placeholder] {
            page.append_child(el, id);
        }
        assert_eq!(page.rendered_text(el), "line one\nline two");
        assert_eq!(page.text_content(el), "line oneline two");
    }

    #[test]
    fn trailing_br_after_another_br_keeps_one_newline() {
        let mut page = PageDom::new();
        let el = page.create_element("p");
        let t = page.create_text("a");
        let br1 = page.create_br();
        let br2 = page.create_br();
        for id in [t, br1, br2] {
            page.append_child(el, id);
        }
        assert_eq!(page.rendered_text(el), "a\n");
    }

    #[test]
    fn backward_selection_is_detected_by_document_order() {
        let (mut page, _block, editable, text) = sample_page();
        let other = page.create_text("tail");
        page.append_child(editable, other);
        page.set_selection(NativeRange {
            anchor: (other, 1),
            focus: (text, 0),
        });
        assert!(page.selection_is_backward());
    }

    #[test]
    fn move_child_repositions_in_place() {
        let mut page = PageDom::new();
        let parent = page.create_element("div");
        let a = page.create_element("p");
        let b = page.create_element("p");
        let c = page.create_element("p");
        for id in [a, b, c] {
            page.append_child(parent, id);
        }
        page.move_child(parent, c, 0);
        assert_eq!(page.children(parent), &[c, a, b]);
    }
}
