// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Patches: imperative edits to the live page derived from diffing.
//!
//! `apply_patches` is forgiving: a patch whose target node has vanished
//! (because an earlier patch replaced a subtree, or the host raced us) is
//! logged and skipped rather than failing the whole batch.

use crate::host::{HostElement, HostNode, NodeId, PageDom};
use crate::props::{PropValue, VProps};
use crate::vnode::VNode;

/// One imperative edit to the live page.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    /// Materialise `node` and insert it under `parent` at `index`.
    Create {
        parent: NodeId,
        index: usize,
        node: VNode,
    },
    /// Remove the node and its subtree.
    Remove { node: NodeId },
    /// Swap the node for a freshly materialised tree, keeping its id.
    Replace { node: NodeId, with: VNode },
    /// Apply prop additions/updates and removals.
    Update {
        node: NodeId,
        set: Vec<(String, PropValue)>,
        unset: Vec<String>,
    },
    /// Rewrite a text node's content.
    SetText { node: NodeId, text: String },
    /// Move an existing child of `parent` to `index`.
    Reorder {
        parent: NodeId,
        node: NodeId,
        index: usize,
    },
}

/// Build the live subtree described by `node`. Returns `None` for
/// [`VNode::Null`].
pub fn materialize(page: &mut PageDom, node: &VNode) -> Option<NodeId> {
    match node.expand() {
        VNode::Null | VNode::Component(_) => None,
        VNode::Text(content) => Some(page.create_text(content)),
        VNode::Element(el) => {
            if el.tag == "br" {
                return Some(page.create_br());
            }
            let id = page.create_element(el.tag.clone());
            apply_props(page, id, el.props.iter().map(|(k, v)| (k.clone(), v.clone())), []);
            for child in &el.children {
                if let Some(child_id) = materialize(page, child) {
                    page.append_child(id, child_id);
                }
            }
            Some(id)
        }
    }
}

/// Apply a patch list in order.
pub fn apply_patches(page: &mut PageDom, patches: Vec<Patch>) {
    for patch in patches {
        apply_patch(page, patch);
    }
}

fn apply_patch(page: &mut PageDom, patch: Patch) {
    match patch {
        Patch::Create {
            parent,
            index,
            node,
        } => {
            if !page.contains(parent) {
                log::warn!("create patch against missing parent; skipped");
                return;
            }
            if let Some(id) = materialize(page, &node) {
                page.insert_child(parent, index, id);
            }
        }
        Patch::Remove { node } => {
            page.remove_node(node);
        }
        Patch::Replace { node, with } => {
            replace_node(page, node, &with);
        }
        Patch::Update { node, set, unset } => {
            if !page.contains(node) {
                log::warn!("update patch against missing node; skipped");
                return;
            }
            apply_props(page, node, set, unset);
        }
        Patch::SetText { node, text } => {
            if !page.contains(node) {
                log::warn!("text patch against missing node; skipped");
                return;
            }
            page.set_text(node, text);
        }
        Patch::Reorder {
            parent,
            node,
            index,
        } => {
            page.move_child(parent, node, index);
        }
    }
}

fn replace_node(page: &mut PageDom, id: NodeId, with: &VNode) {
    match with.expand() {
        VNode::Null | VNode::Component(_) => page.remove_node(id),
        VNode::Text(content) => page.replace_in_place(id, HostNode::Text(content)),
        VNode::Element(el) => {
            if el.tag == "br" {
                page.replace_in_place(id, HostNode::Br);
                return;
            }
            page.replace_in_place(id, HostNode::Element(HostElement::new(el.tag.clone())));
            apply_props(page, id, el.props.iter().map(|(k, v)| (k.clone(), v.clone())), []);
            for child in &el.children {
                if let Some(child_id) = materialize(page, child) {
                    page.append_child(id, child_id);
                }
            }
        }
    }
}

/// Apply prop sets/unsets to a live element, honouring the platform
/// semantics of `className`, `style`, `contentEditable` and `on*` handler
/// props; everything else falls back to a plain attribute write.
pub(crate) fn apply_props(
    page: &mut PageDom,
    id: NodeId,
    set: impl IntoIterator<Item = (String, PropValue)>,
    unset: impl IntoIterator<Item = String>,
) {
    for (name, value) in set {
        match (&*name, &value) {
            (event, PropValue::Handler(handler)) if event.starts_with("on") => {
                page.set_handler(id, event[2..].to_ascii_lowercase(), *handler);
            }
            ("className", _) => {
                if let Some(v) = value.as_attr_string() {
                    page.set_attr(id, "class", v);
                }
            }
            ("contentEditable", _) => {
                if let Some(v) = value.as_attr_string() {
                    page.set_attr(id, "contenteditable", v);
                }
            }
            (_, PropValue::Bool(false)) => page.remove_attr(id, &name),
            _ => {
                if let Some(v) = value.as_attr_string() {
                    page.set_attr(id, name, v);
                }
            }
        }
    }
    for name in unset {
        if let Some(event) = name.strip_prefix("on") {
            page.remove_handler(id, &event.to_ascii_lowercase());
        } else if name == "className" {
            page.remove_attr(id, "class");
        } else if name == "contentEditable" {
            page.remove_attr(id, "contenteditable");
        } else {
            page.remove_attr(id, &name);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vnode::VElement;

    #[test]
    fn materialize_builds_elements_text_and_brs() {
        let mut page = PageDom::new();
        let tree = VElement::new("p")
            .prop("className", "nexo-block")
            .child(VNode::text("one"))
            .child(VElement::new("br").into_node())
            .child(VNode::text("two"))
            .into_node();
        let id = materialize(&mut page, &tree).unwrap();
        assert_eq!(page.tag(id), Some("p"));
        assert_eq!(page.attr(id, "class"), Some("nexo-block"));
        assert_eq!(page.rendered_text(id), "one\ntwo");
    }

    #[test]
    fn materialize_skips_null_children() {
        let mut page = PageDom::new();
        let tree = VElement::new("div")
            .child(VNode::Null)
            .child(VNode::text("x"))
            .into_node();
        let id = materialize(&mut page, &tree).unwrap();
        assert_eq!(page.children(id).len(), 1);
    }

    #[test]
    fn replace_patch_keeps_the_node_id() {
        let mut page = PageDom::new();
        let root = page.root();
        let tree = VElement::new("p").child(VNode::text("old")).into_node();
        let id = materialize(&mut page, &tree).unwrap();
        page.append_child(root, id);

        apply_patches(
            &mut page,
            vec![Patch::Replace {
                node: id,
                with: VElement::new("h1").child(VNode::text("new")).into_node(),
            }],
        );
        assert_eq!(page.tag(id), Some("h1"));
        assert_eq!(page.text_content(id), "new");
        assert_eq!(page.children(root), &[id]);
    }

    #[test]
    fn handler_props_are_stored_and_unhooked() {
        let mut page = PageDom::new();
        let id = page.create_element("p");
        apply_props(
            &mut page,
            id,
            [("onInput".to_owned(), PropValue::Handler(7))],
            [],
        );
        assert_eq!(page.element(id).unwrap().handler("input"), Some(7));
        apply_props(&mut page, id, [], ["onInput".to_owned()]);
        assert_eq!(page.element(id).unwrap().handler("input"), None);
    }

    #[test]
    fn false_bool_props_remove_the_attribute() {
        let mut page = PageDom::new();
        let id = page.create_element("input");
        apply_props(
            &mut page,
            id,
            [("checked".to_owned(), PropValue::Bool(true))],
            [],
        );
        assert_eq!(page.attr(id, "checked"), Some("true"));
        apply_props(
            &mut page,
            id,
            [("checked".to_owned(), PropValue::Bool(false))],
            [],
        );
        assert_eq!(page.attr(id, "checked"), None);
    }

    #[test]
    fn missing_targets_are_skipped_without_panicking() {
        let mut page = PageDom::new();
        let id = page.create_element("p");
        page.remove_node(id);
        apply_patches(
            &mut page,
            vec![Patch::SetText {
                node: id,
                text: "gone".to_owned(),
            }],
        );
    }
}
