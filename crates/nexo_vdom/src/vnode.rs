// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Virtual nodes: immutable descriptions of host subtrees.

use std::fmt;
use std::rc::Rc;

use crate::props::VProps;

/// A virtual description of one host node.
#[derive(Clone, PartialEq, Default)]
pub enum VNode {
    Element(VElement),
    Text(String),
    /// Deferred subtree: expanded by calling the component function during
    /// diffing and materialisation.
    Component(VComponent),
    /// Renders to nothing. Diffing against `Null` removes the live node.
    #[default]
    Null,
}

impl VNode {
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text(content.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, VNode::Null)
    }

    /// The reconciliation key, if the node carries one.
    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element(el) => el.key.as_deref(),
            VNode::Component(c) => c.key.as_deref(),
            VNode::Text(_) | VNode::Null => None,
        }
    }

    /// Resolve a component node to the tree its function produces.
    /// Non-component nodes resolve to themselves.
    pub fn expand(&self) -> VNode {
        match self {
            VNode::Component(c) => {
                let mut node = (c.render)(&c.props);
                // The component's key wins over whatever the function set,
                // so keyed matching stays stable across expansions.
                if let (Some(key), VNode::Element(el)) = (&c.key, &mut node) {
                    el.key = Some(key.clone());
                }
                node
            }
            other => other.clone(),
        }
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNode::Element(el) => el.fmt(f),
            VNode::Text(t) => write!(f, "Text({t:?})"),
            VNode::Component(c) => write!(f, "Component(key: {:?})", c.key),
            VNode::Null => write!(f, "Null"),
        }
    }
}

/// A virtual element: tag, props, ordered children and an optional
/// reconciliation key.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct VElement {
    pub tag: String,
    pub key: Option<String>,
    pub props: VProps,
    pub children: Vec<VNode>,
}

impl VElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            key: None,
            props: VProps::new(),
            children: Vec::new(),
        }
    }

    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<crate::PropValue>) -> Self {
        self.props.set(name, value);
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn into_node(self) -> VNode {
        VNode::Element(self)
    }
}

/// A component node: a function from props to a virtual tree.
#[derive(Clone)]
pub struct VComponent {
    pub key: Option<String>,
    pub props: VProps,
    pub render: Rc<dyn Fn(&VProps) -> VNode>,
}

impl VComponent {
    pub fn new(render: Rc<dyn Fn(&VProps) -> VNode>, props: VProps, key: Option<String>) -> Self {
        Self { key, props, render }
    }
}

impl PartialEq for VComponent {
    fn eq(&self, other: &Self) -> bool {
        // Same function, same props, same key; pointer identity stands
        // in for function equality.
        Rc::ptr_eq(&self.render, &other.render)
            && self.props == other.props
            && self.key == other.key
    }
}

impl fmt::Debug for VComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VComponent")
            .field("key", &self.key)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn element_builder_collects_props_and_children() {
        let el = VElement::new("p")
            .keyed("b1")
            .prop("contentEditable", true)
            .child(VNode::text("hello"));
        assert_eq!(el.tag, "p");
        assert_eq!(el.key.as_deref(), Some("b1"));
        assert_eq!(el.children.len(), 1);
    }

    #[test]
    fn component_expansion_applies_the_component_key() {
        let component = VComponent::new(
            Rc::new(|_: &VProps| VElement::new("div").into_node()),
            VProps::new(),
            Some("k7".to_owned()),
        );
        let expanded = VNode::Component(component).expand();
        assert_eq!(expanded.key(), Some("k7"));
    }

    #[test]
    fn components_compare_by_function_identity_and_props() {
        let render: Rc<dyn Fn(&VProps) -> VNode> =
            Rc::new(|_: &VProps| VNode::Null);
        let a = VComponent::new(render.clone(), VProps::new(), None);
        let b = VComponent::new(render, VProps::new(), None);
        assert_eq!(a, b);
    }
}
