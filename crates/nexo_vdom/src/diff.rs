// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Keyed tree diffing.
//!
//! `diff` compares the previously rendered virtual tree with a fresh one
//! and produces the minimal [`Patch`] list that reconciles the live page:
//!
//! 1. Matching null nodes produce nothing.
//! 2. A node appearing where none existed is created.
//! 3. A node disappearing is removed.
//! 4. A changed variant or element tag replaces the whole subtree.
//! 5. Same-tag elements diff their props (key excluded) and recurse into
//!    children.
//! 6. Children pair up keyed-first: same-keyed children match regardless of
//!    position, the rest pair in order with the remaining unkeyed children,
//!    and unmatched old children are removed.
//!
//! Component nodes are expanded before comparison.

use std::collections::{HashMap, VecDeque};

use crate::host::{NodeId, PageDom};
use crate::patch::Patch;
use crate::vnode::VNode;

/// Diff `old` (the tree `live` was rendered from) against `new`.
///
/// `live` must be the live node materialised from `old`; the first render
/// has no previous tree and goes through [`crate::materialize`] instead.
pub fn diff(page: &PageDom, old: &VNode, new: &VNode, live: NodeId) -> Vec<Patch> {
    let mut patches = Vec::new();
    diff_node(page, &old.expand(), &new.expand(), live, &mut patches);
    patches
}

fn diff_node(page: &PageDom, old: &VNode, new: &VNode, live: NodeId, out: &mut Vec<Patch>) {
    match (old, new) {
        (VNode::Null, VNode::Null) => {}
        (_, VNode::Null) => out.push(Patch::Remove { node: live }),
        (VNode::Text(a), VNode::Text(b)) => {
            if a != b {
                out.push(Patch::SetText {
                    node: live,
                    text: b.clone(),
                });
            }
        }
        (VNode::Element(a), VNode::Element(b)) if a.tag == b.tag => {
            let (set, unset) = a.props.diff(&b.props);
            if !set.is_empty() || !unset.is_empty() {
                out.push(Patch::Update {
                    node: live,
                    set,
                    unset,
                });
            }
            diff_children(page, live, &a.children, &b.children, out);
        }
        _ => out.push(Patch::Replace {
            node: live,
            with: new.clone(),
        }),
    }
}

fn diff_children(
    page: &PageDom,
    parent: NodeId,
    old_children: &[VNode],
    new_children: &[VNode],
    out: &mut Vec<Patch>,
) {
    // Null children never materialised, so drop them before lining the
    // old virtual children up with the live child list.
    let old: Vec<VNode> = old_children
        .iter()
        .map(VNode::expand)
        .filter(|n| !n.is_null())
        .collect();
    let new: Vec<VNode> = new_children
        .iter()
        .map(VNode::expand)
        .filter(|n| !n.is_null())
        .collect();

    let live: Vec<NodeId> = page.children(parent).to_vec();
    if live.len() != old.len() {
        log::warn!(
            "live child count {} does not match rendered tree {}; reconciling by prefix",
            live.len(),
            old.len()
        );
    }
    let paired = old.len().min(live.len());

    // Keyed-first matching over the old children.
    let mut by_key: HashMap<&str, VecDeque<usize>> = HashMap::new();
    let mut unkeyed: VecDeque<usize> = VecDeque::new();
    for (index, child) in old.iter().enumerate().take(paired) {
        match child.key() {
            Some(key) => by_key.entry(key).or_default().push_back(index),
            None => unkeyed.push_back(index),
        }
    }

    let mut taken = vec![false; paired];
    let mut matches: Vec<Option<usize>> = Vec::with_capacity(new.len());
    for child in &new {
        let matched = child
            .key()
            .and_then(|key| by_key.get_mut(key))
            .and_then(VecDeque::pop_front)
            .or_else(|| {
                while let Some(index) = unkeyed.pop_front() {
                    if !taken[index] {
                        return Some(index);
                    }
                }
                None
            });
        if let Some(index) = matched {
            taken[index] = true;
        }
        matches.push(matched);
    }

    // Removals first, so creation and reorder indexes are computed against
    // the surviving children.
    for (index, live_id) in live.iter().enumerate().take(paired) {
        if !taken[index] {
            out.push(Patch::Remove { node: *live_id });
        }
    }
    for live_id in live.iter().skip(paired) {
        out.push(Patch::Remove { node: *live_id });
    }

    // `working` mirrors the child list as the patches will leave it;
    // `None` marks a slot a Create patch will fill.
    let mut working: Vec<Option<NodeId>> = live
        .iter()
        .enumerate()
        .take(paired)
        .filter(|(index, _)| taken[*index])
        .map(|(_, id)| Some(*id))
        .collect();

    for (position, (child, matched)) in new.iter().zip(&matches).enumerate() {
        match matched {
            Some(old_index) => {
                let live_id = live[*old_index];
                diff_node(page, &old[*old_index], child, live_id, out);
                let current = working
                    .iter()
                    .position(|slot| *slot == Some(live_id))
                    .unwrap_or(position);
                if current != position {
                    out.push(Patch::Reorder {
                        parent,
                        node: live_id,
                        index: position,
                    });
                    let slot = working.remove(current);
                    working.insert(position.min(working.len()), slot);
                }
            }
            None => {
                out.push(Patch::Create {
                    parent,
                    index: position,
                    node: child.clone(),
                });
                working.insert(position.min(working.len()), None);
            }
        }
    }
}
