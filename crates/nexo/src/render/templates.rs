// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Per-type block templates.
//!
//! Each template renders a block's own content — the editable element and
//! its decorations — as a virtual subtree. The compiler wraps it in the
//! outer `data-block-id` element and appends the children container, so a
//! template never recurses into child blocks and a cached content node
//! stays valid while children churn.
//!
//! Unknown tags fall back to a diagnostic element so one bad block cannot
//! take down the rest of the document.

use std::collections::HashMap;

use nexo_vdom::{VElement, VNode};

use crate::annotate;
use crate::block::{Block, BlockType};

/// What a template may consult besides the block itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderContext {
    /// 1-based ordinal for numbered list items, reset per run.
    pub list_index: Option<usize>,
}

pub type TemplateFn = fn(&Block, &RenderContext) -> VNode;

pub struct TemplateRegistry {
    templates: HashMap<BlockType, TemplateFn>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        let mut registry = Self {
            templates: HashMap::new(),
        };
        registry.register(BlockType::Paragraph, |b, c| text_block("p", b, c));
        registry.register(BlockType::Heading1, |b, c| text_block("h1", b, c));
        registry.register(BlockType::Heading2, |b, c| text_block("h2", b, c));
        registry.register(BlockType::Heading3, |b, c| text_block("h3", b, c));
        registry.register(BlockType::Quote, |b, c| text_block("blockquote", b, c));
        registry.register(BlockType::BulletList, list_item);
        registry.register(BlockType::NumberedList, list_item);
        registry.register(BlockType::TodoList, todo_item);
        registry.register(BlockType::Code, code_block);
        registry.register(BlockType::Divider, divider);
        registry.register(BlockType::Image, image);
        registry
    }
}

impl TemplateRegistry {
    pub fn register(&mut self, kind: BlockType, template: TemplateFn) {
        self.templates.insert(kind, template);
    }

    pub fn render(&self, block: &Block, ctx: &RenderContext) -> VNode {
        match self.templates.get(&block.kind) {
            Some(template) => template(block, ctx),
            None => fallback(block),
        }
    }
}

/// Renderer fault containment: an unregistered tag renders a diagnostic
/// element and the rest of the document carries on.
fn fallback(block: &Block) -> VNode {
    log::warn!("no template registered for block type {}", block.kind);
    VElement::new("div")
        .prop("className", "nexo-block-unknown")
        .prop("contentEditable", "false")
        .child(VNode::text(format!(
            "Unsupported block type: {}",
            block.kind
        )))
        .into_node()
}

// ─── Editable text content ──────────────────────────────────────────────

/// The inline children of an editable element: annotation runs wrapped in
/// formatting tags, newlines as `br` elements, and a placeholder `br` for
/// empty text so the element keeps a caret line.
fn editable_children(block: &Block) -> Vec<VNode> {
    let text = block.text();
    if text.is_empty() {
        return vec![VElement::new("br").into_node()];
    }
    let spans = annotate::spans_of(&block.data);
    if spans.is_empty() {
        return newline_runs(text);
    }
    annotate::runs(text, &spans)
        .into_iter()
        .map(|run| {
            let mut node = VNode::text(run.text);
            // Wrap innermost-out; bold ends up outermost.
            for format in run.formats.iter().rev() {
                node = VElement::new(format.tag()).child(node).into_node();
            }
            node
        })
        .collect()
}

fn newline_runs(text: &str) -> Vec<VNode> {
    let mut out = Vec::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push(VElement::new("br").into_node());
        }
        if !line.is_empty() {
            out.push(VNode::text(line));
        }
    }
    out
}

fn editable(tag: &str, block: &Block) -> VElement {
    VElement::new(tag)
        .prop("contentEditable", "true")
        .prop("data-placeholder", block.kind.placeholder())
        .children(editable_children(block))
}

// ─── Templates ──────────────────────────────────────────────────────────

fn text_block(tag: &str, block: &Block, _ctx: &RenderContext) -> VNode {
    editable(tag, block)
        .prop("className", "nexo-text")
        .into_node()
}

fn list_item(block: &Block, ctx: &RenderContext) -> VNode {
    let marker = match (block.kind, ctx.list_index) {
        (BlockType::NumberedList, Some(index)) => format!("{index}."),
        (BlockType::NumberedList, None) => "1.".to_owned(),
        _ => "•".to_owned(),
    };
    VElement::new("div")
        .prop("className", "nexo-list-item")
        .child(
            VElement::new("span")
                .prop("className", "nexo-list-marker")
                .prop("contentEditable", "false")
                .child(VNode::text(marker))
                .into_node(),
        )
        .child(editable("div", block).prop("className", "nexo-list-text").into_node())
        .into_node()
}

fn todo_item(block: &Block, _ctx: &RenderContext) -> VNode {
    let checked = block.data.checked();
    let class = if checked {
        "nexo-todo nexo-todo-done"
    } else {
        "nexo-todo"
    };
    VElement::new("div")
        .prop("className", class)
        .child(
            VElement::new("input")
                .prop("type", "checkbox")
                .prop("checked", checked)
                .into_node(),
        )
        .child(editable("div", block).prop("className", "nexo-todo-text").into_node())
        .into_node()
}

fn code_block(block: &Block, _ctx: &RenderContext) -> VNode {
    let language = block.data.language().unwrap_or("plain text").to_owned();
    VElement::new("div")
        .prop("className", "nexo-code")
        .child(
            VElement::new("span")
                .prop("className", "nexo-code-language")
                .prop("contentEditable", "false")
                .child(VNode::text(language))
                .into_node(),
        )
        .child(
            VElement::new("pre")
                .child(
                    editable("code", block)
                        .prop("spellcheck", "false")
                        .into_node(),
                )
                .into_node(),
        )
        .into_node()
}

fn divider(_block: &Block, _ctx: &RenderContext) -> VNode {
    // tabindex lets keyboard navigation land on the otherwise inert rule.
    VElement::new("hr")
        .prop("className", "nexo-divider")
        .prop("tabindex", "0")
        .into_node()
}

fn image(block: &Block, _ctx: &RenderContext) -> VNode {
    match block.data.url() {
        Some(url) => {
            let mut el = VElement::new("img")
                .prop("className", "nexo-image")
                .prop("src", url);
            if let Some(alt) = block.data.alt() {
                el = el.prop("alt", alt);
            }
            el.into_node()
        }
        None => VElement::new("div")
            .prop("className", "nexo-image-placeholder")
            .prop("contentEditable", "false")
            .child(VNode::text("Add an image"))
            .into_node(),
    }
}

/// Ordinals for a sibling run: numbered lists count up and reset whenever
/// the preceding sibling is anything else.
pub fn numbered_indices(siblings: &[&Block]) -> HashMap<crate::block::BlockId, usize> {
    let mut out = HashMap::new();
    let mut counter = 0usize;
    for block in siblings {
        if block.kind == BlockType::NumberedList {
            counter += 1;
            out.insert(block.id.clone(), counter);
        } else {
            counter = 0;
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotate::{AnnotationSpan, InlineFormat};
    use crate::block::{data_keys, BlockData, BlockId};
    use nexo_vdom::{materialize, PageDom};

    fn block(kind: BlockType, text: &str) -> Block {
        Block::new(kind, BlockData::with_text(text))
    }

    fn render_to_page(node: &VNode) -> (PageDom, nexo_vdom::NodeId) {
        let mut page = PageDom::new();
        let id = materialize(&mut page, node).expect("template should render");
        (page, id)
    }

    #[test]
    fn paragraph_renders_an_editable_p() {
        let registry = TemplateRegistry::default();
        let b = block(BlockType::Paragraph, "hello");
        let (page, id) = render_to_page(&registry.render(&b, &RenderContext::default()));
        assert_eq!(page.tag(id), Some("p"));
        assert_eq!(page.attr(id, "contenteditable"), Some("true"));
        assert_eq!(page.attr(id, "data-placeholder"), Some("Type '/' for commands"));
        assert_eq!(page.text_content(id), "hello");
    }

    #[test]
    fn empty_text_gets_a_placeholder_br() {
        let registry = TemplateRegistry::default();
        let b = block(BlockType::Paragraph, "");
        let (page, id) = render_to_page(&registry.render(&b, &RenderContext::default()));
        let children = page.children(id);
        assert_eq!(children.len(), 1);
        assert!(page.is_br(children[0]));
    }

    #[test]
    fn annotated_text_nests_formatting_elements() {
        let registry = TemplateRegistry::default();
        let mut b = block(BlockType::Paragraph, "hello world");
        b.data.set(
            data_keys::ANNOTATIONS,
            annotate::spans_to_value(&[AnnotationSpan::new(0, 5, InlineFormat::Bold)]),
        );
        let (page, id) = render_to_page(&registry.render(&b, &RenderContext::default()));
        let children = page.children(id).to_vec();
        assert_eq!(page.tag(children[0]), Some("strong"));
        assert_eq!(page.text_content(children[0]), "hello");
        assert_eq!(page.text_content(id), "hello world");
    }

    #[test]
    fn numbered_list_uses_the_supplied_ordinal() {
        let registry = TemplateRegistry::default();
        let b = block(BlockType::NumberedList, "item");
        let ctx = RenderContext {
            list_index: Some(3),
        };
        let (page, id) = render_to_page(&registry.render(&b, &ctx));
        let marker = page.children(id)[0];
        assert_eq!(page.text_content(marker), "3.");
        assert_eq!(page.attr(marker, "contenteditable"), Some("false"));
    }

    #[test]
    fn todo_reflects_its_checked_state() {
        let registry = TemplateRegistry::default();
        let mut b = block(BlockType::TodoList, "task");
        b.data.set_checked(true);
        let (page, id) = render_to_page(&registry.render(&b, &RenderContext::default()));
        assert_eq!(page.attr(id, "class"), Some("nexo-todo nexo-todo-done"));
        let checkbox = page.children(id)[0];
        assert_eq!(page.attr(checkbox, "checked"), Some("true"));
    }

    #[test]
    fn code_preserves_newlines_and_disables_spellcheck() {
        let registry = TemplateRegistry::default();
        let mut b = block(BlockType::Code, "fn main() {\n}");
        b.data.set_language("rust");
        let (page, id) = render_to_page(&registry.render(&b, &RenderContext::default()));
        let label = page.children(id)[0];
        assert_eq!(page.text_content(label), "rust");
        let pre = page.children(id)[1];
        let code = page.children(pre)[0];
        assert_eq!(page.attr(code, "spellcheck"), Some("false"));
        assert_eq!(page.rendered_text(code), "fn main() {\n}");
    }

    #[test]
    fn divider_is_focusable_but_inert() {
        let registry = TemplateRegistry::default();
        let b = block(BlockType::Divider, "");
        let (page, id) = render_to_page(&registry.render(&b, &RenderContext::default()));
        assert_eq!(page.tag(id), Some("hr"));
        assert_eq!(page.attr(id, "tabindex"), Some("0"));
    }

    #[test]
    fn image_without_url_renders_a_placeholder() {
        let registry = TemplateRegistry::default();
        let b = block(BlockType::Image, "");
        let (page, id) = render_to_page(&registry.render(&b, &RenderContext::default()));
        assert_eq!(page.attr(id, "class"), Some("nexo-image-placeholder"));
    }

    #[test]
    fn numbered_indices_reset_after_interruptions() {
        let blocks: Vec<Block> = vec![
            block(BlockType::NumberedList, "one"),
            block(BlockType::NumberedList, "two"),
            block(BlockType::Paragraph, "gap"),
            block(BlockType::NumberedList, "restart"),
        ];
        let refs: Vec<&Block> = blocks.iter().collect();
        let indices = numbered_indices(&refs);
        assert_eq!(indices[&blocks[0].id], 1);
        assert_eq!(indices[&blocks[1].id], 2);
        assert_eq!(indices.get(&blocks[2].id), None);
        assert_eq!(indices[&blocks[3].id], 1);
    }
}
