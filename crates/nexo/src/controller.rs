// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The embedding API: what consumers hold.
//!
//! The controller owns the authoritative document, the abstract selection,
//! the command engine and the event bus. Every mutation goes through a
//! transaction (and is therefore undoable) except `update_block_direct`,
//! the coalesced typing path that keeps one history entry per gesture
//! instead of one per keystroke.

use std::rc::Rc;

use serde_json::Value;

use crate::annotate::{self, AnnotationSpan, InlineFormat};
use crate::block::{data_keys, Block, BlockData, BlockId, BlockType};
use crate::document::Document;
use crate::error::DocumentError;
use crate::event::{
    EditorEvent, Envelope, EventBus, EventKind, EventSource, SubscriptionId,
};
use crate::history::{CommandEngine, DEFAULT_MAX_HISTORY};
use crate::operation::Operation;
use crate::render::WindowConfig;
use crate::selection::{Direction, ExtendUnit, Selection, SelectionPoint};
use crate::transaction::Transaction;

/// Where to drop a block relative to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelativePosition {
    Before,
    After,
}

/// Editor-wide tunables.
#[derive(Clone, Debug)]
pub struct EditorConfig {
    pub max_history: usize,
    pub window: WindowConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            window: WindowConfig::default(),
        }
    }
}

pub struct EditorController {
    document: Document,
    selection: Selection,
    engine: CommandEngine,
    bus: Rc<EventBus>,
}

impl Default for EditorController {
    fn default() -> Self {
        Self::create(EditorConfig::default())
    }
}

impl EditorController {
    pub fn create(config: EditorConfig) -> Self {
        Self::with_document(Document::new(), config)
    }

    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            selection: Selection::None,
            engine: CommandEngine::new(config.max_history),
            bus: Rc::new(EventBus::new()),
        }
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    // ─── Document reads ─────────────────────────────────────────────────

    pub fn get_document(&self) -> &Document {
        &self.document
    }

    pub fn get_block(&self, id: &BlockId) -> Option<&Block> {
        self.document.get_block(id)
    }

    /// Every block in flattened (on-screen) order.
    pub fn get_blocks(&self) -> Vec<&Block> {
        self.document.flattened_blocks()
    }

    pub fn get_block_text(&self, id: &BlockId) -> Option<&str> {
        self.get_block(id).map(Block::text)
    }

    pub fn block_count(&self) -> usize {
        self.document.block_count()
    }

    /// One empty paragraph and nothing else.
    pub fn is_empty(&self) -> bool {
        let roots = self.document.root_blocks();
        self.document.block_count() == 1
            && roots.len() == 1
            && roots[0].kind == BlockType::Paragraph
            && roots[0].text().is_empty()
    }

    // ─── Document writes (through the log) ──────────────────────────────

    /// Create a block after `after_id` (or at the end of the roots) and
    /// return it. `None` when the anchor does not resolve.
    pub fn create_block(
        &mut self,
        kind: BlockType,
        data: BlockData,
        after_id: Option<&BlockId>,
    ) -> Option<Block> {
        let (parent_id, index) = match after_id {
            Some(after) => {
                let block = self.document.get_block(after)?;
                let index = self.document.block_index(after)?;
                (block.parent_id.clone(), index + 1)
            }
            None => (None, self.document.root_ids.len()),
        };
        let block = Block::new(kind, data);
        let id = block.id.clone();
        self.execute(
            "create block",
            vec![Operation::InsertBlock {
                blocks: vec![block],
                parent_id,
                index,
            }],
            EventSource::Api,
        );
        self.document.get_block(&id).cloned()
    }

    /// Merge `patch` into a block's data, one history-recorded operation
    /// per field.
    pub fn update_block(&mut self, id: &BlockId, patch: &BlockData) {
        if !self.document.contains(id) {
            return;
        }
        let operations: Vec<Operation> = patch
            .entries()
            .map(|(key, value)| Operation::SetBlockData {
                block_id: id.clone(),
                path: key.clone(),
                value: Some(value.clone()),
            })
            .collect();
        if operations.is_empty() {
            return;
        }
        self.execute("update block", operations, EventSource::Api);
    }

    /// The non-history update path for coalesced direct typing. The
    /// document still advances (and events still fire) but no history
    /// entry is produced.
    pub fn update_block_direct(&mut self, id: &BlockId, patch: &BlockData) {
        if !self.document.contains(id) {
            return;
        }
        let previous = self.document.clone();
        self.document = self.document.update_block(id, patch);
        if let Some(block) = self.document.get_block(id).cloned() {
            self.bus
                .emit(EditorEvent::BlockUpdated { block }, EventSource::User);
        }
        self.emit_document_changed(previous, EventSource::User);
    }

    pub fn delete_block(&mut self, id: &BlockId) {
        if !self.document.contains(id) {
            return;
        }
        let subtree_size = 1 + self.document.descendants(id).len();
        let mut operations = vec![Operation::DeleteBlock {
            block_id: id.clone(),
        }];
        if self.document.block_count() == subtree_size {
            // Deleting the last block: the log records the replacement
            // paragraph explicitly so undo/redo stays symmetric.
            operations.push(Operation::InsertBlock {
                blocks: vec![Block::empty_paragraph()],
                parent_id: None,
                index: 0,
            });
        }
        self.execute("delete block", operations, EventSource::Api);
        self.sanitize_selection();
    }

    pub fn change_block_type(&mut self, id: &BlockId, kind: BlockType) {
        if !self.document.contains(id) {
            return;
        }
        self.execute(
            "change block type",
            vec![Operation::SetBlockType {
                block_id: id.clone(),
                kind,
            }],
            EventSource::Api,
        );
    }

    pub fn move_block(
        &mut self,
        id: &BlockId,
        new_parent_id: Option<&BlockId>,
        new_index: usize,
    ) {
        self.execute(
            "move block",
            vec![Operation::MoveBlock {
                block_id: id.clone(),
                new_parent_id: new_parent_id.cloned(),
                new_index,
            }],
            EventSource::Api,
        );
    }

    /// Move `id` to sit immediately before/after `target_id`.
    pub fn move_block_relative(
        &mut self,
        id: &BlockId,
        target_id: &BlockId,
        position: RelativePosition,
    ) {
        if id == target_id {
            return;
        }
        let Some(target) = self.document.get_block(target_id) else {
            return;
        };
        let parent = target.parent_id.clone();
        let Some(mut index) = self.document.block_index(target_id) else {
            return;
        };
        if position == RelativePosition::After {
            index += 1;
        }
        // Detaching the moved block first shifts later siblings down one.
        let same_list = self
            .document
            .get_block(id)
            .is_some_and(|block| block.parent_id == parent);
        if same_list {
            if let Some(current) = self.document.block_index(id) {
                if current < index {
                    index -= 1;
                }
            }
        }
        self.move_block(id, parent.as_ref(), index);
    }

    pub fn indent_block(&mut self, id: &BlockId) {
        let Some(previous) = self.document.previous_sibling(id) else {
            return;
        };
        if previous.is_void() {
            return;
        }
        let parent = previous.id.clone();
        let index = previous.children_ids.len();
        self.execute(
            "indent block",
            vec![Operation::MoveBlock {
                block_id: id.clone(),
                new_parent_id: Some(parent),
                new_index: index,
            }],
            EventSource::Api,
        );
    }

    pub fn outdent_block(&mut self, id: &BlockId) {
        let Some(parent) = self.document.parent(id) else {
            return;
        };
        let grandparent = parent.parent_id.clone();
        let Some(parent_index) = self.document.block_index(&parent.id) else {
            return;
        };
        self.execute(
            "outdent block",
            vec![Operation::MoveBlock {
                block_id: id.clone(),
                new_parent_id: grandparent,
                new_index: parent_index + 1,
            }],
            EventSource::Api,
        );
    }

    /// Split a block's text at `offset` into a new next-sibling paragraph.
    /// Returns the created block.
    pub fn split_block(&mut self, id: &BlockId, offset: usize) -> Option<Block> {
        let block = self.document.get_block(id)?;
        if block.is_void() {
            return None;
        }
        let len = block.text_len();
        let offset = offset.min(len);
        let chars: Vec<char> = block.text().chars().collect();
        let tail: String = chars[offset..].iter().collect();
        let spans = annotate::spans_of(&block.data);
        let tail_spans = annotate::splice(&spans, 0, offset, 0);

        let parent_id = block.parent_id.clone();
        let index = self.document.block_index(id)? + 1;

        let mut data = BlockData::with_text(tail);
        if !tail_spans.is_empty() {
            data.set(data_keys::ANNOTATIONS, annotate::spans_to_value(&tail_spans));
        }
        let new_block = Block::new(BlockType::Paragraph, data);
        let new_id = new_block.id.clone();

        self.execute(
            "split block",
            vec![
                Operation::DeleteText {
                    block_id: id.clone(),
                    offset,
                    len: len - offset,
                },
                Operation::InsertBlock {
                    blocks: vec![new_block],
                    parent_id,
                    index,
                },
            ],
            EventSource::Api,
        );
        self.document.get_block(&new_id).cloned()
    }

    /// Merge `source_id` into `target_id` (text appended, children moved,
    /// source deleted). Returns whether the merge happened.
    pub fn merge_blocks(&mut self, source_id: &BlockId, target_id: &BlockId) -> bool {
        let (Some(source), Some(target)) = (
            self.document.get_block(source_id),
            self.document.get_block(target_id),
        ) else {
            return false;
        };
        if source_id == target_id || source.is_void() || target.is_void() {
            return false;
        }
        let target_len = target.text_len();
        let source_text = source.text().to_owned();
        let merged_spans = {
            let mut spans = annotate::spans_of(&target.data);
            for span in annotate::spans_of(&source.data) {
                spans.push(AnnotationSpan::new(
                    span.start + target_len,
                    span.end + target_len,
                    span.format,
                ));
            }
            annotate::normalize(spans)
        };
        let has_annotations =
            !merged_spans.is_empty() || target.data.get(data_keys::ANNOTATIONS).is_some();

        let mut operations = vec![Operation::InsertText {
            block_id: target_id.clone(),
            offset: target_len,
            text: source_text,
        }];
        if has_annotations {
            operations.push(Operation::SetAnnotations {
                block_id: target_id.clone(),
                spans: merged_spans,
            });
        }
        let target_child_count = target.children_ids.len();
        for (offset, child) in source.children_ids.clone().into_iter().enumerate() {
            operations.push(Operation::MoveBlock {
                block_id: child,
                new_parent_id: Some(target_id.clone()),
                new_index: target_child_count + offset,
            });
        }
        operations.push(Operation::DeleteBlock {
            block_id: source_id.clone(),
        });
        self.execute("merge blocks", operations, EventSource::Api);
        self.sanitize_selection();
        true
    }

    /// Insert a deep copy of the subtree after the source block. Copies
    /// get fresh ids. Returns the new root block's id.
    pub fn duplicate_block(&mut self, id: &BlockId) -> Option<BlockId> {
        let block = self.document.get_block(id)?;
        let parent_id = block.parent_id.clone();
        let index = self.document.block_index(id)? + 1;

        let mut originals = vec![block.clone()];
        originals.extend(self.document.descendants(id).into_iter().cloned());
        let mut remap = std::collections::HashMap::new();
        for original in &originals {
            remap.insert(original.id.clone(), BlockId::generate());
        }
        let copies: Vec<Block> = originals
            .into_iter()
            .map(|mut copy| {
                copy.id = remap[&copy.id].clone();
                copy.parent_id = copy
                    .parent_id
                    .as_ref()
                    .map(|parent| remap.get(parent).cloned().unwrap_or_else(|| parent.clone()));
                copy.children_ids = copy
                    .children_ids
                    .iter()
                    .map(|child| remap[child].clone())
                    .collect();
                copy
            })
            .collect();
        let new_id = copies[0].id.clone();

        self.execute(
            "duplicate block",
            vec![Operation::InsertBlock {
                blocks: copies,
                parent_id,
                index,
            }],
            EventSource::Api,
        );
        Some(new_id)
    }

    /// Toggle an inline format over the current text selection. Returns
    /// whether anything changed (collapsed carets and block sets do not
    /// toggle).
    pub fn toggle_format(&mut self, format: InlineFormat) -> bool {
        let Some(range) = self.selection.range(&self.document) else {
            return false;
        };
        if range.is_collapsed || self.selection.is_block_selection() {
            return false;
        }
        // One decision for the whole range: clear only when every covered
        // char already carries the format.
        let mut portions: Vec<(BlockId, usize, usize)> = Vec::new();
        for id in &range.block_ids {
            let Some(block) = self.document.get_block(id) else {
                continue;
            };
            if !block.is_editable() {
                continue;
            }
            let len = block.text_len();
            let start = if *id == range.start_block_id {
                range.start_offset.min(len)
            } else {
                0
            };
            let end = if *id == range.end_block_id {
                range.end_offset.min(len)
            } else {
                len
            };
            if end > start {
                portions.push((id.clone(), start, end));
            }
        }
        if portions.is_empty() {
            return false;
        }
        let all_formatted = portions.iter().all(|(id, start, end)| {
            let block = self.document.get_block(id).expect("portion blocks exist");
            annotate::is_range_formatted(&annotate::spans_of(&block.data), *start, *end, format)
        });
        let operations: Vec<Operation> = portions
            .into_iter()
            .map(|(id, start, end)| {
                let block = self.document.get_block(&id).expect("portion blocks exist");
                let spans = annotate::spans_of(&block.data);
                let next = if all_formatted {
                    annotate::clear_range(&spans, start, end, format)
                } else {
                    let mut spans = spans;
                    spans.push(AnnotationSpan::new(start, end, format));
                    annotate::normalize(spans)
                };
                Operation::SetAnnotations {
                    block_id: id,
                    spans: next,
                }
            })
            .collect();
        self.execute("toggle format", operations, EventSource::User);
        true
    }

    // ─── History ────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let previous = self.document.clone();
        match self.engine.undo(&self.document) {
            Some((next, description)) => {
                self.document = next;
                self.emit_document_changed(previous, EventSource::History);
                self.bus
                    .emit(EditorEvent::CommandUndone { description }, EventSource::History);
                self.sanitize_selection();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let previous = self.document.clone();
        match self.engine.redo(&self.document) {
            Some((next, description)) => {
                self.document = next;
                self.emit_document_changed(previous, EventSource::History);
                self.bus
                    .emit(EditorEvent::CommandRedone { description }, EventSource::History);
                self.sanitize_selection();
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }

    // ─── Selection ──────────────────────────────────────────────────────

    pub fn get_selection(&self) -> &Selection {
        &self.selection
    }

    /// Set the selection. Equal values do not re-emit
    /// `selection:changed`.
    pub fn set_selection(&mut self, selection: Selection) {
        if selection == self.selection {
            return;
        }
        self.selection = selection;
        self.bus.emit(
            EditorEvent::SelectionChanged {
                selection: self.selection.clone(),
            },
            EventSource::User,
        );
    }

    pub fn set_cursor(&mut self, id: &BlockId, offset: usize) {
        let Some(block) = self.document.get_block(id) else {
            return;
        };
        let offset = offset.min(block.text_len());
        self.set_selection(Selection::caret(id.clone(), offset));
    }

    pub fn set_cursor_to_start(&mut self, id: &BlockId) {
        self.set_cursor(id, 0);
    }

    pub fn set_cursor_to_end(&mut self, id: &BlockId) {
        let Some(block) = self.document.get_block(id) else {
            return;
        };
        let end = block.text_len();
        self.set_cursor(id, end);
    }

    pub fn extend_selection(&mut self, direction: Direction, unit: ExtendUnit) {
        let extended = self.selection.extend(direction, unit, &self.document);
        self.set_selection(extended);
    }

    pub fn select_all_blocks(&mut self) {
        let ids = self.document.flattened_ids();
        self.set_selection(Selection::select_blocks(ids));
    }

    pub fn is_at_block_start(&self) -> bool {
        matches!(&self.selection, Selection::Caret(point) if point.offset == 0)
    }

    pub fn is_at_block_end(&self) -> bool {
        match &self.selection {
            Selection::Caret(SelectionPoint { block_id, offset }) => self
                .document
                .get_block(block_id)
                .is_some_and(|block| *offset == block.text_len()),
            _ => false,
        }
    }

    pub fn get_current_block_id(&self) -> Option<BlockId> {
        self.selection.focus_block().cloned()
    }

    /// Announce focus (and optionally the slash menu) to listeners.
    pub fn focus_block(&mut self, id: &BlockId) {
        self.bus.emit(
            EditorEvent::FocusChanged {
                block_id: Some(id.clone()),
                show_slash_menu: false,
                anchor: None,
            },
            EventSource::User,
        );
    }

    // ─── Events ─────────────────────────────────────────────────────────

    pub fn on(
        &self,
        kind: EventKind,
        handler: impl Fn(&Envelope) + 'static,
    ) -> SubscriptionId {
        self.bus.on(kind, handler)
    }

    pub fn on_any(&self, handler: impl Fn(&Envelope) + 'static) -> SubscriptionId {
        self.bus.on_any(handler)
    }

    pub fn off(&self, id: SubscriptionId) {
        self.bus.off(id);
    }

    pub fn emit(&self, event: EditorEvent, source: EventSource) {
        self.bus.emit(event, source);
    }

    // ─── Serialization ──────────────────────────────────────────────────

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.document).unwrap_or(Value::Null)
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.document).unwrap_or_default()
    }

    /// Replace the document from its JSON form. Parent back-pointers are
    /// recomputed from the children lists; history is cleared.
    pub fn from_json(&mut self, value: Value) -> Result<(), DocumentError> {
        let mut document: Document = serde_json::from_value(value)?;
        validate_and_relink(&mut document)?;
        let previous = self.document.clone();
        self.document = document;
        self.engine.clear();
        self.selection = Selection::None;
        self.emit_document_changed(previous, EventSource::Api);
        Ok(())
    }

    pub fn from_json_str(&mut self, json: &str) -> Result<(), DocumentError> {
        let value: Value = serde_json::from_str(json)?;
        self.from_json(value)
    }

    // ─── Internals ──────────────────────────────────────────────────────

    /// Run a transaction through the engine and emit the event stream:
    /// per-operation block events, `document:changed`, then
    /// `command:executed`.
    pub(crate) fn execute(
        &mut self,
        description: &str,
        operations: Vec<Operation>,
        source: EventSource,
    ) {
        if operations.is_empty() {
            return;
        }
        let previous = self.document.clone();
        let transaction = Transaction::new(description, operations);
        let block_events: Vec<EditorEvent> = transaction
            .operations
            .iter()
            .filter_map(|op| block_event_for(op, &previous))
            .collect();
        self.document = self.engine.execute(&self.document, transaction);
        for event in block_events {
            // Creation/update payloads carry the post-state block.
            let event = refresh_event(event, &self.document);
            self.bus.emit(event, source);
        }
        self.emit_document_changed(previous, source);
        self.bus.emit(
            EditorEvent::CommandExecuted {
                description: description.to_owned(),
            },
            source,
        );
    }

    fn emit_document_changed(&self, previous: Document, source: EventSource) {
        self.bus.emit(
            EditorEvent::DocumentChanged {
                previous: Box::new(previous),
                current: Box::new(self.document.clone()),
            },
            source,
        );
    }

    /// Drop or clamp a selection the last mutation invalidated.
    fn sanitize_selection(&mut self) {
        if self.selection.is_valid(&self.document) {
            return;
        }
        let sanitized = match &self.selection {
            Selection::Caret(point) => match self.document.get_block(&point.block_id) {
                Some(block) => Selection::caret(point.block_id.clone(), point.offset.min(block.text_len())),
                None => Selection::None,
            },
            Selection::BlockSet { block_ids } => Selection::select_blocks(
                block_ids
                    .iter()
                    .filter(|id| self.document.contains(id))
                    .cloned()
                    .collect(),
            ),
            _ => Selection::None,
        };
        self.set_selection(sanitized);
    }
}

/// The block event an operation will produce, shaped against the
/// pre-state (payloads are refreshed after execution).
fn block_event_for(op: &Operation, doc: &Document) -> Option<EditorEvent> {
    match op {
        Operation::InsertBlock { blocks, .. } => Some(EditorEvent::BlockCreated {
            block: blocks.first()?.clone(),
        }),
        Operation::DeleteBlock { block_id } => {
            if doc.contains(block_id) {
                Some(EditorEvent::BlockDeleted {
                    block_id: block_id.clone(),
                })
            } else {
                None
            }
        }
        Operation::MoveBlock {
            block_id,
            new_parent_id,
            new_index,
        } => Some(EditorEvent::BlockMoved {
            block_id: block_id.clone(),
            new_parent_id: new_parent_id.clone(),
            new_index: *new_index,
        }),
        Operation::SetBlockType { block_id, .. }
        | Operation::SetBlockData { block_id, .. }
        | Operation::InsertText { block_id, .. }
        | Operation::DeleteText { block_id, .. }
        | Operation::SetAnnotations { block_id, .. } => {
            let block = doc.get_block(block_id)?;
            Some(EditorEvent::BlockUpdated {
                block: block.clone(),
            })
        }
    }
}

/// Swap stale block payloads for their post-execution state.
fn refresh_event(event: EditorEvent, doc: &Document) -> EditorEvent {
    match event {
        EditorEvent::BlockCreated { block } => match doc.get_block(&block.id) {
            Some(fresh) => EditorEvent::BlockCreated {
                block: fresh.clone(),
            },
            None => EditorEvent::BlockCreated { block },
        },
        EditorEvent::BlockUpdated { block } => match doc.get_block(&block.id) {
            Some(fresh) => EditorEvent::BlockUpdated {
                block: fresh.clone(),
            },
            None => EditorEvent::BlockUpdated { block },
        },
        other => other,
    }
}

/// Validate the forest and recompute `parent_id` from the children lists.
fn validate_and_relink(document: &mut Document) -> Result<(), DocumentError> {
    if document.blocks.is_empty() || document.root_ids.is_empty() {
        return Err(DocumentError::Empty);
    }
    // Every referenced id must resolve, and no id may be claimed twice.
    let mut seen = std::collections::HashSet::new();
    let mut parents: std::collections::HashMap<BlockId, Option<BlockId>> =
        std::collections::HashMap::new();
    for id in &document.root_ids {
        if !document.blocks.contains_key(id) {
            return Err(DocumentError::UnresolvedReference { id: id.to_string() });
        }
        if !seen.insert(id.clone()) {
            return Err(DocumentError::DuplicateChild { id: id.to_string() });
        }
        parents.insert(id.clone(), None);
    }
    for (parent_id, block) in &document.blocks {
        for child in &block.children_ids {
            if !document.blocks.contains_key(child) {
                return Err(DocumentError::UnresolvedReference {
                    id: child.to_string(),
                });
            }
            if !seen.insert(child.clone()) {
                return Err(DocumentError::DuplicateChild {
                    id: child.to_string(),
                });
            }
            parents.insert(child.clone(), Some(parent_id.clone()));
        }
    }
    for id in document.blocks.keys() {
        if !parents.contains_key(id) {
            return Err(DocumentError::Orphan { id: id.to_string() });
        }
    }
    for (id, parent) in parents {
        if let Some(block) = document.blocks.get_mut(&id) {
            block.parent_id = parent;
        }
    }
    document.assert_store_invariants();
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    fn controller_with_texts(texts: &[&str]) -> (EditorController, Vec<BlockId>) {
        let (doc, ids) = crate::document::doc_with_roots(texts);
        (
            EditorController::with_document(doc, EditorConfig::default()),
            ids,
        )
    }

    #[test]
    fn a_fresh_controller_holds_one_empty_paragraph() {
        let controller = EditorController::default();
        assert!(controller.is_empty());
        assert!(!controller.can_undo());
    }

    #[test]
    fn create_after_anchors_to_the_sibling() {
        let (mut controller, ids) = controller_with_texts(&["a", "c"]);
        let block = controller
            .create_block(BlockType::Paragraph, BlockData::with_text("b"), Some(&ids[0]))
            .expect("block created");
        assert_eq!(
            controller.get_document().root_ids,
            vec![ids[0].clone(), block.id, ids[1].clone()]
        );
        assert!(controller.can_undo());
    }

    #[test]
    fn update_block_is_undoable_but_direct_is_not() {
        let (mut controller, ids) = controller_with_texts(&["old"]);
        controller.update_block(&ids[0], &BlockData::with_text("new"));
        assert_eq!(controller.get_block_text(&ids[0]), Some("new"));
        assert!(controller.undo());
        assert_eq!(controller.get_block_text(&ids[0]), Some("old"));

        controller.update_block_direct(&ids[0], &BlockData::with_text("typed"));
        assert_eq!(controller.get_block_text(&ids[0]), Some("typed"));
        assert!(!controller.can_undo());
    }

    #[test]
    fn deleting_the_last_block_leaves_a_paragraph_and_undoes_cleanly() {
        let (mut controller, ids) = controller_with_texts(&["only"]);
        controller.delete_block(&ids[0]);
        assert!(controller.is_empty());
        assert!(controller.undo());
        assert_eq!(controller.get_block_text(&ids[0]), Some("only"));
        assert_eq!(controller.block_count(), 1);
    }

    #[test]
    fn move_relative_before_and_after() {
        let (mut controller, ids) = controller_with_texts(&["a", "b", "c"]);
        controller.move_block_relative(&ids[2], &ids[0], RelativePosition::Before);
        assert_eq!(
            controller.get_document().root_ids,
            vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]
        );
        controller.move_block_relative(&ids[2], &ids[1], RelativePosition::After);
        assert_eq!(
            controller.get_document().root_ids,
            vec![ids[0].clone(), ids[1].clone(), ids[2].clone()]
        );
    }

    #[test]
    fn split_then_undo_restores_the_text() {
        let (mut controller, ids) = controller_with_texts(&["hello world"]);
        let new_block = controller.split_block(&ids[0], 5).expect("split");
        assert_eq!(controller.get_block_text(&ids[0]), Some("hello"));
        assert_eq!(new_block.text(), " world");

        assert!(controller.undo());
        assert_eq!(controller.get_block_text(&ids[0]), Some("hello world"));
        assert!(!controller.get_document().contains(&new_block.id));
    }

    #[test]
    fn merge_then_undo_restores_both_blocks() {
        let (mut controller, ids) = controller_with_texts(&["foo", "bar"]);
        assert!(controller.merge_blocks(&ids[1], &ids[0]));
        assert_eq!(controller.get_block_text(&ids[0]), Some("foobar"));
        assert_eq!(controller.block_count(), 1);

        assert!(controller.undo());
        assert_eq!(controller.get_block_text(&ids[0]), Some("foo"));
        assert_eq!(controller.get_block_text(&ids[1]), Some("bar"));
        assert_eq!(
            controller.get_document().root_ids,
            vec![ids[0].clone(), ids[1].clone()]
        );
    }

    #[test]
    fn duplicate_copies_the_subtree_with_fresh_ids() {
        let (mut controller, ids) = controller_with_texts(&["parent"]);
        let child = controller
            .create_block(BlockType::Paragraph, BlockData::with_text("kid"), None)
            .unwrap();
        controller.move_block(&child.id, Some(&ids[0]), 0);

        let copy_id = controller.duplicate_block(&ids[0]).expect("duplicate");
        assert_ne!(copy_id, ids[0]);
        let copy = controller.get_block(&copy_id).unwrap();
        assert_eq!(copy.text(), "parent");
        assert_eq!(copy.children_ids.len(), 1);
        assert_ne!(copy.children_ids[0], child.id);
        assert_eq!(
            controller
                .get_block(&copy.children_ids[0])
                .unwrap()
                .text(),
            "kid"
        );
    }

    #[test]
    fn selection_equality_suppresses_duplicate_events() {
        let (mut controller, ids) = controller_with_texts(&["abc"]);
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        controller.on(EventKind::SelectionChanged, move |_| {
            *counter.borrow_mut() += 1;
        });
        controller.set_cursor(&ids[0], 1);
        controller.set_cursor(&ids[0], 1);
        controller.set_cursor(&ids[0], 2);
        assert_eq!(*seen.borrow(), 2);
    }

    #[test]
    fn cursor_queries_answer_block_edges() {
        let (mut controller, ids) = controller_with_texts(&["abc"]);
        controller.set_cursor_to_start(&ids[0]);
        assert!(controller.is_at_block_start());
        assert!(!controller.is_at_block_end());
        controller.set_cursor_to_end(&ids[0]);
        assert!(controller.is_at_block_end());
        assert_eq!(controller.get_current_block_id(), Some(ids[0].clone()));
    }

    #[test]
    fn toggle_format_round_trips_and_undoes() {
        let (mut controller, ids) = controller_with_texts(&["hello world"]);
        controller.set_selection(Selection::text_range(ids[0].clone(), 0, 5));
        assert!(controller.toggle_format(InlineFormat::Bold));
        let spans = annotate::spans_of(&controller.get_block(&ids[0]).unwrap().data);
        assert_eq!(spans, vec![AnnotationSpan::new(0, 5, InlineFormat::Bold)]);

        assert!(controller.toggle_format(InlineFormat::Bold));
        assert!(annotate::spans_of(&controller.get_block(&ids[0]).unwrap().data).is_empty());

        assert!(controller.undo());
        let spans = annotate::spans_of(&controller.get_block(&ids[0]).unwrap().data);
        assert_eq!(spans, vec![AnnotationSpan::new(0, 5, InlineFormat::Bold)]);
    }

    #[test]
    fn deleting_a_selected_block_sanitizes_the_selection() {
        let (mut controller, ids) = controller_with_texts(&["a", "b"]);
        controller.set_cursor(&ids[1], 1);
        controller.delete_block(&ids[1]);
        assert_eq!(*controller.get_selection(), Selection::None);
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let (mut controller, ids) = controller_with_texts(&["a", "b"]);
        controller.indent_block(&ids[1]);
        let json = controller.to_json();

        let mut restored = EditorController::default();
        restored.from_json(json).expect("load");
        assert_eq!(
            restored.get_document().root_ids,
            controller.get_document().root_ids
        );
        assert_eq!(
            restored.get_block(&ids[1]).unwrap().parent_id,
            Some(ids[0].clone())
        );
        assert!(!restored.can_undo());
    }

    #[test]
    fn from_json_rejects_dangling_references() {
        let (controller, _) = controller_with_texts(&["a"]);
        let mut json = controller.to_json();
        json["rootIds"]
            .as_array_mut()
            .unwrap()
            .push(Value::String("missing".to_owned()));
        let mut target = EditorController::default();
        let error = target.from_json(json).unwrap_err();
        assert!(matches!(error, DocumentError::UnresolvedReference { .. }));
    }
}
