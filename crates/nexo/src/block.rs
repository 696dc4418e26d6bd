// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Blocks: the typed, identity-bearing units of document structure.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

/// Milliseconds since the unix epoch, used for block and document stamps.
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Opaque block identity, stable for the block's lifetime.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Allocate a fresh id. Ids never collide.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The closed set of block tags.
///
/// Four behaviours matter to the rest of the editor: editable textual
/// blocks, the checkable todo, atomic void blocks (divider, image) and
/// container nesting, which every non-void block supports.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BlockType {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    TodoList,
    Quote,
    Code,
    Divider,
    Image,
}

impl BlockType {
    /// Atomic void blocks carry no text and no caret.
    pub fn is_void(self) -> bool {
        matches!(self, BlockType::Divider | BlockType::Image)
    }

    /// Blocks the caret can land in.
    pub fn is_editable(self) -> bool {
        !self.is_void()
    }

    pub fn is_checkable(self) -> bool {
        matches!(self, BlockType::TodoList)
    }

    pub fn is_heading(self) -> bool {
        matches!(
            self,
            BlockType::Heading1 | BlockType::Heading2 | BlockType::Heading3
        )
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            BlockType::BulletList | BlockType::NumberedList | BlockType::TodoList
        )
    }

    /// The hint shown in an empty block of this type.
    pub fn placeholder(self) -> &'static str {
        match self {
            BlockType::Paragraph => "Type '/' for commands",
            BlockType::Heading1 => "Heading 1",
            BlockType::Heading2 => "Heading 2",
            BlockType::Heading3 => "Heading 3",
            BlockType::BulletList | BlockType::NumberedList => "List item",
            BlockType::TodoList => "To-do",
            BlockType::Quote => "Quote",
            BlockType::Code => "Code",
            BlockType::Divider | BlockType::Image => "",
        }
    }
}

/// Well-known keys within [`BlockData`].
pub mod data_keys {
    pub const TEXT: &str = "text";
    pub const CHECKED: &str = "checked";
    pub const LANGUAGE: &str = "language";
    pub const URL: &str = "url";
    pub const ALT: &str = "alt";
    pub const ANNOTATIONS: &str = "annotations";
}

/// The open record of type-specific block fields.
///
/// Recognised keys get typed accessors; anything else rides along
/// untouched so that consumers can stash their own fields.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockData(BTreeMap<String, Value>);

impl BlockData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let mut data = Self::new();
        data.set_text(text);
        data
    }

    pub fn text(&self) -> Option<&str> {
        self.0.get(data_keys::TEXT).and_then(Value::as_str)
    }

    pub fn text_or_empty(&self) -> &str {
        self.text().unwrap_or("")
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.0
            .insert(data_keys::TEXT.to_owned(), Value::String(text.into()));
    }

    pub fn checked(&self) -> bool {
        self.0
            .get(data_keys::CHECKED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.0
            .insert(data_keys::CHECKED.to_owned(), Value::Bool(checked));
    }

    pub fn language(&self) -> Option<&str> {
        self.0.get(data_keys::LANGUAGE).and_then(Value::as_str)
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.0.insert(
            data_keys::LANGUAGE.to_owned(),
            Value::String(language.into()),
        );
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get(data_keys::URL).and_then(Value::as_str)
    }

    pub fn alt(&self) -> Option<&str> {
        self.0.get(data_keys::ALT).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merge `patch` into this record, key by key.
    pub fn merge(&mut self, patch: &BlockData) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Read the value at a dotted `path`, descending into nested objects.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    /// Write `value` at a dotted `path`, creating intermediate objects.
    /// `None` removes the leaf. Returns the previous value at the path.
    pub fn set_path(&mut self, path: &str, value: Option<Value>) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (first, rest) = segments.split_first()?;
        if rest.is_empty() {
            return match value {
                Some(value) => self.0.insert((*first).to_owned(), value),
                None => self.0.remove(*first),
            };
        }
        let root = self
            .0
            .entry((*first).to_owned())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        let mut current = root;
        for segment in &rest[..rest.len() - 1] {
            if !current.is_object() {
                *current = Value::Object(serde_json::Map::new());
            }
            current = current
                .as_object_mut()
                .expect("just ensured an object")
                .entry((*segment).to_owned())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
        }
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let leaf = *rest.last().expect("rest is non-empty");
        let map = current.as_object_mut().expect("just ensured an object");
        match value {
            Some(value) => map.insert(leaf.to_owned(), value),
            None => map.remove(leaf),
        }
    }
}

/// Creation/update stamps and the monotonically increasing version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMeta {
    pub created_at: u64,
    pub updated_at: u64,
    pub version: u64,
}

impl BlockMeta {
    pub(crate) fn fresh() -> Self {
        let now = now_ms();
        Self {
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub(crate) fn bump(&mut self) {
        self.updated_at = now_ms();
        self.version += 1;
    }
}

/// One node of the document forest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockType,
    pub data: BlockData,
    pub parent_id: Option<BlockId>,
    pub children_ids: Vec<BlockId>,
    pub meta: BlockMeta,
}

impl Block {
    /// A fresh root-less block with a generated id.
    pub fn new(kind: BlockType, data: BlockData) -> Self {
        Self {
            id: BlockId::generate(),
            kind,
            data,
            parent_id: None,
            children_ids: Vec::new(),
            meta: BlockMeta::fresh(),
        }
    }

    pub fn empty_paragraph() -> Self {
        Self::new(BlockType::Paragraph, BlockData::with_text(""))
    }

    pub fn text(&self) -> &str {
        self.data.text_or_empty()
    }

    /// Text length in `char`s, the unit every offset in the editor uses.
    pub fn text_len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn is_void(&self) -> bool {
        self.kind.is_void()
    }

    pub fn is_editable(&self) -> bool {
        self.kind.is_editable()
    }
}
