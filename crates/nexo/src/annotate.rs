// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Inline annotations over a block's plain text.
//!
//! The canonical content model is plain text; inline emphasis is carried as
//! a span list in `data.annotations` — `{start, end, format}` with `char`
//! offsets, kept sorted, coalesced and non-overlapping per format. The
//! format shortcuts toggle spans through the operation log, and the
//! paragraph-family templates turn the spans into nested formatting
//! elements.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumIter, EnumString};

use crate::block::{data_keys, BlockData};

/// The inline emphasis formats the editor can toggle.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum InlineFormat {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
}

impl InlineFormat {
    /// The host element tag the renderer wraps an annotated run in.
    pub fn tag(self) -> &'static str {
        match self {
            InlineFormat::Bold => "strong",
            InlineFormat::Italic => "em",
            InlineFormat::Underline => "u",
            InlineFormat::StrikeThrough => "del",
        }
    }
}

/// One annotated range. `start`/`end` are `char` offsets, end exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSpan {
    pub start: usize,
    pub end: usize,
    pub format: InlineFormat,
}

impl AnnotationSpan {
    pub fn new(start: usize, end: usize, format: InlineFormat) -> Self {
        Self { start, end, format }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Read the span list out of a block's data record. Malformed entries are
/// dropped rather than failing the read.
pub fn spans_of(data: &BlockData) -> Vec<AnnotationSpan> {
    let Some(value) = data.get(data_keys::ANNOTATIONS) else {
        return Vec::new();
    };
    let Some(list) = value.as_array() else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect()
}

/// Encode a span list as the JSON value stored in `data.annotations`.
pub fn spans_to_value(spans: &[AnnotationSpan]) -> Value {
    Value::Array(
        spans
            .iter()
            .filter_map(|span| serde_json::to_value(span).ok())
            .collect(),
    )
}

/// Is every `char` of `[start, end)` covered by `format`?
pub fn is_range_formatted(
    spans: &[AnnotationSpan],
    start: usize,
    end: usize,
    format: InlineFormat,
) -> bool {
    if end <= start {
        return false;
    }
    let mut cursor = start;
    for span in normalize(spans.to_vec()) {
        if span.format != format || span.end <= cursor {
            continue;
        }
        if span.start > cursor {
            return false;
        }
        cursor = span.end;
        if cursor >= end {
            return true;
        }
    }
    false
}

/// Toggle `format` over `[start, end)`: when the whole range already
/// carries the format it is cleared, otherwise the range is formatted.
/// Returns the new, normalised span list.
pub fn toggle(
    spans: &[AnnotationSpan],
    start: usize,
    end: usize,
    format: InlineFormat,
) -> Vec<AnnotationSpan> {
    if end <= start {
        return normalize(spans.to_vec());
    }
    if is_range_formatted(spans, start, end, format) {
        clear_range(spans, start, end, format)
    } else {
        let mut spans = spans.to_vec();
        spans.push(AnnotationSpan::new(start, end, format));
        normalize(spans)
    }
}

/// Remove `format` from `[start, end)`, splitting spans that straddle the
/// range boundaries.
pub fn clear_range(
    spans: &[AnnotationSpan],
    start: usize,
    end: usize,
    format: InlineFormat,
) -> Vec<AnnotationSpan> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        if span.format != format || span.end <= start || span.start >= end {
            out.push(*span);
            continue;
        }
        if span.start < start {
            out.push(AnnotationSpan::new(span.start, start, span.format));
        }
        if span.end > end {
            out.push(AnnotationSpan::new(end, span.end, span.format));
        }
    }
    normalize(out)
}

/// Shift spans for a text splice at `offset`: `removed` chars deleted,
/// `inserted` chars added. Keeps annotations attached to the text around
/// an edit.
pub fn splice(
    spans: &[AnnotationSpan],
    offset: usize,
    removed: usize,
    inserted: usize,
) -> Vec<AnnotationSpan> {
    let removed_end = offset + removed;
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        let map = |position: usize| -> usize {
            if position <= offset {
                position
            } else if position >= removed_end {
                position - removed + inserted
            } else {
                offset
            }
        };
        out.push(AnnotationSpan::new(
            map(span.start),
            map(span.end),
            span.format,
        ));
    }
    normalize(out)
}

/// Sort, drop empties, and coalesce touching/overlapping spans of the same
/// format.
pub fn normalize(mut spans: Vec<AnnotationSpan>) -> Vec<AnnotationSpan> {
    spans.retain(|span| !span.is_empty());
    spans.sort_by_key(|span| (span.format, span.start, span.end));
    let mut out: Vec<AnnotationSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match out.last_mut() {
            Some(last) if last.format == span.format && span.start <= last.end => {
                last.end = last.end.max(span.end);
            }
            _ => out.push(span),
        }
    }
    out.sort_by_key(|span| (span.start, span.end, span.format));
    out
}

/// A run of text with the set of formats active over it. The renderer
/// receives the block text cut into runs at every span boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedRun {
    pub text: String,
    pub formats: Vec<InlineFormat>,
}

/// Cut `text` into [`FormattedRun`]s at annotation boundaries. Offsets
/// beyond the text clamp; an empty span list yields one unformatted run.
pub fn runs(text: &str, spans: &[AnnotationSpan]) -> Vec<FormattedRun> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let spans = normalize(spans.to_vec());

    let mut boundaries: Vec<usize> = vec![0, len];
    for span in &spans {
        boundaries.push(span.start.min(len));
        boundaries.push(span.end.min(len));
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut out = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        if start >= end {
            continue;
        }
        let mut formats: Vec<InlineFormat> = spans
            .iter()
            .filter(|span| span.start <= start && span.end >= end)
            .map(|span| span.format)
            .collect();
        formats.sort();
        formats.dedup();
        out.push(FormattedRun {
            text: chars[start..end].iter().collect(),
            formats,
        });
    }
    if out.is_empty() && !text.is_empty() {
        out.push(FormattedRun {
            text: text.to_owned(),
            formats: Vec::new(),
        });
    }
    out
}
