// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Errors surfaced across the public API.
//!
//! Day-to-day editing never raises: invalid references are no-ops and
//! out-of-range offsets clamp. What can fail is loading a document from
//! outside — malformed JSON or a block graph that violates the forest
//! invariants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid document JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("block reference `{id}` does not resolve")]
    UnresolvedReference { id: String },

    #[error("block `{id}` is referenced as a child more than once")]
    DuplicateChild { id: String },

    #[error("block `{id}` is not reachable from the roots")]
    Orphan { id: String },

    #[error("document has no blocks")]
    Empty,
}
