// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! URL-encoding helper for clients that need to build a `/sim/{loc}/...`
//! path from a `panic_location` containing `/` and `:`.

/// Percent-encodes `loc` for use as a single path segment.
pub fn encode_location(loc: &str) -> String {
    urlencoding::encode(loc).into_owned()
}
