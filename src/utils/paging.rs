//! Opaque cursor handling for connection fields.
//!
//! A cursor encodes a stable zero-based position in the sorted result set.
//! The encoding is an implementation detail to API consumers, but the
//! translator relies on it to turn an `after` argument into a `SKIP` bound.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

const CURSOR_PREFIX: &str = "cursor:";

/// Encode a result-set offset as an opaque cursor.
pub fn offset_to_cursor(offset: i64) -> String {
    STANDARD.encode(format!("{}{}", CURSOR_PREFIX, offset))
}

/// Decode an opaque cursor back into its offset.
///
/// Returns `None` for anything that was not produced by
/// [`offset_to_cursor`].
pub fn cursor_to_offset(cursor: &str) -> Option<i64> {
    let raw = STANDARD.decode(cursor).ok()?;
    let text = String::from_utf8(raw).ok()?;
    text.strip_prefix(CURSOR_PREFIX)?.parse().ok()
}
