//! Pagination cursors.
//!
//! A cursor is an opaque token marking a position in a paginated sequence. Locally, cursors are the
//! standard base64 encoding of a decimal integer, so that a connection can extend its own page
//! bounds (for example when a node is appended on the client) without talking to the server.

use base64::prelude::*;
use std::num::IntErrorKind;

/// Encode a position as a cursor.
pub fn encode(position: i64) -> String {
    BASE64_STANDARD.encode(position.to_string())
}

/// Decode a cursor into the position it marks.
///
/// Returns [`None`] if `cursor` is not base64, or does not encode a decimal integer. Cursors handed
/// out by a server are opaque and frequently fall into this category.
pub fn decode(cursor: &str) -> Option<i64> {
    let bytes = BASE64_STANDARD.decode(cursor).ok()?;
    std::str::from_utf8(&bytes).ok()?.trim().parse().ok()
}

/// The position a neighboring cursor is computed from.
///
/// Unlike [`decode`], a decimal cursor beyond the range of `i64` clamps to the nearest bound, so
/// that neighbors of huge server cursors never jump back towards 0.
fn clamped_position(cursor: &str) -> Option<i64> {
    let bytes = BASE64_STANDARD.decode(cursor).ok()?;
    match std::str::from_utf8(&bytes).ok()?.trim().parse::<i64>() {
        Ok(position) => Some(position),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

/// The cursor immediately after `cursor`.
///
/// Undecodable or missing cursors count as position 0. There is nothing after the largest
/// position, so its successor is itself.
pub fn next(cursor: Option<&str>) -> String {
    let position = cursor.and_then(clamped_position).unwrap_or(0);
    match position.checked_add(1) {
        Some(next) => encode(next),
        None => {
            tracing::warn!("cursor position {position} cannot advance");
            encode(position)
        }
    }
}

/// The cursor immediately before `cursor`.
///
/// A missing cursor counts as position 1, so that the first prepended node lands at position 0.
/// The predecessor of the smallest position is itself.
pub fn previous(cursor: Option<&str>) -> String {
    let position = match cursor {
        Some(cursor) => clamped_position(cursor).unwrap_or(0),
        None => 1,
    };
    match position.checked_sub(1) {
        Some(previous) => encode(previous),
        None => {
            tracing::warn!("cursor position {position} cannot retreat");
            encode(position)
        }
    }
}
