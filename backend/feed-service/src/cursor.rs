//! Opaque pagination cursor
//!
//! Tokens are URL-safe base64 over a small versioned JSON record. Clients must
//! treat them as unparseable strings. Anything that fails to decode (empty,
//! not base64, not JSON, unknown version, negative offset) is read as offset 0
//! so a bad cursor restarts the feed from the top instead of failing.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CURSOR_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct CursorToken {
    v: u8,
    o: i64,
}

/// Encode a pagination offset into an opaque token
pub fn encode(offset: i64) -> String {
    let token = CursorToken {
        v: CURSOR_VERSION,
        o: offset.max(0),
    };
    // Serializing two integers cannot fail
    let json = serde_json::to_vec(&token).unwrap_or_default();
    general_purpose::URL_SAFE_NO_PAD.encode(json)
}

/// Decode a token into an offset, defaulting to 0 on any malformed input
pub fn decode(token: Option<&str>) -> i64 {
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return 0,
    };

    let bytes = match general_purpose::URL_SAFE_NO_PAD.decode(token) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "cursor is not valid base64, starting from top");
            return 0;
        }
    };

    match serde_json::from_slice::<CursorToken>(&bytes) {
        Ok(CursorToken { v, o }) if v == CURSOR_VERSION && o >= 0 => o,
        Ok(CursorToken { v, .. }) => {
            debug!(version = v, "cursor rejected, starting from top");
            0
        }
        Err(e) => {
            debug!(error = %e, "cursor payload unreadable, starting from top");
            0
        }
    }
}
