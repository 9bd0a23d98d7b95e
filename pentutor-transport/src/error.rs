/*
 * Copyright 2025 PenTutor Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

/// Errors raised by the signaling transport.
///
/// A rejected WebSocket upgrade keeps its HTTP status so callers can tell
/// an expired token (401) from a closed meeting (410).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server rejected the upgrade with an HTTP error status.
    #[error("HTTP {status}: WebSocket upgrade rejected")]
    HttpError { status: u16 },

    /// The signaling URL could not be built or parsed.
    #[error("invalid signaling URL: {0}")]
    InvalidUrl(String),

    /// A transport-level or protocol-level error occurred while connecting.
    #[error("WebSocket connection failed: {0}")]
    Connect(String),

    /// The socket is already closed.
    #[error("signaling socket is closed")]
    Closed,

    /// An outbound message could not be serialized.
    #[error("failed to encode signaling message: {0}")]
    Encode(String),
}

impl TransportError {
    /// Returns the HTTP status code if this was an HTTP rejection, else `None`.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status } => Some(*status),
            _ => None,
        }
    }
}
