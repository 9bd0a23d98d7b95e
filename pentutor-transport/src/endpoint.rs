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

use url::Url;

use crate::error::TransportError;

/// Build `ws(s)://<host>/ws/meetings/<meeting_id>/?token=<token>`.
///
/// `ws_base` may also be given as an `http(s)` URL, in which case the scheme
/// is switched to its WebSocket counterpart. Any path on the base is replaced.
pub fn signaling_url(ws_base: &str, meeting_id: &str, token: &str) -> Result<String, TransportError> {
    if meeting_id.trim().is_empty() {
        return Err(TransportError::InvalidUrl("meeting id is empty".to_string()));
    }
    let mut url =
        Url::parse(ws_base).map_err(|e| TransportError::InvalidUrl(format!("{ws_base}: {e}")))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme '{other}'"
            )))
        }
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|_| TransportError::InvalidUrl(format!("cannot switch to {scheme}")))?;
    }

    url.path_segments_mut()
        .map_err(|_| TransportError::InvalidUrl(format!("{ws_base} cannot be a base")))?
        .clear()
        .extend(["ws", "meetings", meeting_id, ""]);
    url.query_pairs_mut().clear().append_pair("token", token);
    url.set_fragment(None);

    Ok(url.into())
}
