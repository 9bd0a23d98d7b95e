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
 */

//! Backend error bodies.
//!
//! The meetings backend answers failures with a small JSON object. Depending
//! on the endpoint the human-readable text lives in `detail`, `message` or
//! `error`; all three are optional.

use serde::{Deserialize, Serialize};

/// Error payload returned by the meetings backend on non-2xx responses.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct BackendErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendErrorBody {
    /// Parse a raw response body. Bodies that are not JSON objects yield `None`.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// The most specific human-readable message carried by the body.
    pub fn best_message(&self) -> Option<&str> {
        [&self.detail, &self.message, &self.error]
            .into_iter()
            .filter_map(|m| m.as_deref())
            .find(|m| !m.trim().is_empty())
    }
}

/// Extract a display message from a raw error body, falling back to the body
/// itself when it is not a recognised JSON error object.
pub fn message_from_body(body: &str) -> String {
    match BackendErrorBody::parse(body) {
        Some(parsed) => match parsed.best_message() {
            Some(msg) => msg.to_string(),
            None => body.trim().to_string(),
        },
        None => body.trim().to_string(),
    }
}
