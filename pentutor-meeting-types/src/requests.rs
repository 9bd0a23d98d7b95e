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

//! Request types for the meetings REST API.
//!
//! These types define the shape of request bodies. They are used by both
//! the backend (for deserialization) and clients (for serialization).

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/meetings/join/{meeting_id}/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JoinMeetingRequest {
    #[serde(rename = "meetingId")]
    pub meeting_id: String,

    /// Only sent for password-protected meetings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Request body for `POST /api/meetings/create/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CreateMeetingRequest {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// RFC 3339 start time. Omitted for instant meetings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    /// `"instant"` or `"scheduled"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_type: Option<String>,
}

impl CreateMeetingRequest {
    /// A meeting that starts as soon as the host joins.
    pub fn instant(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            start_time: None,
            meeting_type: Some("instant".to_string()),
        }
    }

    /// A meeting scheduled for `start_time` (RFC 3339).
    pub fn scheduled(title: &str, start_time: &str) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            start_time: Some(start_time.to_string()),
            meeting_type: Some("scheduled".to_string()),
        }
    }
}
