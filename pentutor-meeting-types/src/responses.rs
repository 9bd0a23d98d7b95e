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

//! Response types for the meetings REST API.
//!
//! The backend is lenient about naming (snake_case with the occasional
//! camelCase field) and about identifiers (numbers or strings), so the
//! deserializers here accept both.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Accept an identifier serialized either as a JSON string or a number.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn default_true() -> bool {
    true
}

/// List endpoints return either a bare array or a paginated `{ "results": [...] }`
/// object depending on backend configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paginated { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Paginated { results } => results,
            ListResponse::Bare(items) => items,
        }
    }
}

// ---------------------------------------------------------------------------
// Meetings
// ---------------------------------------------------------------------------

/// Lifecycle state of a meeting record as reported by the backend.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Scheduled,
    Active,
    Ended,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Meeting record embedded in participants, join and create responses.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MeetingInfo {
    #[serde(alias = "id", deserialize_with = "id_string")]
    pub meeting_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: MeetingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// RFC 3339; absent for instant meetings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
}

/// Single entry of `GET /api/meetings/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MeetingSummary {
    #[serde(alias = "id", deserialize_with = "id_string")]
    pub meeting_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: MeetingStatus,
    /// RFC 3339; absent for instant meetings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub participants_count: u32,
    #[serde(default)]
    pub duration_minutes: u32,
}

/// Response payload for `POST /api/meetings/create/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CreateMeetingResponse {
    #[serde(deserialize_with = "id_string")]
    pub meeting_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting: Option<MeetingInfo>,
}

/// Response payload for `POST /api/meetings/join/{meeting_id}/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JoinMeetingResponse {
    #[serde(default, alias = "participantCount")]
    pub participant_count: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting: Option<MeetingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// A participant as listed by `GET /api/meetings/{meeting_id}/participants/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Participant {
    #[serde(alias = "user_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, alias = "displayName", alias = "name", alias = "username")]
    pub display_name: String,
    #[serde(
        default,
        alias = "avatar_url",
        alias = "profile_picture",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar: Option<String>,
    #[serde(default = "default_true", alias = "videoEnabled")]
    pub video_enabled: bool,
    #[serde(default = "default_true", alias = "audioEnabled")]
    pub audio_enabled: bool,
}

/// Response payload for `GET /api/meetings/{meeting_id}/participants/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ParticipantsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting: Option<MeetingInfo>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

// ---------------------------------------------------------------------------
// Recordings
// ---------------------------------------------------------------------------

/// Single entry of `GET /api/meetings/recordings/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recording {
    #[serde(deserialize_with = "id_string")]
    pub meeting_id: String,
    #[serde(default)]
    pub meeting_title: String,
    /// Length in minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}
