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

//! Participant endpoints: list participants, join, end.

use pentutor_meeting_types::{
    requests::JoinMeetingRequest,
    responses::{JoinMeetingResponse, ParticipantsResponse},
};

use crate::error::ApiError;
use crate::{parse_json_response, parse_status_only, MeetingApiClient};

impl MeetingApiClient {
    /// List the participants of a meeting.
    ///
    /// Calls `GET /api/meetings/{meeting_id}/participants/`.
    pub async fn list_participants(
        &self,
        meeting_id: &str,
    ) -> Result<ParticipantsResponse, ApiError> {
        let path = format!("/api/meetings/{meeting_id}/participants/");
        log::debug!("GET {path}");
        let response = self.get(&path).send().await?;
        parse_json_response(response).await
    }

    /// Ask the backend to admit the caller to a meeting.
    ///
    /// Calls `POST /api/meetings/join/{meeting_id}/`. The request is aborted
    /// after the join timeout and reported as [`ApiError::Timeout`].
    pub async fn join_meeting(
        &self,
        meeting_id: &str,
        password: Option<&str>,
    ) -> Result<JoinMeetingResponse, ApiError> {
        let path = format!("/api/meetings/join/{meeting_id}/");
        let body = JoinMeetingRequest {
            meeting_id: meeting_id.to_string(),
            password: password.map(|p| p.to_string()),
        };
        log::debug!("POST {path}");
        let response = self
            .post(&path)
            .timeout(self.join_timeout)
            .json(&body)
            .send()
            .await?;
        parse_json_response(response).await
    }

    /// End a meeting for every participant. Tutors only.
    ///
    /// Calls `POST /api/meetings/end/{meeting_id}/`.
    pub async fn end_meeting(&self, meeting_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/meetings/end/{meeting_id}/");
        log::debug!("POST {path}");
        let response = self.post(&path).send().await?;
        parse_status_only(response).await
    }
}
