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

//! The meetings backend calls a session depends on.

use async_trait::async_trait;
use pentutor_meeting_client::{ApiError, MeetingApiClient};
use pentutor_meeting_types::responses::{JoinMeetingResponse, ParticipantsResponse};

#[async_trait]
pub trait MeetingBackend: Send + Sync {
    async fn list_participants(&self, meeting_id: &str) -> Result<ParticipantsResponse, ApiError>;

    async fn join_meeting(
        &self,
        meeting_id: &str,
        password: Option<&str>,
    ) -> Result<JoinMeetingResponse, ApiError>;

    async fn end_meeting(&self, meeting_id: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl MeetingBackend for MeetingApiClient {
    async fn list_participants(&self, meeting_id: &str) -> Result<ParticipantsResponse, ApiError> {
        MeetingApiClient::list_participants(self, meeting_id).await
    }

    async fn join_meeting(
        &self,
        meeting_id: &str,
        password: Option<&str>,
    ) -> Result<JoinMeetingResponse, ApiError> {
        MeetingApiClient::join_meeting(self, meeting_id, password).await
    }

    async fn end_meeting(&self, meeting_id: &str) -> Result<(), ApiError> {
        MeetingApiClient::end_meeting(self, meeting_id).await
    }
}
