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

//! Meeting endpoints: create, list.

use pentutor_meeting_types::{
    requests::CreateMeetingRequest,
    responses::{CreateMeetingResponse, ListResponse, MeetingSummary},
};

use crate::error::ApiError;
use crate::{parse_json_response, MeetingApiClient};

impl MeetingApiClient {
    /// Create a new meeting. The authenticated user becomes the host.
    ///
    /// Calls `POST /api/meetings/create/`.
    pub async fn create_meeting(
        &self,
        request: &CreateMeetingRequest,
    ) -> Result<CreateMeetingResponse, ApiError> {
        let response = self
            .post("/api/meetings/create/")
            .json(request)
            .send()
            .await?;
        parse_json_response(response).await
    }

    /// List meetings visible to the authenticated user.
    ///
    /// Calls `GET /api/meetings/`. Both bare and paginated bodies are accepted.
    pub async fn list_meetings(&self) -> Result<Vec<MeetingSummary>, ApiError> {
        let response = self.get("/api/meetings/").send().await?;
        let list: ListResponse<MeetingSummary> = parse_json_response(response).await?;
        Ok(list.into_vec())
    }
}
