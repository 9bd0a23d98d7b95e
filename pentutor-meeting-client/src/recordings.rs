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

//! Recording endpoints.

use pentutor_meeting_types::responses::{ListResponse, Recording};

use crate::error::ApiError;
use crate::{parse_bytes, parse_json_response, MeetingApiClient};

impl MeetingApiClient {
    /// Calls `GET /api/meetings/recordings/`.
    pub async fn list_recordings(&self) -> Result<Vec<Recording>, ApiError> {
        let response = self.get("/api/meetings/recordings/").send().await?;
        let list: ListResponse<Recording> = parse_json_response(response).await?;
        Ok(list.into_vec())
    }

    /// Download the recording of a meeting as raw bytes.
    ///
    /// Calls `GET /api/meetings/download-recording/{meeting_id}/`.
    pub async fn download_recording(&self, meeting_id: &str) -> Result<Vec<u8>, ApiError> {
        let path = format!("/api/meetings/download-recording/{meeting_id}/");
        let response = self.get(&path).send().await?;
        let bytes = parse_bytes(response).await?;
        log::info!("downloaded recording for {meeting_id} ({} bytes)", bytes.len());
        Ok(bytes)
    }
}
