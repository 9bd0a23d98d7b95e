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

//! Pre-room join flow.
//!
//! Registers the user as a participant before the room mounts. A single
//! attempt is bounded by the configured join timeout; retries are triggered
//! by the user and back off exponentially (1s, 2s, 4s, ...).

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use pentutor_meeting_types::responses::JoinMeetingResponse;

use crate::backend::MeetingBackend;
use crate::config::ClientConfig;
use crate::error::SessionError;

/// Where the "Go back" button leads.
pub const GO_BACK_PATH: &str = "/dashboard";

/// Path of the meeting room for `meeting_id`.
pub fn room_path(meeting_id: &str) -> String {
    format!("/meetings/room/{meeting_id}")
}

/// Delay before retry number `retry_count + 1`.
pub fn backoff_delay(retry_count: u32) -> Duration {
    Duration::from_secs(1u64 << retry_count.min(16))
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinState {
    Idle,
    Joining,
    /// Waiting out the backoff before attempt `attempt`.
    Retrying { attempt: u32 },
    Joined(JoinMeetingResponse),
    Error(SessionError),
}

pub struct JoinFlow {
    meeting_id: String,
    password: Option<String>,
    backend: Arc<dyn MeetingBackend>,
    timeout: Duration,
    max_retries: u32,
    retry_count: u32,
    state: JoinState,
}

impl JoinFlow {
    pub fn new(meeting_id: &str, backend: Arc<dyn MeetingBackend>, config: &ClientConfig) -> Self {
        Self {
            meeting_id: meeting_id.to_string(),
            password: None,
            backend,
            timeout: config.join_timeout,
            max_retries: config.join_max_retries,
            retry_count: 0,
            state: JoinState::Idle,
        }
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn state(&self) -> &JoinState {
        &self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn can_retry(&self) -> bool {
        matches!(self.state, JoinState::Error(_)) && self.retry_count < self.max_retries
    }

    /// Room path once joined.
    pub fn next_path(&self) -> Option<String> {
        match self.state {
            JoinState::Joined(_) => Some(room_path(&self.meeting_id)),
            _ => None,
        }
    }

    /// First join attempt.
    pub async fn join(&mut self) -> Result<JoinMeetingResponse, SessionError> {
        self.attempt().await
    }

    /// Retry after a failed attempt, waiting `2^retry_count` seconds first.
    pub async fn retry(&mut self) -> Result<JoinMeetingResponse, SessionError> {
        if self.retry_count >= self.max_retries {
            let err = SessionError::RetriesExhausted {
                attempts: self.retry_count + 1,
            };
            warn!("meeting {}: {err}", self.meeting_id);
            self.state = JoinState::Error(err.clone());
            return Err(err);
        }
        let delay = backoff_delay(self.retry_count);
        self.retry_count += 1;
        self.state = JoinState::Retrying {
            attempt: self.retry_count + 1,
        };
        info!(
            "meeting {}: retrying join in {}s (retry {} of {})",
            self.meeting_id,
            delay.as_secs(),
            self.retry_count,
            self.max_retries
        );
        tokio::time::sleep(delay).await;
        self.attempt().await
    }

    async fn attempt(&mut self) -> Result<JoinMeetingResponse, SessionError> {
        self.state = JoinState::Joining;
        let request = self
            .backend
            .join_meeting(&self.meeting_id, self.password.as_deref());
        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(SessionError::from(e)),
            Err(_) => Err(SessionError::Timeout),
        };
        match &result {
            Ok(response) => {
                info!(
                    "meeting {}: joined ({} participant(s))",
                    self.meeting_id, response.participant_count
                );
                self.state = JoinState::Joined(response.clone());
            }
            Err(e) => {
                warn!("meeting {}: join failed: {e}", self.meeting_id);
                self.state = JoinState::Error(e.clone());
            }
        }
        result
    }
}
