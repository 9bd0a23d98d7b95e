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

//! Session-level error taxonomy.
//!
//! Lower layers report [`ApiError`], [`TransportError`], [`MediaError`] and
//! [`PeerError`]; they are folded into [`SessionError`] here so the UI only
//! has one type to render. Every variant has a plain-language
//! [`user_message`](SessionError::user_message).

use pentutor_meeting_client::ApiError;
use pentutor_transport::TransportError;
use thiserror::Error;

use crate::media::MediaError;
use crate::peer::PeerError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No credentials, or the backend rejected the token.
    #[error("authentication required")]
    AuthenticationRequired,

    /// Role or meeting membership does not allow the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("meeting not found: {0}")]
    NotFound(String),

    /// The meeting has ended or expired.
    #[error("meeting expired: {0}")]
    Expired(String),

    #[error("request timed out")]
    Timeout,

    /// Camera, microphone or display capture was refused.
    #[error("media access denied: {0}")]
    MediaAccessDenied(String),

    /// Capture succeeded but did not produce a usable track.
    #[error("media unavailable: {0}")]
    MediaUnavailable(String),

    #[error("signaling error: {0}")]
    Signaling(String),

    #[error("peer connection error: {0}")]
    PeerConnection(String),

    /// A control was used while the session is not connected.
    #[error("session is not connected")]
    NotConnected,

    #[error("giving up after {attempts} join attempts")]
    RetriesExhausted { attempts: u32 },

    /// Any other backend failure, with its message.
    #[error("backend error: {0}")]
    Api(String),
}

impl SessionError {
    /// Text shown to the user in a toast or banner.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::AuthenticationRequired => {
                "Authentication required. Please log in again.".to_string()
            }
            SessionError::PermissionDenied(_) => {
                "You don't have permission to join this meeting".to_string()
            }
            SessionError::NotFound(_) => "Meeting not found or has ended".to_string(),
            SessionError::Expired(_) => "This meeting has expired".to_string(),
            SessionError::Timeout => {
                "Connection timeout. Please check your internet connection.".to_string()
            }
            SessionError::MediaAccessDenied(_) => {
                "Failed to access camera/microphone. Please check permissions.".to_string()
            }
            SessionError::MediaUnavailable(detail) => format!("Media unavailable: {detail}"),
            SessionError::Signaling(_) => {
                "Lost connection to the meeting server. Chat and media updates may not reach other participants."
                    .to_string()
            }
            SessionError::PeerConnection(_) => "Peer connection failed".to_string(),
            SessionError::NotConnected => "You are not connected to the meeting.".to_string(),
            SessionError::RetriesExhausted { .. } => {
                "Unable to join the meeting after several attempts. Please try again later."
                    .to_string()
            }
            SessionError::Api(detail) if !detail.trim().is_empty() => detail.clone(),
            SessionError::Api(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Errors tied to the meeting itself rather than the network.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionError::AuthenticationRequired
                | SessionError::PermissionDenied(_)
                | SessionError::NotFound(_)
                | SessionError::Expired(_)
        )
    }
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotAuthenticated => SessionError::AuthenticationRequired,
            ApiError::Forbidden(msg) => SessionError::PermissionDenied(msg),
            ApiError::NotFound(msg) => SessionError::NotFound(msg),
            ApiError::Expired(msg) => SessionError::Expired(msg),
            ApiError::Timeout => SessionError::Timeout,
            ApiError::ServerError { status, .. } => {
                SessionError::Api(format!("Failed to load meeting: {status}"))
            }
            ApiError::Network(e) => SessionError::Api(format!(
                "Unable to connect to server. Please check your internet connection. ({e})"
            )),
            ApiError::Config(msg) => SessionError::Api(msg),
        }
    }
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        match err.http_status() {
            Some(401) => SessionError::AuthenticationRequired,
            Some(403) => SessionError::PermissionDenied(err.to_string()),
            Some(404) => SessionError::NotFound(err.to_string()),
            Some(410) => SessionError::Expired(err.to_string()),
            _ => SessionError::Signaling(err.to_string()),
        }
    }
}

impl From<MediaError> for SessionError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::PermissionDenied(msg) => SessionError::MediaAccessDenied(msg),
            other => SessionError::MediaUnavailable(other.to_string()),
        }
    }
}

impl From<PeerError> for SessionError {
    fn from(err: PeerError) -> Self {
        SessionError::PeerConnection(err.to_string())
    }
}
