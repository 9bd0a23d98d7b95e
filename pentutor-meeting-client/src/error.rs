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

//! Error types for the meeting API client.

use thiserror::Error;

/// Errors returned by [`MeetingApiClient`](crate::MeetingApiClient) methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The bearer token is missing, expired, or invalid (HTTP 401).
    #[error("Not authenticated. Please log in.")]
    NotAuthenticated,

    /// The server denied access (HTTP 403).
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The requested meeting or recording does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The meeting has ended or expired (HTTP 410).
    #[error("Expired: {0}")]
    Expired(String),

    /// The request exceeded its client-side deadline.
    #[error("Request timed out")]
    Timeout,

    /// Any other non-success status, with the raw body.
    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    /// A network, transport or decoding error.
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// A configuration error (e.g. an empty base URL).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status this error was derived from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotAuthenticated => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Expired(_) => Some(410),
            ApiError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }
}
