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

//! Typed REST client for the PenTutor meetings backend.
//!
//! # Example
//!
//! ```no_run
//! use pentutor_meeting_client::MeetingApiClient;
//!
//! # async fn example() -> Result<(), pentutor_meeting_client::ApiError> {
//! let client = MeetingApiClient::new("http://localhost:8000", "eyJ...")?;
//!
//! let participants = client.list_participants("m1").await?;
//! println!("{} participant(s) in the room", participants.participants.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod meetings;
pub mod participants;
pub mod recordings;

pub use error::ApiError;
pub use pentutor_meeting_types;

use std::time::Duration;

use pentutor_meeting_types::error::message_from_body;
use reqwest::Client;

/// Client-side deadline for `POST /api/meetings/join/<id>/`.
pub const JOIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// A typed REST client for the meetings backend.
///
/// Every request carries `Authorization: Bearer <token>`. Non-success
/// responses are mapped to [`ApiError`] by status code.
#[derive(Debug, Clone)]
pub struct MeetingApiClient {
    base_url: String,
    token: String,
    join_timeout: Duration,
    http: Client,
}

impl MeetingApiClient {
    /// Create a new client pointing at the given backend base URL,
    /// e.g. `"http://localhost:8000"`.
    pub fn new(base_url: &str, token: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::Config("base URL is empty".to_string()));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            token: token.to_string(),
            join_timeout: JOIN_REQUEST_TIMEOUT,
            http: Client::new(),
        })
    }

    /// Override the join request deadline.
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Replace the bearer token (e.g. after a token refresh).
    pub fn set_bearer_token(&mut self, token: String) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.post(self.url(path)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", self.token),
        )
    }
}

/// Map a non-success status and its body to an [`ApiError`].
fn status_error(status: u16, body: &str) -> ApiError {
    let message = message_from_body(body);
    match status {
        401 => ApiError::NotAuthenticated,
        403 => ApiError::Forbidden(message),
        404 => ApiError::NotFound(message),
        410 => ApiError::Expired(message),
        _ => ApiError::ServerError {
            status,
            body: body.to_string(),
        },
    }
}

async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    log::warn!("meetings API returned {status}: {text}");
    status_error(status, &text)
}

/// Parse a JSON body, returning `T` on 2xx or mapping the error to [`ApiError`].
pub(crate) async fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(error_from_response(response).await)
    }
}

/// Parse a response where we only care about the status code, not the body.
pub(crate) async fn parse_status_only(response: reqwest::Response) -> Result<(), ApiError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(response).await)
    }
}

/// Read a binary body on 2xx.
pub(crate) async fn parse_bytes(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    if response.status().is_success() {
        Ok(response.bytes().await?.to_vec())
    } else {
        Err(error_from_response(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_uses_backend_detail() {
        match status_error(404, r#"{"detail":"No such meeting"}"#) {
            ApiError::NotFound(msg) => assert_eq!(msg, "No such meeting"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(status_error(401, ""), ApiError::NotAuthenticated));
        assert!(matches!(status_error(410, ""), ApiError::Expired(_)));
        assert!(matches!(
            status_error(502, "Bad Gateway"),
            ApiError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            MeetingApiClient::new("  ", "t"),
            Err(ApiError::Config(_))
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = MeetingApiClient::new("http://localhost:8000/", "t").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
