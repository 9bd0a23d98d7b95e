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

//! Authenticated user model.
//!
//! The authentication backend issues the tokens and the user record; this
//! crate only defines their shape. The role gates which dashboard a user
//! lands on and whether they may end a meeting for everyone.

use serde::{Deserialize, Serialize};

/// Platform role of an authenticated user.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Tutor,
}

impl Role {
    /// Landing page for this role after leaving a meeting.
    pub fn landing_path(self) -> &'static str {
        match self {
            Role::Student => "/student/dashboard",
            Role::Tutor => "/tutor/dashboard",
        }
    }

    /// Only tutors may end a meeting for all participants.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Tutor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record as stored alongside the bearer token.
///
/// Older clients persisted the role as `userType`; both spellings are
/// accepted and a missing role defaults to [`Role::Student`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "userType", alias = "role")]
    pub user_type: Role,
}

impl User {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            id: None,
            username: username.to_string(),
            first_name: None,
            email: None,
            user_type: role,
        }
    }

    pub fn role(&self) -> Role {
        self.user_type
    }

    /// The id as text, whether the backend sent a number or a string.
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Label shown next to this user's chat messages.
    pub fn display_label(&self) -> String {
        self.first_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(Some(self.username.as_str()).filter(|n| !n.trim().is_empty()))
            .unwrap_or("You")
            .to_string()
    }
}

/// Access/refresh token pair issued by the authentication backend.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}
