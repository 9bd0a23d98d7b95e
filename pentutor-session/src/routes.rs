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

//! Route protection.

use pentutor_meeting_types::user::Role;

use crate::auth::Credentials;

/// Authentication entry point.
pub const AUTH_PATH: &str = "/auth";

/// Paths that need a signed-in user.
const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/tutor", "/student", "/meetings"];

/// Paths reserved for one role.
const ROLE_PREFIXES: &[(&str, Role)] = &[("/tutor", Role::Tutor), ("/student", Role::Student)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

/// Decide whether `path` may render for the given credentials.
///
/// - `/` goes to the caller's dashboard, or to [`AUTH_PATH`] when signed out.
/// - Protected paths without credentials go to [`AUTH_PATH`].
/// - A role-reserved path opened by the other role goes to that user's
///   own dashboard.
pub fn guard(path: &str, credentials: Option<&Credentials>) -> RouteDecision {
    let path = path.split(['?', '#']).next().unwrap_or(path);

    if path.is_empty() || path == "/" {
        return match credentials {
            Some(creds) => RouteDecision::Redirect(creds.user.role().landing_path().to_string()),
            None => RouteDecision::Redirect(AUTH_PATH.to_string()),
        };
    }

    let protected = PROTECTED_PREFIXES.iter().any(|p| under(path, p));
    let Some(creds) = credentials else {
        return if protected {
            log::debug!("{path} requires sign-in");
            RouteDecision::Redirect(AUTH_PATH.to_string())
        } else {
            RouteDecision::Allow
        };
    };

    let role = creds.user.role();
    match ROLE_PREFIXES.iter().find(|(p, _)| under(path, p)) {
        Some((_, required)) if *required != role => {
            log::debug!("{path} is reserved for {required}, redirecting {role}");
            RouteDecision::Redirect(role.landing_path().to_string())
        }
        _ => RouteDecision::Allow,
    }
}

/// `path` equals `prefix` or lies below it (`/tutor` covers `/tutor/x`,
/// not `/tutorial`).
fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}
