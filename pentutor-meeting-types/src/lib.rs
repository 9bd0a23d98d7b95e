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

//! Shared API types for the PenTutor meeting backend.
//!
//! This crate defines the contract between the meetings backend (REST and
//! WebSocket signaling) and the session client. It is intentionally
//! framework-agnostic: no HTTP client, no runtime, only serde shapes.

pub mod error;
pub mod requests;
pub mod responses;
pub mod signaling;
pub mod user;

pub use error::BackendErrorBody;
pub use signaling::{SignalDecodeError, SignalMessage};
pub use user::{Role, User};
