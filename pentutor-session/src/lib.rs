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
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Client-side meeting session for PenTutor.
//!
//! The centre of this crate is [`MeetingSessionController`], which owns one
//! two-party call from the moment the meeting room mounts until it is torn
//! down. It composes three external resources, each behind a trait so the
//! embedding platform supplies the real implementation:
//!
//! 1. local media capture ([`media::MediaDevices`]),
//! 2. a single peer connection ([`peer::PeerConnectionFactory`]),
//! 3. the signaling channel ([`signaling::SignalingConnector`]).
//!
//! Around it sit the pieces the room depends on: the explicit
//! [`auth::AuthContext`] that replaces ambient token storage, the pre-room
//! [`join::JoinFlow`], route guarding, and the dashboard data layer.

pub mod auth;
pub mod backend;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod join;
pub mod media;
pub mod model;
pub mod peer;
pub mod routes;
pub mod signaling;
pub mod timer;

pub use auth::{AuthContext, Credentials};
pub use backend::MeetingBackend;
pub use config::ClientConfig;
pub use controller::{MeetingSessionController, SessionDeps};
pub use error::SessionError;
pub use events::{Notice, NoticeLevel, SessionEvent};
pub use join::{JoinFlow, JoinState};
pub use model::{ChatEntry, ConnectionStatus, MediaFlags, MeetingSession};
