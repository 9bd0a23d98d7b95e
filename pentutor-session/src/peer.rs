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

//! The single peer connection of a two-party call.

use async_trait::async_trait;
use pentutor_meeting_types::signaling::{IceCandidate, SessionDescription};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::media::SharedTrack;

pub const DEFAULT_ICE_SERVERS: &[&str] = &[
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    pub ice_servers: Vec<String>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            ice_servers: DEFAULT_ICE_SERVERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Mirrors `RTCPeerConnectionState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Asynchronous callbacks of the peer connection, delivered over the
/// channel passed to [`PeerConnectionFactory::create`].
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// A local ICE candidate to forward to the remote side.
    IceCandidate(IceCandidate),
    /// The remote side started sending media.
    RemoteTrack { stream_id: String },
    StateChanged(PeerState),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("peer connection is closed")]
    Closed,

    #[error("failed to create peer connection: {0}")]
    Create(String),

    /// SDP or ICE processing failed.
    #[error("negotiation failed: {0}")]
    Negotiation(String),
}

#[async_trait]
pub trait PeerConnection: Send + Sync {
    fn add_track(&self, track: SharedTrack) -> Result<(), PeerError>;

    /// Swap the outgoing video track without renegotiating. Adds a video
    /// sender if there was none.
    async fn replace_video_track(&self, track: SharedTrack) -> Result<(), PeerError>;

    async fn set_remote_description(&self, description: SessionDescription)
        -> Result<(), PeerError>;

    /// Create an offer and apply it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription, PeerError>;

    /// Create an answer and apply it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription, PeerError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError>;

    fn close(&self);

    fn is_closed(&self) -> bool;
}

pub trait PeerConnectionFactory: Send + Sync {
    fn create(
        &self,
        config: &PeerConfig,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Box<dyn PeerConnection>, PeerError>;
}
