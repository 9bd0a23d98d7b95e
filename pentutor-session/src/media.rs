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

//! Local media capture.
//!
//! The platform provides [`MediaDevices`] (camera, microphone and display
//! capture) and the [`MediaTrack`]s it hands out. Tracks use interior
//! mutability: disabling a track keeps the device open, stopping it
//! releases the device for good.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Device a track was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    Camera,
    Microphone,
    Screen,
}

/// Called once when a track ends on its own, e.g. the user pressed
/// "Stop sharing" in the browser chrome.
pub type EndedCallback = Box<dyn FnOnce() + Send + 'static>;

pub trait MediaTrack: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;
    fn kind(&self) -> TrackKind;
    fn source(&self) -> TrackSource;
    fn is_enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
    /// Release the underlying device. Idempotent.
    fn stop(&self);
    /// `false` once stopped locally or ended by the platform.
    fn is_live(&self) -> bool;
    fn on_ended(&self, callback: EndedCallback);
}

pub type SharedTrack = Arc<dyn MediaTrack>;

/// A set of captured tracks.
#[derive(Debug, Clone, Default)]
pub struct MediaStream {
    tracks: Vec<SharedTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<SharedTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[SharedTrack] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn video_track(&self) -> Option<&SharedTrack> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Video)
    }

    pub fn audio_track(&self) -> Option<&SharedTrack> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Audio)
    }

    /// Swap the video track, returning the one it replaced.
    pub fn replace_video(&mut self, track: SharedTrack) -> Option<SharedTrack> {
        let old = self
            .tracks
            .iter()
            .position(|t| t.kind() == TrackKind::Video)
            .map(|i| self.tracks.remove(i));
        self.tracks.push(track);
        old
    }

    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn live_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// What to ask of `getUserMedia`. `None` means the kind is not requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: Option<VideoConstraints>,
    pub audio: Option<AudioConstraints>,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: Some(VideoConstraints::default()),
            audio: Some(AudioConstraints::default()),
        }
    }
}

impl MediaConstraints {
    /// Camera without microphone; used to get the camera back after
    /// screen sharing.
    pub fn camera_only() -> Self {
        Self {
            video: Some(VideoConstraints::default()),
            audio: None,
        }
    }
}

/// What to ask of `getDisplayMedia`. Display audio is not forwarded, so
/// it is not requested by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayConstraints {
    pub audio: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The user or the platform refused the permission prompt.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("no matching device: {0}")]
    NotFound(String),

    /// Capture started but was aborted or the device is busy.
    #[error("capture failed: {0}")]
    Aborted(String),
}

#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(&self, constraints: &MediaConstraints)
        -> Result<MediaStream, MediaError>;

    async fn get_display_media(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<MediaStream, MediaError>;
}
