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

//! Framework-agnostic events emitted by a meeting session.
//!
//! Each controller owns its own broadcast channel; the UI subscribes with
//! [`MeetingSessionController::subscribe`](crate::MeetingSessionController::subscribe)
//! and renders toasts, navigation and remote state from what arrives.

use async_broadcast::{broadcast, InactiveReceiver, Receiver, Sender};
use pentutor_meeting_types::responses::Participant;

use crate::model::{ChatEntry, ConnectionStatus, MediaFlags};

/// Capacity of a session's event channel.
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-visible toast or banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Events emitted by a [`MeetingSessionController`](crate::MeetingSessionController).
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    // === Lifecycle ===
    StatusChanged(ConnectionStatus),

    /// Toast/banner for the user.
    Notice(Notice),

    /// The session is done with this page; go to the given path.
    Navigate(String),

    /// Elapsed seconds since the session connected, once per second.
    DurationTick(u64),

    // === Local media ===
    LocalMediaChanged(MediaFlags),
    ScreenShareChanged(bool),

    // === Remote side ===
    ParticipantJoined(Participant),
    ParticipantLeft(Option<String>),
    RemoteMediaState {
        user_id: Option<String>,
        video: bool,
        audio: bool,
    },
    /// The peer connection produced a remote stream to render.
    RemoteStreamAttached { stream_id: String },
    /// The remote video surface should be cleared.
    RemoteVideoCleared,

    ChatReceived(ChatEntry),
}

/// Sending half of a session's event channel.
///
/// Emitting never blocks: when the channel is full the oldest event is
/// dropped. An inactive receiver keeps the channel open while nobody is
/// subscribed.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<SessionEvent>,
    _keepalive: InactiveReceiver<SessionEvent>,
}

impl EventSender {
    pub fn new() -> Self {
        let (mut tx, rx) = broadcast(EVENT_CAPACITY);
        tx.set_overflow(true);
        Self {
            tx,
            _keepalive: rx.deactivate(),
        }
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.try_broadcast(event);
    }

    pub fn notice(&self, notice: Notice) {
        self.emit(SessionEvent::Notice(notice));
    }

    /// Receive all events emitted from now on.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.tx.new_receiver()
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_events_emitted_after_subscribing() {
        let events = EventSender::new();
        events.emit(SessionEvent::RemoteVideoCleared);

        let mut rx = events.subscribe();
        events.notice(Notice::info("hello"));

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Notice(Notice::info("hello"))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_channel_drops_oldest() {
        let events = EventSender::new();
        let mut rx = events.subscribe();
        for i in 0..(EVENT_CAPACITY as u64 + 10) {
            events.emit(SessionEvent::DurationTick(i));
        }
        assert!(matches!(
            rx.try_recv(),
            Err(async_broadcast::TryRecvError::Overflowed(10))
        ));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::DurationTick(10));
    }
}
