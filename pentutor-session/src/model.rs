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

//! State of one attempted call.

use chrono::{DateTime, Local, Utc};
use pentutor_meeting_types::responses::{MeetingInfo, Participant};
use pentutor_meeting_types::signaling::ChatPayload;
use tokio::time::Instant;

/// Connection lifecycle of a [`MeetingSession`].
///
/// ```text
/// Connecting ──► Connected ──► Ended
///     │                          ▲
///     ├──────────────────────────┘
///     └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Failed,
    Ended,
}

impl ConnectionStatus {
    pub fn can_transition_to(self, next: ConnectionStatus) -> bool {
        use ConnectionStatus::*;
        matches!(
            (self, next),
            (Connecting, Connected) | (Connecting, Failed) | (Connecting, Ended) | (Connected, Ended)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionStatus::Failed | ConnectionStatus::Ended)
    }
}

/// Local camera/microphone flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaFlags {
    pub video: bool,
    pub audio: bool,
}

/// One line of the in-call chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub sender_label: String,
    pub text: String,
    /// Wall-clock time as shown to the user, e.g. `"14:03:27"`.
    pub timestamp: String,
    pub received_at: DateTime<Utc>,
    pub is_local: bool,
}

impl ChatEntry {
    pub fn local(sender_label: &str, text: &str) -> Self {
        let now = Utc::now();
        Self {
            sender_label: sender_label.to_string(),
            text: text.to_string(),
            timestamp: display_time(now),
            received_at: now,
            is_local: true,
        }
    }

    /// Entry for a message relayed by the signaling server. Missing sender
    /// or timestamp fields are filled in locally.
    pub fn remote(payload: ChatPayload) -> Self {
        let now = Utc::now();
        let sender_label = if payload.sender.trim().is_empty() {
            "Participant".to_string()
        } else {
            payload.sender
        };
        let timestamp = if payload.timestamp.trim().is_empty() {
            display_time(now)
        } else {
            payload.timestamp
        };
        Self {
            sender_label,
            text: payload.message,
            timestamp,
            received_at: now,
            is_local: false,
        }
    }

    pub fn to_payload(&self) -> ChatPayload {
        ChatPayload {
            sender: self.sender_label.clone(),
            message: self.text.clone(),
            timestamp: self.timestamp.clone(),
        }
    }
}

fn display_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// One active or attempted call.
///
/// Created when the meeting room mounts; never reused after reaching a
/// terminal status.
#[derive(Debug, Clone)]
pub struct MeetingSession {
    meeting_id: String,
    access_token: String,
    status: ConnectionStatus,
    meeting: Option<MeetingInfo>,
    local_media: MediaFlags,
    is_screen_sharing: bool,
    participants: Vec<Participant>,
    chat_log: Vec<ChatEntry>,
    error: Option<String>,
    connected_at: Option<Instant>,
    ended_at: Option<Instant>,
}

impl MeetingSession {
    pub fn new(meeting_id: &str, access_token: &str) -> Self {
        Self {
            meeting_id: meeting_id.to_string(),
            access_token: access_token.to_string(),
            status: ConnectionStatus::Connecting,
            meeting: None,
            local_media: MediaFlags::default(),
            is_screen_sharing: false,
            participants: Vec::new(),
            chat_log: Vec::new(),
            error: None,
            connected_at: None,
            ended_at: None,
        }
    }

    pub fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn meeting(&self) -> Option<&MeetingInfo> {
        self.meeting.as_ref()
    }

    pub fn local_media(&self) -> MediaFlags {
        self.local_media
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.is_screen_sharing
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn chat_log(&self) -> &[ChatEntry] {
        &self.chat_log
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whole seconds since the session connected; frozen once it ends.
    pub fn duration_seconds(&self) -> u64 {
        match self.connected_at {
            Some(start) => {
                let end = self.ended_at.unwrap_or_else(Instant::now);
                end.saturating_duration_since(start).as_secs()
            }
            None => 0,
        }
    }

    /// Apply a status transition. Transitions outside the lifecycle graph
    /// are logged and ignored.
    pub(crate) fn transition(&mut self, next: ConnectionStatus) -> bool {
        if !self.status.can_transition_to(next) {
            log::warn!(
                "meeting {}: ignoring transition {:?} -> {:?}",
                self.meeting_id,
                self.status,
                next
            );
            return false;
        }
        log::info!(
            "meeting {}: {:?} -> {:?}",
            self.meeting_id,
            self.status,
            next
        );
        self.status = next;
        match next {
            ConnectionStatus::Connected => self.connected_at = Some(Instant::now()),
            ConnectionStatus::Ended => self.mark_stopped(),
            _ => {}
        }
        true
    }

    pub(crate) fn fail(&mut self, message: String) -> bool {
        let moved = self.transition(ConnectionStatus::Failed);
        if moved {
            self.error = Some(message);
        }
        moved
    }

    /// Freeze the duration clock.
    pub(crate) fn mark_stopped(&mut self) {
        if self.connected_at.is_some() && self.ended_at.is_none() {
            self.ended_at = Some(Instant::now());
        }
    }

    pub(crate) fn set_meeting(&mut self, meeting: Option<MeetingInfo>) {
        self.meeting = meeting;
    }

    pub(crate) fn set_local_media(&mut self, flags: MediaFlags) {
        self.local_media = flags;
    }

    pub(crate) fn set_screen_sharing(&mut self, sharing: bool) {
        self.is_screen_sharing = sharing;
    }

    pub(crate) fn set_participants(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }

    /// Adds the participant unless one with the same id is already listed.
    pub(crate) fn add_participant(&mut self, participant: Participant) -> bool {
        if self.participants.iter().any(|p| p.id == participant.id) {
            return false;
        }
        self.participants.push(participant);
        true
    }

    pub(crate) fn remove_participant(&mut self, id: &str) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id == id)?;
        Some(self.participants.remove(index))
    }

    pub(crate) fn update_participant_media(&mut self, id: &str, video: bool, audio: bool) -> bool {
        match self.participants.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.video_enabled = video;
                p.audio_enabled = audio;
                true
            }
            None => false,
        }
    }

    pub(crate) fn push_chat(&mut self, entry: ChatEntry) {
        self.chat_log.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionStatus::*;

    #[test]
    fn only_forward_transitions_are_allowed() {
        let all = [Connecting, Connected, Failed, Ended];
        let allowed = [
            (Connecting, Connected),
            (Connecting, Failed),
            (Connecting, Ended),
            (Connected, Ended),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn failed_session_keeps_message_and_rejects_reconnect() {
        let mut session = MeetingSession::new("m1", "t");
        assert!(session.fail("This meeting has expired".into()));
        assert_eq!(session.error(), Some("This meeting has expired"));
        assert!(!session.transition(Connected));
        assert!(!session.transition(Connecting));
        assert_eq!(session.status(), Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn duration_counts_from_connect_and_freezes_on_end() {
        let mut session = MeetingSession::new("m1", "t");
        tokio::time::advance(std::time::Duration::from_secs(5)).await;
        assert_eq!(session.duration_seconds(), 0);

        session.transition(Connected);
        tokio::time::advance(std::time::Duration::from_secs(3)).await;
        assert_eq!(session.duration_seconds(), 3);

        session.transition(Ended);
        tokio::time::advance(std::time::Duration::from_secs(10)).await;
        assert_eq!(session.duration_seconds(), 3);
    }

    #[test]
    fn remote_chat_fills_missing_fields() {
        let entry = ChatEntry::remote(ChatPayload {
            sender: String::new(),
            message: "hi".into(),
            timestamp: String::new(),
        });
        assert_eq!(entry.sender_label, "Participant");
        assert!(!entry.timestamp.is_empty());
        assert!(!entry.is_local);
    }
}
