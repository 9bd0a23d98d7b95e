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

//! The meeting session controller.
//!
//! One controller drives one [`MeetingSession`] from the moment the room
//! mounts until teardown. All mutation happens through `&mut self`, so the
//! state machine is single-threaded; asynchronous inputs (signaling frames,
//! peer callbacks, a screen track ending, logout) are queued on channels and
//! applied one at a time by [`MeetingSessionController::next_event`].
//!
//! # Example
//!
//! ```no_run
//! # use pentutor_session::{AuthContext, ClientConfig, MeetingSessionController, SessionDeps};
//! # async fn run(auth: AuthContext, deps: SessionDeps) -> Result<(), pentutor_session::SessionError> {
//! let mut controller =
//!     MeetingSessionController::new("m1", &auth, ClientConfig::default(), deps)?;
//! let mut events = controller.subscribe();
//! controller.start().await?;
//! while controller.next_event().await {
//!     while let Ok(event) = events.try_recv() {
//!         println!("{event:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_broadcast::Receiver;
use log::{debug, error, info, warn};
use pentutor_meeting_types::responses::Participant;
use pentutor_meeting_types::user::User;
use pentutor_meeting_types::SignalMessage;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};

use crate::auth::{AuthContext, Credentials};
use crate::backend::MeetingBackend;
use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::events::{EventSender, Notice, SessionEvent};
use crate::media::{
    DisplayConstraints, MediaConstraints, MediaDevices, MediaStream, SharedTrack, TrackKind,
};
use crate::model::{ChatEntry, ConnectionStatus, MediaFlags, MeetingSession};
use crate::peer::{PeerConnection, PeerConnectionFactory, PeerError, PeerEvent, PeerState};
use crate::routes::AUTH_PATH;
use crate::signaling::{InboundSignals, SignalingChannel, SignalingConnector};
use crate::timer::{format_duration, CallTimer};

/// External resources a session composes.
#[derive(Clone)]
pub struct SessionDeps {
    pub backend: Arc<dyn MeetingBackend>,
    pub media: Arc<dyn MediaDevices>,
    pub peers: Arc<dyn PeerConnectionFactory>,
    pub signaling: Arc<dyn SignalingConnector>,
}

/// Events raised from platform callbacks.
#[derive(Debug)]
enum Internal {
    ScreenTrackEnded(String),
}

/// One queued input, ready to apply.
#[derive(Debug)]
enum Input {
    Internal(Internal),
    Signal(SignalMessage),
    SignalingClosed,
    Peer(PeerEvent),
    AuthChanged { signed_in: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Requested,
    TrackEnded,
}

pub struct MeetingSessionController {
    session: MeetingSession,
    user: User,
    config: ClientConfig,
    deps: SessionDeps,
    events: EventSender,
    auth_rx: Option<watch::Receiver<Option<Credentials>>>,

    /// Camera and microphone; the video track is swapped back in after a
    /// screen share.
    local_stream: MediaStream,
    screen_track: Option<SharedTrack>,

    peer: Option<Box<dyn PeerConnection>>,
    peer_events_tx: mpsc::UnboundedSender<PeerEvent>,
    peer_events_rx: mpsc::UnboundedReceiver<PeerEvent>,

    signaling: Option<Box<dyn SignalingChannel>>,
    inbound: Option<InboundSignals>,

    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,

    timer: Option<CallTimer>,
    started: bool,
    torn_down: bool,
    /// Set once the session has navigated away from the room.
    finished: bool,
}

impl MeetingSessionController {
    /// Create a controller for `meeting_id` on behalf of the signed-in user.
    ///
    /// Fails with [`SessionError::AuthenticationRequired`] when nobody is
    /// signed in.
    pub fn new(
        meeting_id: &str,
        auth: &AuthContext,
        config: ClientConfig,
        deps: SessionDeps,
    ) -> Result<Self, SessionError> {
        let meeting_id = meeting_id.trim();
        if meeting_id.is_empty() {
            return Err(SessionError::NotFound("missing meeting id".to_string()));
        }
        let credentials = auth.require()?;
        let (peer_events_tx, peer_events_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        info!(
            "meeting {meeting_id}: session created for {} ({})",
            credentials.user.username,
            credentials.user.role()
        );

        Ok(Self {
            session: MeetingSession::new(meeting_id, credentials.access_token()),
            user: credentials.user,
            config,
            deps,
            events: EventSender::new(),
            auth_rx: Some(auth.subscribe()),
            local_stream: MediaStream::default(),
            screen_track: None,
            peer: None,
            peer_events_tx,
            peer_events_rx,
            signaling: None,
            inbound: None,
            internal_tx,
            internal_rx,
            timer: None,
            started: false,
            torn_down: false,
            finished: false,
        })
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn session(&self) -> &MeetingSession {
        &self.session
    }

    pub fn meeting_id(&self) -> &str {
        self.session.meeting_id()
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn status(&self) -> ConnectionStatus {
        self.session.status()
    }

    pub fn local_media(&self) -> MediaFlags {
        self.session.local_media()
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.session.is_screen_sharing()
    }

    pub fn participants(&self) -> &[Participant] {
        self.session.participants()
    }

    pub fn chat_log(&self) -> &[ChatEntry] {
        self.session.chat_log()
    }

    pub fn error(&self) -> Option<&str> {
        self.session.error()
    }

    pub fn duration_seconds(&self) -> u64 {
        self.session.duration_seconds()
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_seconds())
    }

    /// Elapsed seconds, published once per second while the call is up.
    /// `None` before connecting and after teardown.
    pub fn duration_updates(&self) -> Option<watch::Receiver<u64>> {
        self.timer.as_ref().map(CallTimer::subscribe)
    }

    /// Camera and microphone tracks, for the local preview.
    pub fn local_stream(&self) -> &MediaStream {
        &self.local_stream
    }

    /// The video track currently sent to the peer.
    pub fn outgoing_video_track(&self) -> Option<SharedTrack> {
        match &self.screen_track {
            Some(screen) if self.session.is_screen_sharing() => Some(screen.clone()),
            _ => self.local_stream.video_track().cloned(),
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Receive all events emitted from now on.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ---------------------------------------------------------------------
    // Startup
    // ---------------------------------------------------------------------

    /// Bring the session up: fetch participants, capture media, create the
    /// peer connection and open signaling, in that order.
    ///
    /// Calling it again is a no-op.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.started || self.torn_down {
            debug!("meeting {}: start ignored", self.meeting_id());
            return Ok(());
        }
        self.started = true;
        let meeting_id = self.meeting_id().to_string();
        self.events
            .emit(SessionEvent::StatusChanged(ConnectionStatus::Connecting));

        info!("meeting {meeting_id}: loading participants");
        let response = match self.deps.backend.list_participants(&meeting_id).await {
            Ok(response) => response,
            Err(e) => {
                error!("meeting {meeting_id}: participants request failed: {e}");
                return Err(self.fail(e.into()));
            }
        };
        info!(
            "meeting {meeting_id}: {} participant(s) listed",
            response.participants.len()
        );
        self.session.set_meeting(response.meeting);
        self.session.set_participants(response.participants);

        self.acquire_local_media().await;

        if let Err(e) = self.build_peer() {
            error!("meeting {meeting_id}: {e}");
            return Err(self.fail(e));
        }

        info!("meeting {meeting_id}: opening signaling");
        let connected = self
            .deps
            .signaling
            .connect(&meeting_id, self.session.access_token())
            .await;
        match connected {
            Ok((channel, inbound)) => {
                self.signaling = Some(channel);
                self.inbound = Some(inbound);
            }
            Err(e) => {
                error!("meeting {meeting_id}: signaling failed: {e}");
                return Err(self.fail(e.into()));
            }
        }
        self.send_signal(SignalMessage::Join);

        if self.session.transition(ConnectionStatus::Connected) {
            self.timer = Some(CallTimer::start(self.events.clone()));
            self.events
                .emit(SessionEvent::StatusChanged(ConnectionStatus::Connected));
            self.events.notice(Notice::success("Connected to meeting!"));
        }
        Ok(())
    }

    async fn acquire_local_media(&mut self) {
        let flags = match self
            .deps
            .media
            .get_user_media(&MediaConstraints::default())
            .await
        {
            Ok(stream) => {
                let flags = MediaFlags {
                    video: stream.video_track().is_some_and(|t| t.is_enabled()),
                    audio: stream.audio_track().is_some_and(|t| t.is_enabled()),
                };
                info!(
                    "meeting {}: captured {} local track(s)",
                    self.meeting_id(),
                    stream.tracks().len()
                );
                self.local_stream = stream;
                flags
            }
            Err(e) => {
                warn!(
                    "meeting {}: continuing without local media: {e}",
                    self.meeting_id()
                );
                self.events
                    .notice(Notice::warning(SessionError::from(e).user_message()));
                MediaFlags::default()
            }
        };
        self.session.set_local_media(flags);
        self.events.emit(SessionEvent::LocalMediaChanged(flags));
    }

    /// Tracks the peer should be sending right now.
    fn outgoing_tracks(&self) -> Vec<SharedTrack> {
        self.local_stream
            .audio_track()
            .cloned()
            .into_iter()
            .chain(self.outgoing_video_track())
            .collect()
    }

    fn build_peer(&mut self) -> Result<(), SessionError> {
        let peer = self
            .deps
            .peers
            .create(&self.config.peer_config(), self.peer_events_tx.clone())?;
        for track in self.outgoing_tracks() {
            if let Err(e) = peer.add_track(track) {
                peer.close();
                return Err(e.into());
            }
        }
        self.peer = Some(peer);
        Ok(())
    }

    /// Startup failed: record the message and release whatever was acquired
    /// so far. The error screen stays until [`go_back`](Self::go_back).
    fn fail(&mut self, err: SessionError) -> SessionError {
        let message = err.user_message();
        if self.session.fail(message.clone()) {
            self.events
                .emit(SessionEvent::StatusChanged(ConnectionStatus::Failed));
        }
        self.events.notice(Notice::error(message));
        self.teardown();
        err
    }

    // ---------------------------------------------------------------------
    // Local controls
    // ---------------------------------------------------------------------

    fn ensure_connected(&self) -> Result<(), SessionError> {
        if self.session.status() == ConnectionStatus::Connected {
            Ok(())
        } else {
            Err(SessionError::NotConnected)
        }
    }

    /// Enable or disable the camera track in place. Returns the new flag.
    pub fn toggle_video(&mut self) -> Result<bool, SessionError> {
        self.toggle_local(TrackKind::Video)
    }

    /// Mute or unmute the microphone track in place. Returns the new flag.
    pub fn toggle_audio(&mut self) -> Result<bool, SessionError> {
        self.toggle_local(TrackKind::Audio)
    }

    fn toggle_local(&mut self, kind: TrackKind) -> Result<bool, SessionError> {
        self.ensure_connected()?;
        let mut flags = self.session.local_media();
        let (track, current) = match kind {
            TrackKind::Video => (self.local_stream.video_track().cloned(), flags.video),
            TrackKind::Audio => (self.local_stream.audio_track().cloned(), flags.audio),
        };
        let Some(track) = track else {
            warn!("meeting {}: no local {kind:?} track", self.meeting_id());
            self.events.notice(Notice::warning(match kind {
                TrackKind::Video => "No camera available",
                TrackKind::Audio => "No microphone available",
            }));
            return Ok(current);
        };

        let enabled = !current;
        track.set_enabled(enabled);
        let message = match kind {
            TrackKind::Video => {
                flags.video = enabled;
                if enabled {
                    "Camera turned on"
                } else {
                    "Camera turned off"
                }
            }
            TrackKind::Audio => {
                flags.audio = enabled;
                if enabled {
                    "Microphone unmuted"
                } else {
                    "Microphone muted"
                }
            }
        };
        self.session.set_local_media(flags);
        debug!("meeting {}: local media {flags:?}", self.meeting_id());

        self.send_signal(SignalMessage::MediaState {
            video: flags.video,
            audio: flags.audio,
            user_id: self.user.id_string(),
        });
        self.events.emit(SessionEvent::LocalMediaChanged(flags));
        self.events.notice(Notice::success(message));
        Ok(enabled)
    }

    /// Start or stop sharing the screen. Returns whether sharing is on.
    ///
    /// The screen track replaces the outgoing camera track on the existing
    /// peer connection; no renegotiation happens.
    pub async fn toggle_screen_share(&mut self) -> Result<bool, SessionError> {
        self.ensure_connected()?;
        if self.session.is_screen_sharing() {
            self.stop_screen_share(StopReason::Requested).await?;
            return Ok(false);
        }

        let stream = match self
            .deps
            .media
            .get_display_media(&DisplayConstraints::default())
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                warn!("meeting {}: display capture failed: {e}", self.meeting_id());
                self.events.notice(Notice::error("Failed to share screen"));
                return Err(e.into());
            }
        };
        let Some(screen) = stream.video_track().cloned() else {
            stream.stop_all();
            self.events.notice(Notice::error("Failed to share screen"));
            return Err(SessionError::MediaUnavailable(
                "display capture returned no video track".to_string(),
            ));
        };
        // Display audio is not forwarded.
        for track in stream.tracks() {
            if track.id() != screen.id() {
                track.stop();
            }
        }

        let replaced = match &self.peer {
            Some(peer) => peer.replace_video_track(screen.clone()).await,
            None => Err(PeerError::Closed),
        };
        if let Err(e) = replaced {
            error!("meeting {}: could not send screen: {e}", self.meeting_id());
            screen.stop();
            self.events.notice(Notice::error("Failed to share screen"));
            return Err(e.into());
        }

        let tx = self.internal_tx.clone();
        let screen_id = screen.id().to_string();
        screen.on_ended(Box::new(move || {
            let _ = tx.send(Internal::ScreenTrackEnded(screen_id));
        }));

        info!("meeting {}: screen sharing started", self.meeting_id());
        self.screen_track = Some(screen);
        self.session.set_screen_sharing(true);
        self.events.emit(SessionEvent::ScreenShareChanged(true));
        self.events.notice(Notice::success("Screen sharing started"));
        Ok(true)
    }

    /// Put a fresh camera track back on the peer and release the screen.
    async fn stop_screen_share(&mut self, reason: StopReason) -> Result<(), SessionError> {
        info!(
            "meeting {}: stopping screen share ({reason:?})",
            self.meeting_id()
        );
        let stream = match self
            .deps
            .media
            .get_user_media(&MediaConstraints::camera_only())
            .await
        {
            Ok(stream) => stream,
            Err(e) => return Err(self.camera_restore_failed(reason, e.into())),
        };
        let Some(camera) = stream.video_track().cloned() else {
            stream.stop_all();
            return Err(self.camera_restore_failed(
                reason,
                SessionError::MediaUnavailable("camera returned no video track".to_string()),
            ));
        };

        let replaced = match &self.peer {
            Some(peer) => peer.replace_video_track(camera.clone()).await,
            None => Ok(()),
        };
        if let Err(e) = replaced {
            camera.stop();
            return Err(self.camera_restore_failed(reason, e.into()));
        }

        camera.set_enabled(self.session.local_media().video);
        if let Some(old) = self.local_stream.replace_video(camera) {
            old.stop();
        }
        if let Some(screen) = self.screen_track.take() {
            screen.stop();
        }
        self.session.set_screen_sharing(false);
        self.events.emit(SessionEvent::ScreenShareChanged(false));
        self.events.notice(Notice::success("Screen sharing stopped"));
        Ok(())
    }

    /// The camera could not be restored. A requested stop keeps sharing; a
    /// screen track that already ended is released regardless.
    fn camera_restore_failed(&mut self, reason: StopReason, err: SessionError) -> SessionError {
        error!(
            "meeting {}: could not restore camera: {err}",
            self.meeting_id()
        );
        self.events
            .notice(Notice::error("Failed to restore camera after screen sharing"));
        if reason == StopReason::TrackEnded {
            if let Some(screen) = self.screen_track.take() {
                screen.stop();
            }
            self.session.set_screen_sharing(false);
            self.events.emit(SessionEvent::ScreenShareChanged(false));
        }
        err
    }

    /// Append a chat line locally and relay it. Blank text is ignored and
    /// returns `Ok(false)`.
    pub fn send_chat_message(&mut self, text: &str) -> Result<bool, SessionError> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.ensure_connected()?;
        let entry = ChatEntry::local(&self.user.display_label(), text);
        let message = entry.to_payload();
        self.session.push_chat(entry);
        self.send_signal(SignalMessage::ChatMessage { message });
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Leaving
    // ---------------------------------------------------------------------

    fn landing_path(&self) -> String {
        self.user.role().landing_path().to_string()
    }

    /// Leave the call. Tutors end the meeting for everyone instead, unless
    /// the session already failed. Leaving twice is a no-op.
    pub async fn leave(&mut self) -> Result<(), SessionError> {
        if self.finished {
            debug!("meeting {}: already left", self.meeting_id());
            return Ok(());
        }
        if self.session.status() == ConnectionStatus::Failed {
            self.go_back();
            return Ok(());
        }
        if self.user.role().is_privileged() {
            return self.end_meeting_for_all().await;
        }
        info!("meeting {}: leaving", self.meeting_id());
        let landing = self.landing_path();
        self.finish(Some(Notice::success("Left meeting")), landing);
        Ok(())
    }

    /// End the meeting for all participants. Tutors only.
    ///
    /// The session is torn down whether or not the backend accepted the
    /// request; the backend outcome is returned.
    pub async fn end_meeting_for_all(&mut self) -> Result<(), SessionError> {
        if !self.user.role().is_privileged() {
            warn!(
                "meeting {}: {} may not end the meeting",
                self.meeting_id(),
                self.user.role()
            );
            return Err(SessionError::PermissionDenied(
                "only tutors can end a meeting".to_string(),
            ));
        }
        if self.finished {
            debug!("meeting {}: already ended", self.meeting_id());
            return Ok(());
        }

        let meeting_id = self.meeting_id().to_string();
        info!("meeting {meeting_id}: ending for all participants");
        let result = self.deps.backend.end_meeting(&meeting_id).await;
        let notice = match &result {
            Ok(()) => {
                self.send_signal(SignalMessage::EndMeeting);
                Notice::success("Meeting ended")
            }
            Err(e) => {
                error!("meeting {meeting_id}: end request failed: {e}");
                Notice::error("Failed to end meeting")
            }
        };
        let landing = self.landing_path();
        self.finish(Some(notice), landing);
        result.map_err(SessionError::from)
    }

    /// Leave the room from the error screen or the back button.
    pub fn go_back(&mut self) {
        debug!("meeting {}: going back", self.meeting_id());
        let landing = self.landing_path();
        self.finish(None, landing);
    }

    fn finish(&mut self, notice: Option<Notice>, path: String) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.teardown();
        if !self.session.status().is_terminal()
            && self.session.transition(ConnectionStatus::Ended)
        {
            self.events
                .emit(SessionEvent::StatusChanged(ConnectionStatus::Ended));
        }
        if let Some(notice) = notice {
            self.events.notice(notice);
        }
        self.events.emit(SessionEvent::Navigate(path));
    }

    /// Release every resource the session holds. Idempotent; also runs on
    /// drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        info!("meeting {}: tearing down", self.meeting_id());

        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
        if let Some(screen) = self.screen_track.take() {
            screen.stop();
        }
        self.session.set_screen_sharing(false);
        self.local_stream.stop_all();
        if let Some(peer) = self.peer.take() {
            peer.close();
        }
        if let Some(channel) = self.signaling.take() {
            channel.close();
        }
        self.inbound = None;
        self.auth_rx = None;
        self.session.mark_stopped();
    }

    // ---------------------------------------------------------------------
    // Event loop
    // ---------------------------------------------------------------------

    /// Wait for the next queued input and apply it. Returns `false` once
    /// the session has been torn down.
    pub async fn next_event(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let input = tokio::select! {
            biased;
            Some(internal) = self.internal_rx.recv() => Input::Internal(internal),
            signal = recv_signal(&mut self.inbound) => match signal {
                Some(message) => Input::Signal(message),
                None => Input::SignalingClosed,
            },
            Some(event) = self.peer_events_rx.recv() => Input::Peer(event),
            signed_in = auth_changed(&mut self.auth_rx) => Input::AuthChanged { signed_in },
        };
        self.apply(input).await;
        !self.torn_down
    }

    /// Apply every input that is already queued without waiting. Returns
    /// how many were applied.
    pub async fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while !self.torn_down {
            let Some(input) = self.try_next_input() else {
                break;
            };
            self.apply(input).await;
            applied += 1;
        }
        applied
    }

    fn try_next_input(&mut self) -> Option<Input> {
        if let Ok(internal) = self.internal_rx.try_recv() {
            return Some(Input::Internal(internal));
        }
        if let Some(inbound) = self.inbound.as_mut() {
            match inbound.try_recv() {
                Ok(message) => return Some(Input::Signal(message)),
                Err(TryRecvError::Disconnected) => return Some(Input::SignalingClosed),
                Err(TryRecvError::Empty) => {}
            }
        }
        if let Ok(event) = self.peer_events_rx.try_recv() {
            return Some(Input::Peer(event));
        }
        if let Some(rx) = self.auth_rx.as_mut() {
            if rx.has_changed().unwrap_or(false) {
                let signed_in = rx.borrow_and_update().is_some();
                return Some(Input::AuthChanged { signed_in });
            }
        }
        None
    }

    async fn apply(&mut self, input: Input) {
        if self.torn_down {
            return;
        }
        match input {
            Input::Internal(Internal::ScreenTrackEnded(id)) => self.on_screen_track_ended(&id).await,
            Input::Signal(message) => {
                if let Err(e) = self.handle_signal(message).await {
                    warn!("meeting {}: {e}", self.meeting_id());
                    self.events.notice(Notice::warning(e.user_message()));
                }
            }
            Input::SignalingClosed => self.on_signaling_closed(),
            Input::Peer(event) => self.handle_peer_event(event),
            Input::AuthChanged { signed_in } => {
                if !signed_in {
                    info!("meeting {}: signed out, closing session", self.meeting_id());
                    self.finish(None, AUTH_PATH.to_string());
                }
            }
        }
    }

    async fn on_screen_track_ended(&mut self, id: &str) {
        let current = self.screen_track.as_ref().is_some_and(|t| t.id() == id);
        if !current || !self.session.is_screen_sharing() {
            debug!("meeting {}: stale screen track {id} ended", self.meeting_id());
            return;
        }
        info!("meeting {}: screen track ended by the platform", self.meeting_id());
        if let Err(e) = self.stop_screen_share(StopReason::TrackEnded).await {
            warn!("meeting {}: {e}", self.meeting_id());
        }
    }

    fn on_signaling_closed(&mut self) {
        self.inbound = None;
        let err = SessionError::Signaling("channel closed".to_string());
        warn!("meeting {}: {err}", self.meeting_id());
        self.events.notice(Notice::warning(err.user_message()));
    }

    fn peer(&self) -> Result<&dyn PeerConnection, SessionError> {
        self.peer
            .as_deref()
            .ok_or_else(|| SessionError::PeerConnection("no peer connection".to_string()))
    }

    /// Apply one inbound signaling message. Messages arriving while the
    /// session is not connected are dropped.
    pub async fn handle_signal(&mut self, message: SignalMessage) -> Result<(), SessionError> {
        if self.session.status() != ConnectionStatus::Connected {
            debug!(
                "meeting {}: dropping {} while {:?}",
                self.meeting_id(),
                message.kind(),
                self.session.status()
            );
            return Ok(());
        }
        debug!("meeting {}: <- {}", self.meeting_id(), message.kind());

        match message {
            SignalMessage::Join => {}
            SignalMessage::Offer { offer } => {
                let peer = self.peer()?;
                peer.set_remote_description(offer).await?;
                let answer = peer.create_answer().await?;
                self.send_signal(SignalMessage::Answer { answer });
            }
            SignalMessage::Answer { answer } => {
                self.peer()?.set_remote_description(answer).await?;
            }
            SignalMessage::Candidate { candidate } => {
                self.peer()?.add_ice_candidate(candidate).await?;
            }
            SignalMessage::MediaState {
                video,
                audio,
                user_id,
            } => {
                if let Some(id) = &user_id {
                    self.session.update_participant_media(id, video, audio);
                }
                self.events.emit(SessionEvent::RemoteMediaState {
                    user_id,
                    video,
                    audio,
                });
            }
            SignalMessage::ChatMessage { message } => {
                let entry = ChatEntry::remote(message);
                self.session.push_chat(entry.clone());
                self.events.emit(SessionEvent::ChatReceived(entry));
            }
            SignalMessage::UserJoined {
                is_initiator,
                user_id,
                display_name,
            } => {
                self.events
                    .notice(Notice::info("Another user joined the meeting."));
                if let Some(id) = user_id {
                    let participant = Participant {
                        id,
                        display_name: display_name.unwrap_or_default(),
                        avatar: None,
                        video_enabled: true,
                        audio_enabled: true,
                    };
                    if self.session.add_participant(participant.clone()) {
                        self.events
                            .emit(SessionEvent::ParticipantJoined(participant));
                    }
                }
                if is_initiator {
                    let offer = self.peer()?.create_offer().await?;
                    self.send_signal(SignalMessage::Offer { offer });
                }
            }
            SignalMessage::UserLeft { user_id } => {
                if let Some(id) = &user_id {
                    self.session.remove_participant(id);
                }
                self.events.notice(Notice::info("A user left the meeting."));
                self.events.emit(SessionEvent::ParticipantLeft(user_id));
                self.events.emit(SessionEvent::RemoteVideoCleared);
                self.rebuild_peer()?;
            }
            SignalMessage::EndMeeting => {
                info!("meeting {}: ended by the host", self.meeting_id());
                let landing = self.landing_path();
                self.finish(Some(Notice::info("Meeting ended")), landing);
            }
        }
        Ok(())
    }

    /// Replace the peer connection with a fresh one carrying the current
    /// outgoing tracks, ready for the next participant.
    fn rebuild_peer(&mut self) -> Result<(), SessionError> {
        if let Some(old) = self.peer.take() {
            old.close();
        }
        while self.peer_events_rx.try_recv().is_ok() {}
        debug!("meeting {}: rebuilding peer connection", self.meeting_id());
        self.build_peer()
    }

    fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::IceCandidate(candidate) => {
                self.send_signal(SignalMessage::Candidate { candidate });
            }
            PeerEvent::RemoteTrack { stream_id } => {
                debug!("meeting {}: remote stream {stream_id}", self.meeting_id());
                self.events
                    .emit(SessionEvent::RemoteStreamAttached { stream_id });
            }
            PeerEvent::StateChanged(state) => {
                debug!("meeting {}: peer {state:?}", self.meeting_id());
                match state {
                    PeerState::Connected => self
                        .events
                        .notice(Notice::success("Peer connection established!")),
                    PeerState::Failed => {
                        warn!("meeting {}: peer connection failed", self.meeting_id());
                        self.events.notice(Notice::error("Peer connection failed"));
                    }
                    _ => {}
                }
            }
        }
    }

    /// Best-effort send; a closed channel is logged and otherwise ignored.
    fn send_signal(&self, message: SignalMessage) {
        let Some(channel) = &self.signaling else {
            debug!(
                "meeting {}: no signaling channel for {}",
                self.meeting_id(),
                message.kind()
            );
            return;
        };
        if let Err(e) = channel.send(&message) {
            warn!(
                "meeting {}: failed to send {}: {e}",
                self.meeting_id(),
                message.kind()
            );
        }
    }
}

impl Drop for MeetingSessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn recv_signal(inbound: &mut Option<InboundSignals>) -> Option<SignalMessage> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Resolves with the new signed-in flag whenever the credentials change.
async fn auth_changed(rx: &mut Option<watch::Receiver<Option<Credentials>>>) -> bool {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => rx.borrow_and_update().is_some(),
            Err(_) => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}
