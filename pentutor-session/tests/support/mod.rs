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

//! In-memory media, peer, signaling and backend fakes.

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pentutor_meeting_client::ApiError;
use pentutor_meeting_types::responses::{
    JoinMeetingResponse, MeetingInfo, MeetingStatus, Participant, ParticipantsResponse,
};
use pentutor_meeting_types::signaling::{IceCandidate, SessionDescription};
use pentutor_meeting_types::user::{AuthTokens, Role, User};
use pentutor_meeting_types::SignalMessage;
use pentutor_session::auth::MemoryCredentialStore;
use pentutor_session::media::{
    DisplayConstraints, EndedCallback, MediaConstraints, MediaDevices, MediaError, MediaStream,
    MediaTrack, SharedTrack, TrackKind, TrackSource,
};
use pentutor_session::peer::{PeerConfig, PeerConnection, PeerConnectionFactory, PeerError, PeerEvent};
use pentutor_session::signaling::{InboundSignals, SignalingChannel, SignalingConnector};
use pentutor_session::{
    AuthContext, ClientConfig, MeetingBackend, MeetingSessionController, SessionDeps, SessionEvent,
};
use pentutor_transport::TransportError;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    source: TrackSource,
    enabled: AtomicBool,
    live: AtomicBool,
    ended: Mutex<Option<EndedCallback>>,
}

impl FakeTrack {
    pub fn new(id: String, kind: TrackKind, source: TrackSource) -> Arc<Self> {
        Arc::new(Self {
            id,
            kind,
            source,
            enabled: AtomicBool::new(true),
            live: AtomicBool::new(true),
            ended: Mutex::new(None),
        })
    }

    /// The platform ends the track, as when the browser's "Stop sharing"
    /// button is pressed.
    pub fn end_externally(&self) {
        self.live.store(false, Ordering::SeqCst);
        let callback = self.ended.lock().unwrap().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl fmt::Debug for FakeTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeTrack")
            .field("id", &self.id)
            .field("live", &self.live.load(Ordering::SeqCst))
            .finish()
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn source(&self) -> TrackSource {
        self.source
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn on_ended(&self, callback: EndedCallback) {
        *self.ended.lock().unwrap() = Some(callback);
    }
}

#[derive(Default)]
pub struct FakeMediaDevices {
    pub user_media_calls: AtomicUsize,
    pub display_media_calls: AtomicUsize,
    pub deny_camera: AtomicBool,
    pub deny_display: AtomicBool,
    issued: Mutex<Vec<Arc<FakeTrack>>>,
    next_id: AtomicUsize,
}

impl FakeMediaDevices {
    fn issue(&self, kind: TrackKind, source: TrackSource) -> SharedTrack {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let track = FakeTrack::new(format!("{source:?}-{n}").to_lowercase(), kind, source);
        self.issued.lock().unwrap().push(track.clone());
        track
    }

    pub fn issued(&self) -> Vec<Arc<FakeTrack>> {
        self.issued.lock().unwrap().clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.issued().iter().filter(|t| t.is_live()).count()
    }

    /// Newest track issued for `source` with the given `kind`.
    pub fn last_of(&self, source: TrackSource, kind: TrackKind) -> Option<Arc<FakeTrack>> {
        self.issued()
            .into_iter()
            .rev()
            .find(|t| t.source() == source && t.kind() == kind)
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaError> {
        self.user_media_calls.fetch_add(1, Ordering::SeqCst);
        if self.deny_camera.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied("NotAllowedError".to_string()));
        }
        let mut tracks = Vec::new();
        if constraints.video.is_some() {
            tracks.push(self.issue(TrackKind::Video, TrackSource::Camera));
        }
        if constraints.audio.is_some() {
            tracks.push(self.issue(TrackKind::Audio, TrackSource::Microphone));
        }
        Ok(MediaStream::new(tracks))
    }

    async fn get_display_media(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<MediaStream, MediaError> {
        self.display_media_calls.fetch_add(1, Ordering::SeqCst);
        if self.deny_display.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied("NotAllowedError".to_string()));
        }
        let mut tracks = vec![self.issue(TrackKind::Video, TrackSource::Screen)];
        if constraints.audio {
            tracks.push(self.issue(TrackKind::Audio, TrackSource::Screen));
        }
        Ok(MediaStream::new(tracks))
    }
}

// ---------------------------------------------------------------------------
// Peer connection
// ---------------------------------------------------------------------------

/// Everything a fake peer was asked to do.
pub struct PeerHandle {
    pub added: Mutex<Vec<SharedTrack>>,
    pub video: Mutex<Option<SharedTrack>>,
    pub remote_descriptions: Mutex<Vec<SessionDescription>>,
    pub candidates: Mutex<Vec<IceCandidate>>,
    pub offers: AtomicUsize,
    pub answers: AtomicUsize,
    pub replacements: AtomicUsize,
    pub closed: AtomicBool,
    pub events: mpsc::UnboundedSender<PeerEvent>,
}

impl PeerHandle {
    pub fn video_track_id(&self) -> Option<String> {
        self.video
            .lock()
            .unwrap()
            .as_ref()
            .map(|t| t.id().to_string())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct FakePeer(Arc<PeerHandle>);

#[async_trait]
impl PeerConnection for FakePeer {
    fn add_track(&self, track: SharedTrack) -> Result<(), PeerError> {
        if self.is_closed() {
            return Err(PeerError::Closed);
        }
        if track.kind() == TrackKind::Video {
            *self.0.video.lock().unwrap() = Some(track.clone());
        }
        self.0.added.lock().unwrap().push(track);
        Ok(())
    }

    async fn replace_video_track(&self, track: SharedTrack) -> Result<(), PeerError> {
        if self.is_closed() {
            return Err(PeerError::Closed);
        }
        self.0.replacements.fetch_add(1, Ordering::SeqCst);
        *self.0.video.lock().unwrap() = Some(track);
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), PeerError> {
        self.0.remote_descriptions.lock().unwrap().push(description);
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        self.0.offers.fetch_add(1, Ordering::SeqCst);
        Ok(SessionDescription::offer("v=0 offer"))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        self.0.answers.fetch_add(1, Ordering::SeqCst);
        Ok(SessionDescription::answer("v=0 answer"))
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        self.0.candidates.lock().unwrap().push(candidate);
        Ok(())
    }

    fn close(&self) {
        self.0.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

#[derive(Default)]
pub struct FakePeerFactory {
    peers: Mutex<Vec<Arc<PeerHandle>>>,
    pub fail_create: AtomicBool,
}

impl FakePeerFactory {
    pub fn created(&self) -> Vec<Arc<PeerHandle>> {
        self.peers.lock().unwrap().clone()
    }

    pub fn latest(&self) -> Arc<PeerHandle> {
        self.created().last().cloned().expect("no peer created")
    }
}

impl PeerConnectionFactory for FakePeerFactory {
    fn create(
        &self,
        _config: &PeerConfig,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Box<dyn PeerConnection>, PeerError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(PeerError::Create("unsupported".to_string()));
        }
        let handle = Arc::new(PeerHandle {
            added: Mutex::new(Vec::new()),
            video: Mutex::new(None),
            remote_descriptions: Mutex::new(Vec::new()),
            candidates: Mutex::new(Vec::new()),
            offers: AtomicUsize::new(0),
            answers: AtomicUsize::new(0),
            replacements: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            events,
        });
        self.peers.lock().unwrap().push(handle.clone());
        Ok(Box::new(FakePeer(handle)))
    }
}

// ---------------------------------------------------------------------------
// Signaling
// ---------------------------------------------------------------------------

pub struct ChannelHandle {
    pub sent: Mutex<Vec<SignalMessage>>,
    pub open: AtomicBool,
    inbound: Mutex<Option<mpsc::Sender<SignalMessage>>>,
}

impl ChannelHandle {
    pub fn sent(&self) -> Vec<SignalMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_kinds(&self) -> Vec<&'static str> {
        self.sent().iter().map(|m| m.kind()).collect()
    }

    /// Queue an inbound message for the controller.
    pub fn push(&self, message: SignalMessage) {
        let tx = self.inbound.lock().unwrap().clone().expect("inbound closed");
        tx.try_send(message).unwrap();
    }

    /// The server goes away.
    pub fn drop_server(&self) {
        self.inbound.lock().unwrap().take();
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

struct FakeChannel(Arc<ChannelHandle>);

impl SignalingChannel for FakeChannel {
    fn send(&self, message: &SignalMessage) -> Result<(), TransportError> {
        if !self.0.is_open() {
            return Err(TransportError::Closed);
        }
        self.0.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn close(&self) {
        self.0.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.0.is_open()
    }
}

#[derive(Default)]
pub struct FakeSignaling {
    channels: Mutex<Vec<Arc<ChannelHandle>>>,
    pub connects: AtomicUsize,
    /// Reject the upgrade with this HTTP status.
    pub reject_status: Mutex<Option<u16>>,
}

impl FakeSignaling {
    pub fn latest(&self) -> Arc<ChannelHandle> {
        self.channels
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no channel opened")
    }

    pub fn all_closed(&self) -> bool {
        self.channels.lock().unwrap().iter().all(|c| !c.is_open())
    }
}

#[async_trait]
impl SignalingConnector for FakeSignaling {
    async fn connect(
        &self,
        _meeting_id: &str,
        _token: &str,
    ) -> Result<(Box<dyn SignalingChannel>, InboundSignals), TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.reject_status.lock().unwrap() {
            return Err(TransportError::HttpError { status });
        }
        let (tx, rx) = mpsc::channel(100);
        let handle = Arc::new(ChannelHandle {
            sent: Mutex::new(Vec::new()),
            open: AtomicBool::new(true),
            inbound: Mutex::new(Some(tx)),
        });
        self.channels.lock().unwrap().push(handle.clone());
        Ok((Box::new(FakeChannel(handle)), rx))
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

fn status_error(status: u16) -> ApiError {
    match status {
        401 => ApiError::NotAuthenticated,
        403 => ApiError::Forbidden("forbidden".to_string()),
        404 => ApiError::NotFound("not found".to_string()),
        410 => ApiError::Expired("expired".to_string()),
        _ => ApiError::ServerError {
            status,
            body: String::new(),
        },
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub participants_status: Mutex<Option<u16>>,
    pub join_status: Mutex<Option<u16>>,
    pub end_status: Mutex<Option<u16>>,
    pub join_delay: Mutex<Duration>,
    pub participants_calls: AtomicUsize,
    pub join_calls: AtomicUsize,
    pub end_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn failing_participants(status: u16) -> Self {
        let backend = Self::default();
        *backend.participants_status.lock().unwrap() = Some(status);
        backend
    }
}

#[async_trait]
impl MeetingBackend for FakeBackend {
    async fn list_participants(&self, meeting_id: &str) -> Result<ParticipantsResponse, ApiError> {
        self.participants_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.participants_status.lock().unwrap() {
            return Err(status_error(status));
        }
        Ok(ParticipantsResponse {
            meeting: Some(MeetingInfo {
                meeting_id: meeting_id.to_string(),
                title: "Algebra".to_string(),
                status: MeetingStatus::Active,
                host: None,
                scheduled_time: None,
            }),
            participants: vec![Participant {
                id: "1".to_string(),
                display_name: "Sam".to_string(),
                avatar: None,
                video_enabled: true,
                audio_enabled: true,
            }],
        })
    }

    async fn join_meeting(
        &self,
        _meeting_id: &str,
        _password: Option<&str>,
    ) -> Result<JoinMeetingResponse, ApiError> {
        self.join_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.join_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = *self.join_status.lock().unwrap() {
            return Err(status_error(status));
        }
        Ok(JoinMeetingResponse {
            participant_count: 2,
            status: "joined".to_string(),
            meeting: None,
            message: None,
        })
    }

    async fn end_meeting(&self, _meeting_id: &str) -> Result<(), ApiError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        match *self.end_status.lock().unwrap() {
            Some(status) => Err(status_error(status)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub auth: AuthContext,
    pub backend: Arc<FakeBackend>,
    pub media: Arc<FakeMediaDevices>,
    pub peers: Arc<FakePeerFactory>,
    pub signaling: Arc<FakeSignaling>,
}

impl Harness {
    pub fn new(role: Role) -> Self {
        Self::with_backend(role, FakeBackend::default())
    }

    pub fn with_backend(role: Role, backend: FakeBackend) -> Self {
        let auth = AuthContext::new(Arc::new(MemoryCredentialStore::new()));
        let mut user = User::new("sam42", role);
        user.id = Some(serde_json::json!(1));
        user.first_name = Some("Sam".to_string());
        auth.login(
            user,
            AuthTokens {
                access: "test-token".to_string(),
                refresh: None,
            },
        )
        .unwrap();
        Self {
            auth,
            backend: Arc::new(backend),
            media: Arc::new(FakeMediaDevices::default()),
            peers: Arc::new(FakePeerFactory::default()),
            signaling: Arc::new(FakeSignaling::default()),
        }
    }

    pub fn deps(&self) -> SessionDeps {
        SessionDeps {
            backend: self.backend.clone(),
            media: self.media.clone(),
            peers: self.peers.clone(),
            signaling: self.signaling.clone(),
        }
    }

    pub fn controller(&self) -> MeetingSessionController {
        MeetingSessionController::new("m1", &self.auth, ClientConfig::default(), self.deps())
            .unwrap()
    }

    pub async fn connected(&self) -> MeetingSessionController {
        let mut controller = self.controller();
        controller.start().await.unwrap();
        controller
    }
}

/// Everything currently buffered on an event receiver.
pub fn drain(rx: &mut async_broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn notices(events: &[SessionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Notice(n) => Some(n.message.clone()),
            _ => None,
        })
        .collect()
}
