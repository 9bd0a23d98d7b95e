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

//! Signaling channel seam and its WebSocket implementation.

use async_trait::async_trait;
use pentutor_meeting_types::SignalMessage;
use pentutor_transport::{signaling_url, SignalingSocket, TransportError};
use tokio::sync::mpsc;

/// Outbound half of the signaling channel. Sends are fire-and-forget.
pub trait SignalingChannel: Send + Sync {
    fn send(&self, message: &SignalMessage) -> Result<(), TransportError>;
    fn close(&self);
    fn is_open(&self) -> bool;
}

pub type InboundSignals = mpsc::Receiver<SignalMessage>;

#[async_trait]
pub trait SignalingConnector: Send + Sync {
    /// Open the channel for `meeting_id`. The receiver yields validated
    /// inbound messages and `None` once the channel is gone.
    async fn connect(
        &self,
        meeting_id: &str,
        token: &str,
    ) -> Result<(Box<dyn SignalingChannel>, InboundSignals), TransportError>;
}

/// Connects to `<ws_base>/ws/meetings/<id>/?token=<token>`.
#[derive(Debug, Clone)]
pub struct WebSocketSignaling {
    ws_base: String,
}

impl WebSocketSignaling {
    pub fn new(ws_base: &str) -> Self {
        Self {
            ws_base: ws_base.to_string(),
        }
    }
}

#[async_trait]
impl SignalingConnector for WebSocketSignaling {
    async fn connect(
        &self,
        meeting_id: &str,
        token: &str,
    ) -> Result<(Box<dyn SignalingChannel>, InboundSignals), TransportError> {
        let url = signaling_url(&self.ws_base, meeting_id, token)?;
        let (socket, inbound) = SignalingSocket::try_connect(&url).await?;
        Ok((Box::new(socket), inbound))
    }
}

impl SignalingChannel for SignalingSocket {
    fn send(&self, message: &SignalMessage) -> Result<(), TransportError> {
        SignalingSocket::send(self, message)
    }

    fn close(&self) {
        SignalingSocket::close(self)
    }

    fn is_open(&self) -> bool {
        self.is_connected()
    }
}
