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

//! Native WebSocket signaling socket using `tokio-tungstenite`.
//!
//! # Example
//!
//! ```no_run
//! use pentutor_meeting_types::SignalMessage;
//! use pentutor_transport::{signaling_url, SignalingSocket, TransportError};
//!
//! # async fn example() -> Result<(), TransportError> {
//! let url = signaling_url("ws://localhost:8000", "m1", "eyJ...")?;
//! let (socket, mut inbound_rx) = SignalingSocket::try_connect(&url).await?;
//!
//! socket.send(&SignalMessage::Join)?;
//!
//! while let Some(msg) = inbound_rx.recv().await {
//!     println!("received {}", msg.kind());
//! }
//! # Ok(())
//! # }
//! ```

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use pentutor_meeting_types::SignalMessage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;

use crate::error::TransportError;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Buffered inbound messages before the reader applies backpressure.
pub const INBOUND_CAPACITY: usize = 100;

/// One signaling WebSocket.
///
/// Sending never blocks: frames are queued to a writer task that owns the
/// sink. Inbound text frames are decoded into [`SignalMessage`] by a reader
/// task; the inbound receiver yields `None` once the socket is gone.
#[derive(Clone)]
pub struct SignalingSocket {
    outbound: mpsc::UnboundedSender<Message>,
    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for SignalingSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingSocket")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl SignalingSocket {
    /// Connect to the signaling server.
    ///
    /// A rejected upgrade is returned as [`TransportError::HttpError`] with
    /// the server's status code.
    pub async fn try_connect(
        url: &str,
    ) -> Result<(Self, mpsc::Receiver<SignalMessage>), TransportError> {
        info!("signaling socket connecting to {}", redact_token(url));

        let (ws_stream, response) =
            tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| match e {
                    tokio_tungstenite::tungstenite::Error::Http(resp) => {
                        TransportError::HttpError {
                            status: resp.status().as_u16(),
                        }
                    }
                    other => TransportError::Connect(other.to_string()),
                })?;

        info!("signaling socket connected (HTTP {})", response.status());

        Ok(Self::setup_streams(ws_stream))
    }

    fn setup_streams(ws_stream: WsStream) -> (Self, mpsc::Receiver<SignalMessage>) {
        let (writer, reader) = ws_stream.split();

        let closed = Arc::new(AtomicBool::new(false));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);

        tokio::spawn(writer_task(writer, outbound_rx));
        tokio::spawn(reader_task(reader, inbound_tx, closed.clone()));

        let socket = Self {
            outbound: outbound_tx,
            closed,
        };
        (socket, inbound_rx)
    }

    /// Queue a message for delivery. Delivery is not confirmed.
    pub fn send(&self, message: &SignalMessage) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let text = message
            .encode()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        debug!("signaling -> {}", message.kind());
        self.outbound
            .send(Message::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    /// Whether the socket is still open.
    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Close the socket. Only the first call sends a close frame.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("closing signaling socket");
            if self.outbound.send(Message::Close(None)).is_err() {
                debug!("signaling writer already gone");
            }
        }
    }
}

async fn writer_task(
    mut writer: SplitSink<WsStream, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = outbound_rx.recv().await {
        let is_close = matches!(msg, Message::Close(_));
        if let Err(e) = writer.send(msg).await {
            error!("signaling send error: {e}");
            break;
        }
        if is_close {
            break;
        }
    }
    debug!("signaling writer loop ended");
}

async fn reader_task(
    mut reader: SplitStream<WsStream>,
    inbound_tx: mpsc::Sender<SignalMessage>,
    closed: Arc<AtomicBool>,
) {
    while let Some(msg_result) = reader.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match SignalMessage::decode(&text) {
                Ok(msg) => {
                    debug!("signaling <- {}", msg.kind());
                    if inbound_tx.send(msg).await.is_err() {
                        debug!("inbound signaling receiver dropped");
                        break;
                    }
                }
                Err(e) => warn!("dropping signaling frame: {e}"),
            },
            Ok(Message::Close(frame)) => {
                info!("signaling socket received close frame: {frame:?}");
                break;
            }
            Ok(Message::Binary(data)) => {
                warn!("dropping binary signaling frame ({} bytes)", data.len());
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
            Err(e) => {
                if !closed.load(Ordering::Acquire) {
                    error!("signaling read error: {e}");
                }
                break;
            }
        }
    }
    closed.store(true, Ordering::Release);
    debug!("signaling reader loop ended");
}

/// Strip the bearer token from a URL before it is logged.
fn redact_token(url: &str) -> String {
    match url.split_once("token=") {
        Some((head, _)) => format!("{head}token=<redacted>"),
        None => url.to_string(),
    }
}
