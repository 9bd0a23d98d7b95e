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

//! Signaling transport for PenTutor meetings.
//!
//! One WebSocket per meeting session, carrying JSON text frames. Inbound
//! frames are validated into [`SignalMessage`](pentutor_meeting_types::SignalMessage)
//! before they leave this crate; anything unknown or malformed is logged
//! and dropped here.

pub mod endpoint;
pub mod error;
pub mod signaling_socket;

pub use endpoint::signaling_url;
pub use error::TransportError;
pub use signaling_socket::SignalingSocket;
