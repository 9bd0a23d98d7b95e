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

//! Signaling messages exchanged over the meeting WebSocket.
//!
//! Every frame is a JSON object `{ "type": <tag>, ...payload }`. The set of
//! tags is closed: [`SignalMessage::decode`] rejects anything it does not
//! know instead of letting it fall through, so the session layer only ever
//! sees one of the variants below.
//!
//! | tag            | direction | payload                         |
//! |----------------|-----------|---------------------------------|
//! | `join`         | out       | none                            |
//! | `offer`        | in/out    | `offer: SessionDescription`     |
//! | `answer`       | in/out    | `answer: SessionDescription`    |
//! | `candidate`    | in/out    | `candidate: IceCandidate`       |
//! | `media-state`  | in/out    | `video`, `audio`, `user_id?`    |
//! | `chat-message` | in/out    | `message: ChatPayload`          |
//! | `user_joined`  | in        | `is_initiator`, `user_id?`, ... |
//! | `user_left`    | in        | `user_id?`                      |
//! | `end_meeting`  | in/out    | none                            |

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Canonical tags, in the order of the table above.
pub const KNOWN_TAGS: &[&str] = &[
    "join",
    "offer",
    "answer",
    "candidate",
    "media-state",
    "chat-message",
    "user_joined",
    "user_left",
    "end_meeting",
];

/// Tags some peers still emit, mapped onto their canonical variant.
const LEGACY_TAGS: &[&str] = &["ice-candidate", "chat_message"];

/// SDP offer or answer, shaped like `RTCSessionDescriptionInit`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// ICE candidate, shaped like `RTCIceCandidateInit`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
}

/// Chat line relayed between participants.
///
/// Older clients sent the bare text as the `message` field; that form is
/// accepted with an empty sender and timestamp.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "ChatPayloadRepr")]
pub struct ChatPayload {
    pub sender: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChatPayloadRepr {
    Text(String),
    Full {
        #[serde(default)]
        sender: String,
        #[serde(default, alias = "text")]
        message: String,
        #[serde(default)]
        timestamp: String,
    },
}

impl From<ChatPayloadRepr> for ChatPayload {
    fn from(repr: ChatPayloadRepr) -> Self {
        match repr {
            ChatPayloadRepr::Text(message) => Self {
                sender: String::new(),
                message,
                timestamp: String::new(),
            },
            ChatPayloadRepr::Full {
                sender,
                message,
                timestamp,
            } => Self {
                sender,
                message,
                timestamp,
            },
        }
    }
}

fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|id| match id {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

/// A validated signaling frame.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SignalMessage {
    /// Announces this client to the room after the socket opens.
    #[serde(rename = "join")]
    Join,

    #[serde(rename = "offer")]
    Offer { offer: SessionDescription },

    #[serde(rename = "answer")]
    Answer { answer: SessionDescription },

    #[serde(rename = "candidate", alias = "ice-candidate")]
    Candidate { candidate: IceCandidate },

    /// Sender's current camera/microphone flags.
    #[serde(rename = "media-state")]
    MediaState {
        video: bool,
        audio: bool,
        #[serde(
            default,
            deserialize_with = "opt_id_string",
            skip_serializing_if = "Option::is_none"
        )]
        user_id: Option<String>,
    },

    #[serde(rename = "chat-message", alias = "chat_message")]
    ChatMessage { message: ChatPayload },

    /// A counterpart entered the room. The initiator creates the offer.
    #[serde(rename = "user_joined")]
    UserJoined {
        #[serde(default)]
        is_initiator: bool,
        #[serde(
            default,
            deserialize_with = "opt_id_string",
            skip_serializing_if = "Option::is_none"
        )]
        user_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },

    #[serde(rename = "user_left")]
    UserLeft {
        #[serde(
            default,
            deserialize_with = "opt_id_string",
            skip_serializing_if = "Option::is_none"
        )]
        user_id: Option<String>,
    },

    /// The host ended the meeting for everyone.
    #[serde(rename = "end_meeting")]
    EndMeeting,
}

/// Reasons an inbound frame is rejected at the channel boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalDecodeError {
    #[error("signaling frame is not a JSON object: {0}")]
    NotJson(String),

    #[error("signaling frame has no string `type` tag")]
    MissingType,

    #[error("unknown signaling message type `{0}`")]
    UnknownType(String),

    #[error("malformed `{tag}` payload: {reason}")]
    Malformed { tag: String, reason: String },
}

impl SignalMessage {
    /// Parse and validate one inbound text frame.
    pub fn decode(text: &str) -> Result<Self, SignalDecodeError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| SignalDecodeError::NotJson(e.to_string()))?;
        if !value.is_object() {
            return Err(SignalDecodeError::NotJson("expected an object".to_string()));
        }
        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(SignalDecodeError::MissingType)?
            .to_string();
        if !KNOWN_TAGS.contains(&tag.as_str()) && !LEGACY_TAGS.contains(&tag.as_str()) {
            return Err(SignalDecodeError::UnknownType(tag));
        }
        serde_json::from_value(value).map_err(|e| SignalDecodeError::Malformed {
            tag,
            reason: e.to_string(),
        })
    }

    /// Serialize with the canonical tag.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Canonical tag of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::Join => "join",
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::Candidate { .. } => "candidate",
            SignalMessage::MediaState { .. } => "media-state",
            SignalMessage::ChatMessage { .. } => "chat-message",
            SignalMessage::UserJoined { .. } => "user_joined",
            SignalMessage::UserLeft { .. } => "user_left",
            SignalMessage::EndMeeting => "end_meeting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_offer() {
        let msg =
            SignalMessage::decode(r#"{"type":"offer","offer":{"type":"offer","sdp":"v=0"}}"#)
                .unwrap();
        assert_eq!(
            msg,
            SignalMessage::Offer {
                offer: SessionDescription::offer("v=0")
            }
        );
    }

    #[test]
    fn legacy_candidate_tag_maps_to_candidate() {
        let msg = SignalMessage::decode(
            r#"{"type":"ice-candidate","candidate":{"candidate":"candidate:1 1 udp 1 1.2.3.4 5 typ host","sdpMid":"0","sdpMLineIndex":0}}"#,
        )
        .unwrap();
        assert_eq!(msg.kind(), "candidate");
        let encoded = msg.encode().unwrap();
        assert!(encoded.contains(r#""type":"candidate""#));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = SignalMessage::decode(r#"{"type":"raise-hand"}"#).unwrap_err();
        assert_eq!(err, SignalDecodeError::UnknownType("raise-hand".to_string()));
    }

    #[test]
    fn missing_tag_and_non_objects_are_rejected() {
        assert_eq!(
            SignalMessage::decode(r#"{"offer":{}}"#).unwrap_err(),
            SignalDecodeError::MissingType
        );
        assert!(matches!(
            SignalMessage::decode("[1,2]").unwrap_err(),
            SignalDecodeError::NotJson(_)
        ));
        assert!(matches!(
            SignalMessage::decode("not json").unwrap_err(),
            SignalDecodeError::NotJson(_)
        ));
    }

    #[test]
    fn known_tag_with_bad_payload_is_malformed() {
        let err = SignalMessage::decode(r#"{"type":"answer"}"#).unwrap_err();
        assert!(matches!(err, SignalDecodeError::Malformed { ref tag, .. } if tag == "answer"));
    }

    #[test]
    fn chat_accepts_bare_text_and_full_payload() {
        let bare = SignalMessage::decode(r#"{"type":"chat_message","message":"hello"}"#).unwrap();
        match bare {
            SignalMessage::ChatMessage { message } => {
                assert_eq!(message.message, "hello");
                assert!(message.sender.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }

        let full = SignalMessage::decode(
            r#"{"type":"chat-message","message":{"sender":"Ada","message":"hi","timestamp":"10:00:00"}}"#,
        )
        .unwrap();
        match full {
            SignalMessage::ChatMessage { message } => assert_eq!(message.sender, "Ada"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn user_joined_defaults_and_numeric_ids() {
        let msg = SignalMessage::decode(r#"{"type":"user_joined","user_id":12}"#).unwrap();
        assert_eq!(
            msg,
            SignalMessage::UserJoined {
                is_initiator: false,
                user_id: Some("12".to_string()),
                display_name: None,
            }
        );
    }

    #[test]
    fn unit_variants_encode_with_tag_only() {
        assert_eq!(SignalMessage::Join.encode().unwrap(), r#"{"type":"join"}"#);
        assert_eq!(
            SignalMessage::EndMeeting.encode().unwrap(),
            r#"{"type":"end_meeting"}"#
        );
    }
}
