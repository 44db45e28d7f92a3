use std::fmt;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::member::MemberId;

/// Type tag of envelopes carrying TSS engine payloads.
pub const TSS_MESSAGE_TYPE: &str = "ecdsa/tss_message";

/// Type tag of readiness announcements sent before a protocol run.
pub const JOIN_MESSAGE_TYPE: &str = "ecdsa/join_message";

/// Upper bound on an encoded envelope.
pub const MAX_MESSAGE_SIZE: u64 = 32 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Tss,
    Join,
}

impl MessageKind {
    pub const ALL: [MessageKind; 2] = [MessageKind::Tss, MessageKind::Join];

    pub fn type_tag(self) -> &'static str {
        match self {
            MessageKind::Tss => TSS_MESSAGE_TYPE,
            MessageKind::Join => JOIN_MESSAGE_TYPE,
        }
    }

    /// Looks a tag up in the registry of known kinds.
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_tag() == tag)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// Opaque TSS engine payload with its sender and routing mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TssProtocolMessage {
    pub sender_id: MemberId,
    pub payload: Vec<u8>,
    pub is_broadcast: bool,
}

/// Announces that the sender is ready to start the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinMessage {
    pub sender_id: MemberId,
}

/// Every message kind the envelope carries.
///
/// The variant index is the wire discriminant; variants are only ever
/// appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolMessage {
    Tss(TssProtocolMessage),
    Join(JoinMessage),
}

impl ProtocolMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ProtocolMessage::Tss(_) => MessageKind::Tss,
            ProtocolMessage::Join(_) => MessageKind::Join,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind().type_tag()
    }

    pub fn sender_id(&self) -> &MemberId {
        match self {
            ProtocolMessage::Tss(message) => &message.sender_id,
            ProtocolMessage::Join(message) => &message.sender_id,
        }
    }
}

impl From<TssProtocolMessage> for ProtocolMessage {
    fn from(message: TssProtocolMessage) -> Self {
        ProtocolMessage::Tss(message)
    }
}

impl From<JoinMessage> for ProtocolMessage {
    fn from(message: JoinMessage) -> Self {
        ProtocolMessage::Join(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError(String);

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to encode message: {}", self.0)
    }
}

impl std::error::Error for EncodeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Bytes do not form a complete envelope
    Malformed(String),
    /// Envelope decoded but carries another kind than the transport expected
    KindMismatch {
        expected: MessageKind,
        actual: MessageKind,
    },
    UnknownType(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(msg) => write!(f, "malformed message: {}", msg),
            DecodeError::KindMismatch { expected, actual } => write!(
                f,
                "unexpected message type: expected [{}], got [{}]",
                expected, actual
            ),
            DecodeError::UnknownType(tag) => write!(f, "unknown message type [{}]", tag),
        }
    }
}

impl std::error::Error for DecodeError {}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_MESSAGE_SIZE)
        .reject_trailing_bytes()
}

pub fn encode(message: &ProtocolMessage) -> Result<Vec<u8>, EncodeError> {
    wire_options()
        .serialize(message)
        .map_err(|e| EncodeError(e.to_string()))
}

/// Decodes an envelope the transport delivered under `expected`'s tag.
pub fn decode(bytes: &[u8], expected: MessageKind) -> Result<ProtocolMessage, DecodeError> {
    let message: ProtocolMessage = wire_options()
        .deserialize(bytes)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if message.kind() != expected {
        return Err(DecodeError::KindMismatch {
            expected,
            actual: message.kind(),
        });
    }
    Ok(message)
}

/// Decodes an envelope by the type tag it arrived under.
pub fn decode_tagged(tag: &str, bytes: &[u8]) -> Result<ProtocolMessage, DecodeError> {
    let kind =
        MessageKind::from_type_tag(tag).ok_or_else(|| DecodeError::UnknownType(tag.to_string()))?;
    decode(bytes, kind)
}

/// A message kind the transport can marshal on its own.
pub trait WireMessage: Sized {
    const KIND: MessageKind;

    fn marshal(&self) -> Result<Vec<u8>, EncodeError>;

    fn unmarshal(bytes: &[u8]) -> Result<Self, DecodeError>;

    fn type_tag() -> &'static str {
        Self::KIND.type_tag()
    }
}

impl WireMessage for TssProtocolMessage {
    const KIND: MessageKind = MessageKind::Tss;

    fn marshal(&self) -> Result<Vec<u8>, EncodeError> {
        encode(&ProtocolMessage::Tss(self.clone()))
    }

    fn unmarshal(bytes: &[u8]) -> Result<Self, DecodeError> {
        match decode(bytes, Self::KIND)? {
            ProtocolMessage::Tss(message) => Ok(message),
            other => Err(DecodeError::KindMismatch {
                expected: Self::KIND,
                actual: other.kind(),
            }),
        }
    }
}

impl WireMessage for JoinMessage {
    const KIND: MessageKind = MessageKind::Join;

    fn marshal(&self) -> Result<Vec<u8>, EncodeError> {
        encode(&ProtocolMessage::Join(self.clone()))
    }

    fn unmarshal(bytes: &[u8]) -> Result<Self, DecodeError> {
        match decode(bytes, Self::KIND)? {
            ProtocolMessage::Join(message) => Ok(message),
            other => Err(DecodeError::KindMismatch {
                expected: Self::KIND,
                actual: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> MemberId {
        MemberId::from_bytes(vec![0x11; 20])
    }

    fn tss_message() -> TssProtocolMessage {
        TssProtocolMessage {
            sender_id: sender(),
            payload: vec![0x00, 0xff, 0x10, 0x00],
            is_broadcast: true,
        }
    }

    #[test]
    fn test_tss_message_round_trip() {
        let message = ProtocolMessage::from(tss_message());
        let bytes = encode(&message).unwrap();

        assert_eq!(decode(&bytes, MessageKind::Tss).unwrap(), message);
    }

    #[test]
    fn test_join_message_round_trip() {
        let message = JoinMessage { sender_id: sender() };
        let bytes = message.marshal().unwrap();

        assert_eq!(JoinMessage::unmarshal(&bytes).unwrap(), message);
    }

    #[test]
    fn test_payload_is_carried_verbatim() {
        let payload: Vec<u8> = (0..=255).collect();
        let message = TssProtocolMessage {
            sender_id: sender(),
            payload: payload.clone(),
            is_broadcast: false,
        };

        let decoded = TssProtocolMessage::unmarshal(&message.marshal().unwrap()).unwrap();
        assert_eq!(decoded.payload, payload);
        assert!(!decoded.is_broadcast);
    }

    #[test]
    fn test_empty_payload_round_trips() {
        let message = TssProtocolMessage {
            sender_id: sender(),
            payload: Vec::new(),
            is_broadcast: false,
        };
        let decoded = TssProtocolMessage::unmarshal(&message.marshal().unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_truncated_bytes_are_rejected() {
        let bytes = encode(&tss_message().into()).unwrap();

        for len in 0..bytes.len() {
            let err = decode(&bytes[..len], MessageKind::Tss).unwrap_err();
            assert!(matches!(err, DecodeError::Malformed(_)), "len {}: {:?}", len, err);
        }
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = encode(&JoinMessage { sender_id: sender() }.into()).unwrap();
        bytes.push(0x00);

        assert!(matches!(
            decode(&bytes, MessageKind::Join),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let bytes = encode(&JoinMessage { sender_id: sender() }.into()).unwrap();

        assert_eq!(
            decode(&bytes, MessageKind::Tss).unwrap_err(),
            DecodeError::KindMismatch {
                expected: MessageKind::Tss,
                actual: MessageKind::Join,
            }
        );
        assert!(TssProtocolMessage::unmarshal(&bytes).is_err());
    }

    #[test]
    fn test_unknown_discriminant_is_rejected() {
        let mut bytes = encode(&JoinMessage { sender_id: sender() }.into()).unwrap();
        bytes[0] = 0x07;

        assert!(matches!(
            decode(&bytes, MessageKind::Join),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_tag_registry() {
        assert_eq!(MessageKind::from_type_tag("ecdsa/tss_message"), Some(MessageKind::Tss));
        assert_eq!(MessageKind::from_type_tag("ecdsa/join_message"), Some(MessageKind::Join));
        assert_eq!(MessageKind::from_type_tag("ecdsa/other"), None);
        assert_eq!(TssProtocolMessage::type_tag(), TSS_MESSAGE_TYPE);
        assert_eq!(JoinMessage::type_tag(), JOIN_MESSAGE_TYPE);
    }

    #[test]
    fn test_decode_tagged_dispatches_on_tag() {
        let message = ProtocolMessage::from(tss_message());
        let bytes = encode(&message).unwrap();

        assert_eq!(decode_tagged(TSS_MESSAGE_TYPE, &bytes).unwrap(), message);
        assert!(matches!(
            decode_tagged(JOIN_MESSAGE_TYPE, &bytes),
            Err(DecodeError::KindMismatch { .. })
        ));
        assert_eq!(
            decode_tagged("ecdsa/other", &bytes).unwrap_err(),
            DecodeError::UnknownType("ecdsa/other".to_string())
        );
    }

    #[test]
    fn test_sender_id_accessor() {
        let message = ProtocolMessage::from(tss_message());
        assert_eq!(message.sender_id(), &sender());
        assert_eq!(message.type_tag(), TSS_MESSAGE_TYPE);
    }
}
