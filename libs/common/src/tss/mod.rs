//! Envelope for TSS traffic between keep members.
//!
//! The threshold-signing engine produces opaque payloads; this module wraps
//! them with the sender and routing mode, and announces readiness with join
//! messages. The outer transport demultiplexes on [`MessageKind::type_tag`].

mod message;

pub use message::{
    decode, decode_tagged, encode, DecodeError, EncodeError, JoinMessage, MessageKind,
    ProtocolMessage, TssProtocolMessage, WireMessage, JOIN_MESSAGE_TYPE, MAX_MESSAGE_SIZE,
    TSS_MESSAGE_TYPE,
};
