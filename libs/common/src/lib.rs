//! Primitives shared by the keep client crates.
//!
//! Holds the member and signature types that cross the chain boundary, the
//! `sol!` bindings for the keep contracts and the envelope used to carry TSS
//! protocol traffic between keep members.

pub mod byteutils;
pub mod member;
pub mod signature;
pub mod tss;

pub mod interfaces {
    pub mod bonded_ecdsa_keep;
    pub mod bonded_ecdsa_keep_factory;
}

pub use member::{KeepAddress, MemberId};
pub use signature::{Signature, SignatureError};
