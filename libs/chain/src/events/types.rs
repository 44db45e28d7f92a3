use std::fmt;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolEvent;
use keep_common::interfaces::bonded_ecdsa_keep::IBondedECDSAKeep;
use keep_common::interfaces::bonded_ecdsa_keep_factory::IBondedECDSAKeepFactory;
use keep_common::{KeepAddress, MemberId};

use crate::errors::ChainError;
use crate::ledger::ObservedLog;

/// The event categories a client watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    KeepCreated,
    KeepClosed,
    KeepTerminated,
    PublicKeyPublished,
    ConflictingPublicKeySubmitted,
    SignatureRequested,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::KeepCreated,
        EventCategory::KeepClosed,
        EventCategory::KeepTerminated,
        EventCategory::PublicKeyPublished,
        EventCategory::ConflictingPublicKeySubmitted,
        EventCategory::SignatureRequested,
    ];

    /// Topic0 of the category's log.
    pub fn signature_hash(self) -> B256 {
        match self {
            EventCategory::KeepCreated => {
                IBondedECDSAKeepFactory::BondedECDSAKeepCreated::SIGNATURE_HASH
            }
            EventCategory::KeepClosed => IBondedECDSAKeep::KeepClosed::SIGNATURE_HASH,
            EventCategory::KeepTerminated => IBondedECDSAKeep::KeepTerminated::SIGNATURE_HASH,
            EventCategory::PublicKeyPublished => {
                IBondedECDSAKeep::PublicKeyPublished::SIGNATURE_HASH
            }
            EventCategory::ConflictingPublicKeySubmitted => {
                IBondedECDSAKeep::ConflictingPublicKeySubmitted::SIGNATURE_HASH
            }
            EventCategory::SignatureRequested => {
                IBondedECDSAKeep::SignatureRequested::SIGNATURE_HASH
            }
        }
    }

    pub fn from_signature_hash(hash: &B256) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.signature_hash() == *hash)
    }

    pub fn name(self) -> &'static str {
        match self {
            EventCategory::KeepCreated => "keep created",
            EventCategory::KeepClosed => "keep closed",
            EventCategory::KeepTerminated => "keep terminated",
            EventCategory::PublicKeyPublished => "public key published",
            EventCategory::ConflictingPublicKeySubmitted => "conflicting public key submitted",
            EventCategory::SignatureRequested => "signature requested",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A new keep was created by the factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepCreatedEvent {
    pub keep_address: KeepAddress,
    /// In the order the factory selected them.
    pub members: Vec<MemberId>,
    pub owner: Address,
    pub application: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepClosedEvent {
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepTerminatedEvent {
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyPublishedEvent {
    pub public_key: [u8; 64],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingPublicKeySubmittedEvent {
    pub submitting_member: Address,
    pub conflicting_public_key: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequestedEvent {
    pub digest: B256,
    pub block_number: u64,
}

/// Any decoded keep event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    KeepCreated(KeepCreatedEvent),
    KeepClosed(KeepClosedEvent),
    KeepTerminated(KeepTerminatedEvent),
    PublicKeyPublished(PublicKeyPublishedEvent),
    ConflictingPublicKeySubmitted(ConflictingPublicKeySubmittedEvent),
    SignatureRequested(SignatureRequestedEvent),
}

impl DomainEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            DomainEvent::KeepCreated(_) => EventCategory::KeepCreated,
            DomainEvent::KeepClosed(_) => EventCategory::KeepClosed,
            DomainEvent::KeepTerminated(_) => EventCategory::KeepTerminated,
            DomainEvent::PublicKeyPublished(_) => EventCategory::PublicKeyPublished,
            DomainEvent::ConflictingPublicKeySubmitted(_) => {
                EventCategory::ConflictingPublicKeySubmitted
            }
            DomainEvent::SignatureRequested(_) => EventCategory::SignatureRequested,
        }
    }
}

/// A typed event decoded from exactly one ledger log.
pub trait KeepEvent: Sized + Send + 'static {
    const CATEGORY: EventCategory;

    fn decode(log: &ObservedLog) -> Result<Self, ChainError>;
}

fn decode_error(category: EventCategory, e: impl fmt::Display) -> ChainError {
    ChainError::Binding(format!("cannot decode {} log: {}", category, e))
}

impl KeepEvent for KeepCreatedEvent {
    const CATEGORY: EventCategory = EventCategory::KeepCreated;

    fn decode(log: &ObservedLog) -> Result<Self, ChainError> {
        let decoded = IBondedECDSAKeepFactory::BondedECDSAKeepCreated::decode_log(&log.inner)
            .map_err(|e| decode_error(Self::CATEGORY, e))?;
        let event = decoded.data;

        Ok(Self {
            keep_address: event.keep_address,
            members: event.members.iter().map(MemberId::from).collect(),
            owner: event.owner,
            application: event.application,
        })
    }
}

impl KeepEvent for KeepClosedEvent {
    const CATEGORY: EventCategory = EventCategory::KeepClosed;

    fn decode(log: &ObservedLog) -> Result<Self, ChainError> {
        IBondedECDSAKeep::KeepClosed::decode_log(&log.inner)
            .map_err(|e| decode_error(Self::CATEGORY, e))?;
        Ok(Self {
            block_number: log.block_number,
        })
    }
}

impl KeepEvent for KeepTerminatedEvent {
    const CATEGORY: EventCategory = EventCategory::KeepTerminated;

    fn decode(log: &ObservedLog) -> Result<Self, ChainError> {
        IBondedECDSAKeep::KeepTerminated::decode_log(&log.inner)
            .map_err(|e| decode_error(Self::CATEGORY, e))?;
        Ok(Self {
            block_number: log.block_number,
        })
    }
}

impl KeepEvent for PublicKeyPublishedEvent {
    const CATEGORY: EventCategory = EventCategory::PublicKeyPublished;

    fn decode(log: &ObservedLog) -> Result<Self, ChainError> {
        let decoded = IBondedECDSAKeep::PublicKeyPublished::decode_log(&log.inner)
            .map_err(|e| decode_error(Self::CATEGORY, e))?;

        let public_key: [u8; 64] = decoded.data.public_key[..].try_into().map_err(|_| {
            decode_error(
                Self::CATEGORY,
                format!(
                    "public key has {} bytes, expected 64",
                    decoded.data.public_key.len()
                ),
            )
        })?;
        Ok(Self { public_key })
    }
}

impl KeepEvent for ConflictingPublicKeySubmittedEvent {
    const CATEGORY: EventCategory = EventCategory::ConflictingPublicKeySubmitted;

    fn decode(log: &ObservedLog) -> Result<Self, ChainError> {
        let decoded = IBondedECDSAKeep::ConflictingPublicKeySubmitted::decode_log(&log.inner)
            .map_err(|e| decode_error(Self::CATEGORY, e))?;
        let event = decoded.data;

        Ok(Self {
            submitting_member: event.submitting_member,
            conflicting_public_key: event.conflicting_public_key,
        })
    }
}

impl KeepEvent for SignatureRequestedEvent {
    const CATEGORY: EventCategory = EventCategory::SignatureRequested;

    fn decode(log: &ObservedLog) -> Result<Self, ChainError> {
        let decoded = IBondedECDSAKeep::SignatureRequested::decode_log(&log.inner)
            .map_err(|e| decode_error(Self::CATEGORY, e))?;

        Ok(Self {
            digest: decoded.data.digest,
            block_number: log.block_number,
        })
    }
}

/// Decodes any supported log, dispatching on its topic0.
pub fn parse_log(log: &ObservedLog) -> Result<DomainEvent, ChainError> {
    let topic0 = log
        .inner
        .data
        .topics()
        .first()
        .ok_or_else(|| ChainError::Binding("log has no topics".to_string()))?;

    let category = EventCategory::from_signature_hash(topic0)
        .ok_or_else(|| ChainError::Binding(format!("unknown event signature {}", topic0)))?;

    let event = match category {
        EventCategory::KeepCreated => DomainEvent::KeepCreated(KeepCreatedEvent::decode(log)?),
        EventCategory::KeepClosed => DomainEvent::KeepClosed(KeepClosedEvent::decode(log)?),
        EventCategory::KeepTerminated => {
            DomainEvent::KeepTerminated(KeepTerminatedEvent::decode(log)?)
        }
        EventCategory::PublicKeyPublished => {
            DomainEvent::PublicKeyPublished(PublicKeyPublishedEvent::decode(log)?)
        }
        EventCategory::ConflictingPublicKeySubmitted => {
            DomainEvent::ConflictingPublicKeySubmitted(ConflictingPublicKeySubmittedEvent::decode(
                log,
            )?)
        }
        EventCategory::SignatureRequested => {
            DomainEvent::SignatureRequested(SignatureRequestedEvent::decode(log)?)
        }
    };
    Ok(event)
}
