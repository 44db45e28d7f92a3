mod subscription;
mod types;
mod watcher;

pub use subscription::Subscription;
pub use types::{
    parse_log, ConflictingPublicKeySubmittedEvent, DomainEvent, EventCategory, KeepClosedEvent,
    KeepCreatedEvent, KeepEvent, KeepTerminatedEvent, PublicKeyPublishedEvent,
    SignatureRequestedEvent,
};
pub use watcher::{EventWatcher, DEFAULT_POLL_INTERVAL, RESCAN_BLOCKS};
