use std::fmt;

use keep_common::byteutils::ByteUtilsError;

use crate::events::EventCategory;

/// Errors surfaced by the chain layer.
#[derive(Debug, Clone)]
pub enum ChainError {
    /// RPC node unreachable, lagging or rejecting the request
    Rpc(String),
    /// Malformed address, ABI mismatch or undecodable contract data
    Binding(String),
    /// An established event stream failed
    Subscription {
        category: EventCategory,
        source: Box<ChainError>,
    },
    /// Signature components cannot be laid out as contract words
    InvalidSignature(String),
    /// A contract call failed
    Call {
        call: &'static str,
        source: Box<ChainError>,
    },
    /// An event handler panicked; its subscription is cancelled
    HandlerPanicked(EventCategory),
}

impl ChainError {
    /// Wraps an error with the name of the contract call that produced it.
    pub fn within(call: &'static str) -> impl FnOnce(ChainError) -> ChainError {
        move |source| ChainError::Call {
            call,
            source: Box::new(source),
        }
    }

    /// Wraps a stream error with the event category it belongs to.
    pub fn in_subscription(category: EventCategory) -> impl Fn(ChainError) -> ChainError {
        move |source| ChainError::Subscription {
            category,
            source: Box::new(source),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ChainError::Rpc(_) => true,
            ChainError::Call { source, .. } | ChainError::Subscription { source, .. } => {
                source.is_transient()
            }
            ChainError::Binding(_)
            | ChainError::InvalidSignature(_)
            | ChainError::HandlerPanicked(_) => false,
        }
    }

    /// Innermost error, with all context stripped.
    pub fn root(&self) -> &ChainError {
        match self {
            ChainError::Call { source, .. } | ChainError::Subscription { source, .. } => {
                source.root()
            }
            other => other,
        }
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Rpc(msg) => write!(f, "RPC error: {}", msg),
            ChainError::Binding(msg) => write!(f, "binding error: {}", msg),
            ChainError::Subscription { category, source } => {
                write!(f, "{} subscription failed: [{}]", category, source)
            }
            ChainError::InvalidSignature(msg) => write!(f, "invalid signature: {}", msg),
            ChainError::Call { call, source } => write!(f, "{} failed: [{}]", call, source),
            ChainError::HandlerPanicked(category) => write!(f, "{} handler panicked", category),
        }
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChainError::Call { source, .. } | ChainError::Subscription { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}

impl From<ByteUtilsError> for ChainError {
    fn from(e: ByteUtilsError) -> Self {
        ChainError::InvalidSignature(e.to_string())
    }
}

impl From<alloy_sol_types::Error> for ChainError {
    fn from(e: alloy_sol_types::Error) -> Self {
        ChainError::Binding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_context_is_rendered() {
        let err = ChainError::within("submitSignature")(ChainError::Rpc("timeout".into()));
        assert_eq!(err.to_string(), "submitSignature failed: [RPC error: timeout]");
        assert!(err.is_transient());
    }

    #[test]
    fn test_subscription_context_is_rendered() {
        let wrap = ChainError::in_subscription(EventCategory::KeepClosed);
        let err = wrap(ChainError::Binding("bad log".into()));
        assert_eq!(
            err.to_string(),
            "keep closed subscription failed: [binding error: bad log]"
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn test_handler_panic_is_not_transient() {
        let err = ChainError::HandlerPanicked(EventCategory::SignatureRequested);
        assert_eq!(err.to_string(), "signature requested handler panicked");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_root_strips_context() {
        let inner = ChainError::InvalidSignature("too wide".into());
        let err = ChainError::within("submitSignature")(inner);
        assert!(matches!(err.root(), ChainError::InvalidSignature(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
