use thiserror::Error;

use crate::bridge::LegKind;

/// Errors raised while a call is being bridged.
///
/// Only `Parse` is recoverable: the offending frame is discarded and the
/// session keeps running. Every other variant ends the call (never the process).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Inbound frame was not valid JSON or lacked required fields
    #[error("Malformed {leg} frame: {reason}")]
    Parse { leg: LegKind, reason: String },

    /// A leg reported a transport fault
    #[error("{leg} transport error: {reason}")]
    Transport { leg: LegKind, reason: String },

    /// A leg was closed by its peer
    #[error("{leg} closed by peer{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    PeerClosed { leg: LegKind, reason: Option<String> },

    /// The AI leg could not be established
    #[error("Failed to connect {leg}: {reason}")]
    ConnectFailed { leg: LegKind, reason: String },
}

impl BridgeError {
    /// Returns true when the error must tear the whole call down.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse { .. })
    }

    /// The leg this error originated on.
    pub fn leg(&self) -> LegKind {
        match self {
            Self::Parse { leg, .. }
            | Self::Transport { leg, .. }
            | Self::PeerClosed { leg, .. }
            | Self::ConnectFailed { leg, .. } => *leg,
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_not_fatal() {
        let err = BridgeError::Parse {
            leg: LegKind::Telephony,
            reason: "expected value".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.leg(), LegKind::Telephony);
        assert_eq!(
            err.to_string(),
            "Malformed telephony frame: expected value"
        );
    }

    #[test]
    fn test_transport_and_close_are_fatal() {
        let transport = BridgeError::Transport {
            leg: LegKind::Ai,
            reason: "reset".to_string(),
        };
        let closed = BridgeError::PeerClosed {
            leg: LegKind::Telephony,
            reason: None,
        };
        assert!(transport.is_fatal());
        assert!(closed.is_fatal());
        assert_eq!(closed.to_string(), "telephony closed by peer");
    }

    #[test]
    fn test_peer_closed_with_reason() {
        let err = BridgeError::PeerClosed {
            leg: LegKind::Ai,
            reason: Some("going away".to_string()),
        };
        assert_eq!(err.to_string(), "ai closed by peer: going away");
    }
}
