//! Unified error system for Accord
//!
//! One error enum for every core operation, with message constructors in the
//! same shape for each category. Oracle validation failures get their own
//! serializable enum because they cross the session boundary back to the
//! requester.

use serde::{Deserialize, Serialize};

/// Validation failures raised by the oracle while checking a filtered assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum OracleError {
    /// The assertion does not derive from a real proposal (tampered or malformed)
    #[error("Assertion integrity check failed: {message}")]
    AssertionIntegrity {
        /// What failed to verify
        message: String,
    },

    /// A revealed command is not addressed to the oracle or is not an attested fact
    #[error("Oracle received unexpected command: {message}")]
    UnexpectedCommand {
        /// Description of the offending command
        message: String,
    },

    /// The declared output disagrees with the oracle's derivation
    #[error("Fact mismatch: {of} derives {expected}, assertion claims {claimed}")]
    FactMismatch {
        /// Declared input
        of: i64,
        /// Value the oracle derives from the input
        expected: i64,
        /// Value the assertion claims
        claimed: i64,
    },

    /// A command requiring the oracle's signature was hidden from it
    #[error("Command visibility check failed: {message}")]
    Visibility {
        /// Description of the hidden command(s)
        message: String,
    },
}

impl OracleError {
    /// Create an assertion integrity error
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::AssertionIntegrity {
            message: message.into(),
        }
    }

    /// Create an unexpected command error
    pub fn unexpected_command(message: impl Into<String>) -> Self {
        Self::UnexpectedCommand {
            message: message.into(),
        }
    }

    /// Create a visibility error
    pub fn visibility(message: impl Into<String>) -> Self {
        Self::Visibility {
            message: message.into(),
        }
    }
}

/// Unified error type for all Accord operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AccordError {
    /// Local validation failed (contract violation, acceptance threshold, bad input)
    #[error("Validation failed: {message}")]
    Validation {
        /// Which rule was violated
        message: String,
    },

    /// The counterparty refused the proposal
    #[error("Rejected by {party}: {reason}")]
    Rejected {
        /// Name of the rejecting party
        party: String,
        /// Reason reported by the counterparty
        reason: String,
    },

    /// The session was torn down before the expected message arrived
    #[error("Session closed: {message}")]
    SessionClosed {
        /// Context for the closed session
        message: String,
    },

    /// A suspended receive exceeded its deadline
    #[error("Operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// Deadline in milliseconds
        timeout_ms: u64,
    },

    /// The target party is not reachable on the network
    #[error("Peer unreachable: {peer}")]
    PeerUnreachable {
        /// Identifier of the unreachable peer
        peer: String,
    },

    /// A received signature did not check out
    #[error("Signature verification failed: {message}")]
    SignatureVerification {
        /// What failed to verify
        message: String,
    },

    /// The oracle refused to sign
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Notarisation or recording failed
    #[error("Finalization failed: {message}")]
    Finalization {
        /// Description of the failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the codec failure
        message: String,
    },

    /// The counterpart violated the message protocol
    #[error("Protocol violation: {message}")]
    Protocol {
        /// Description of the unexpected message
        message: String,
    },

    /// Network or transport error
    #[error("Network error: {message}")]
    Network {
        /// Description of the network failure
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the bad setting
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl AccordError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a rejection error
    pub fn rejected(party: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            party: party.into(),
            reason: reason.into(),
        }
    }

    /// Create a session closed error
    pub fn session_closed(message: impl Into<String>) -> Self {
        Self::SessionClosed {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a peer unreachable error
    pub fn peer_unreachable(peer: impl Into<String>) -> Self {
        Self::PeerUnreachable { peer: peer.into() }
    }

    /// Create a signature verification error
    pub fn signature(message: impl Into<String>) -> Self {
        Self::SignatureVerification {
            message: message.into(),
        }
    }

    /// Create a finalization error
    pub fn finalization(message: impl Into<String>) -> Self {
        Self::Finalization {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a protocol violation error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for failures raised locally before any message left this party
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Config { .. })
    }
}

/// Standard Result type for Accord operations
pub type Result<T> = std::result::Result<T, AccordError>;

impl From<bincode::Error> for AccordError {
    fn from(err: bincode::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for AccordError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}
