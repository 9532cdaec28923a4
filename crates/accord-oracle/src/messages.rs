//! Wire messages of the oracle protocols

use accord_core::{FilteredAssertion, OracleError, ProposalSignature};
use serde::{Deserialize, Serialize};

/// Oracle Query Protocol messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMessage {
    /// Requester asks for the value derived from `input`
    Request {
        /// Queried input
        input: i64,
    },
    /// Oracle's answer
    Answer {
        /// Derived value
        value: i64,
    },
    /// The addressed party runs no oracle
    Unavailable {
        /// Why the request could not be served
        reason: String,
    },
}

/// Oracle Sign Protocol messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignMessage {
    /// Requester asks the oracle to attest to a filtered view
    Request {
        /// View revealing the commands the oracle must sign
        assertion: FilteredAssertion,
    },
    /// Oracle's signature over the proposal id
    Signature(ProposalSignature),
    /// Oracle refused to sign
    Failed(OracleError),
    /// The addressed party runs no oracle
    Unavailable {
        /// Why the request could not be served
        reason: String,
    },
}
