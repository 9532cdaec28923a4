//! Wire messages of signature collection

use accord_core::{ProposalSignature, SignedProposal};
use serde::{Deserialize, Serialize};

/// Messages exchanged while collecting a counterparty's signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationMessage {
    /// Partially signed proposal sent to a required signer
    Propose(SignedProposal),
    /// Counterparty's signature over the proposal id
    Signature(ProposalSignature),
    /// Counterparty refused to sign
    Rejected {
        /// Why the proposal was refused
        reason: String,
    },
}
