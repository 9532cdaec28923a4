//! Collaborator interfaces
//!
//! The core depends on contract validation and finalization only through
//! these traits. Handlers live in higher layers (the agent's in-memory
//! ledger, the negotiation crate's reference contract) or in tests.

use crate::proposal::Proposal;
use crate::signed::{FinalizedRecord, SignedProposal};
use crate::Result;
use async_trait::async_trait;

/// Business-rule check deciding a proposal's structural validity
pub trait ContractVerifier: Send + Sync {
    /// Return `AccordError::Validation` if `proposal` violates the contract
    fn verify(&self, proposal: &Proposal) -> Result<()>;
}

/// Notarisation plus durable recording of a fully signed proposal
#[async_trait]
pub trait Finalizer: Send + Sync {
    /// Notarise and record `signed`, returning the finalized record
    async fn finalize(&self, signed: SignedProposal) -> Result<FinalizedRecord>;
}
