//! Signatures over proposals and the records built from them

use crate::crypto::{Hash32, KeyPair, PartyKey};
use crate::proposal::Proposal;
use crate::{AccordError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Attestation by one key over a proposal id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSignature {
    /// Signing key
    pub by: PartyKey,
    /// Ed25519 signature bytes over the proposal id
    pub bytes: Vec<u8>,
}

impl ProposalSignature {
    /// Sign the proposal id `id` with `keys`
    pub fn sign(keys: &KeyPair, id: &Hash32) -> Self {
        Self {
            by: keys.public(),
            bytes: keys.sign(id),
        }
    }

    /// Check this signature against the proposal id `id`
    pub fn verify(&self, id: &Hash32) -> Result<()> {
        self.by.verify(id, &self.bytes)
    }
}

/// A proposal together with the signatures gathered so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    /// The frozen proposal
    pub proposal: Proposal,
    /// Collected signatures, one per key
    pub signatures: Vec<ProposalSignature>,
}

impl SignedProposal {
    /// Wrap a proposal with its first signature
    pub fn new(proposal: Proposal, signature: ProposalSignature) -> Self {
        Self {
            proposal,
            signatures: vec![signature],
        }
    }

    /// Proposal id
    pub fn id(&self) -> Hash32 {
        self.proposal.id()
    }

    /// Add a signature, replacing any earlier one by the same key
    pub fn with_signature(mut self, signature: ProposalSignature) -> Self {
        self.signatures.retain(|existing| existing.by != signature.by);
        self.signatures.push(signature);
        self
    }

    /// Keys that have signed
    pub fn signed_by(&self) -> BTreeSet<PartyKey> {
        self.signatures.iter().map(|sig| sig.by).collect()
    }

    /// Every key some command requires
    pub fn required_signers(&self) -> BTreeSet<PartyKey> {
        self.proposal.required_signers()
    }

    /// Required keys without a signature yet
    pub fn missing_signers(&self) -> BTreeSet<PartyKey> {
        let signed = self.signed_by();
        self.required_signers()
            .into_iter()
            .filter(|key| !signed.contains(key))
            .collect()
    }

    /// Verify every attached signature and that only `allowed_missing` are absent
    pub fn verify_signatures_except(&self, allowed_missing: &BTreeSet<PartyKey>) -> Result<()> {
        let id = self.id();
        for signature in &self.signatures {
            signature.verify(&id)?;
        }

        let unexpected: Vec<String> = self
            .missing_signers()
            .difference(allowed_missing)
            .map(ToString::to_string)
            .collect();
        if unexpected.is_empty() {
            Ok(())
        } else {
            Err(AccordError::signature(format!(
                "missing signatures from {}",
                unexpected.join(", ")
            )))
        }
    }

    /// Verify that every required signer has validly signed
    pub fn verify_required_signatures(&self) -> Result<()> {
        self.verify_signatures_except(&BTreeSet::new())
    }
}

/// A notarised, durably recorded proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedRecord {
    /// Fully signed proposal
    pub signed: SignedProposal,
    /// Notary's countersignature
    pub notary_signature: ProposalSignature,
    /// Recording time, milliseconds since the Unix epoch
    pub recorded_at_ms: u64,
}

impl FinalizedRecord {
    /// Id of the recorded proposal
    pub fn id(&self) -> Hash32 {
        self.signed.id()
    }

    /// Participant signatures (the notary's is kept separately)
    pub fn signatures(&self) -> &[ProposalSignature] {
        &self.signed.signatures
    }
}
