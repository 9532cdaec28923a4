//! Initiator side of the IOU negotiation
//!
//! ```text
//! GENERATING -> VERIFYING -> SIGNING -> GATHERING_SIGNATURES -> FINALIZING -> DONE
//!                                                                          \-> FAILED
//! ```
//!
//! Steps only move forward. A contract violation fails in VERIFYING before
//! any message leaves the initiator.

use crate::collect::collect_signatures;
use crate::error::NegotiationError;
use accord_core::{
    AccordError, Command, CommandKind, ContractVerifier, FilteredAssertion, FinalizedRecord,
    Finalizer, IouState, KeyPair, OutputRecord, Party, ProgressStep, ProgressTracker, Proposal,
    ProposalBuilder, ProposalSignature, Result, SignedProposal,
};
use accord_oracle::{QueryRequester, SignRequester};
use accord_transport::Endpoint;
use std::fmt;
use std::sync::Arc;

/// Initiator steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InitiatorStep {
    /// Building the proposal (and querying the oracle when attested)
    Generating,
    /// Running the contract check
    Verifying,
    /// Signing locally (and obtaining the oracle's signature when attested)
    Signing,
    /// Collecting the counterparty's signature
    GatheringSignatures,
    /// Notarising and recording
    Finalizing,
    /// Finalized record returned
    Done,
    /// Some step failed
    Failed,
}

impl fmt::Display for InitiatorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InitiatorStep::Generating => "GENERATING",
            InitiatorStep::Verifying => "VERIFYING",
            InitiatorStep::Signing => "SIGNING",
            InitiatorStep::GatheringSignatures => "GATHERING_SIGNATURES",
            InitiatorStep::Finalizing => "FINALIZING",
            InitiatorStep::Done => "DONE",
            InitiatorStep::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

impl ProgressStep for InitiatorStep {
    fn is_terminal(&self) -> bool {
        matches!(self, InitiatorStep::Done | InitiatorStep::Failed)
    }
}

/// Oracle fact to embed in the proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleAttestation {
    /// Oracle to query and to have sign
    pub oracle: Party,
    /// Input whose derived value is attested
    pub input: i64,
}

/// What the caller wants agreed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationTerms {
    /// IOU value
    pub value: i64,
    /// Borrower who must countersign
    pub counterparty: Party,
    /// Notary the proposal is addressed to
    pub notary: Party,
    /// Optional oracle-attested fact
    pub attestation: Option<OracleAttestation>,
}

impl NegotiationTerms {
    /// Plain IOU terms without an oracle
    pub fn new(value: i64, counterparty: Party, notary: Party) -> Self {
        Self {
            value,
            counterparty,
            notary,
            attestation: None,
        }
    }

    /// Attach an oracle-attested fact
    pub fn with_attestation(mut self, oracle: Party, input: i64) -> Self {
        self.attestation = Some(OracleAttestation { oracle, input });
        self
    }
}

/// Initiator role of the negotiation
pub struct Initiator {
    keys: KeyPair,
    party: Party,
    verifier: Arc<dyn ContractVerifier>,
    finalizer: Arc<dyn Finalizer>,
    progress: ProgressTracker<InitiatorStep>,
}

impl Initiator {
    /// Create an initiator acting as `party`
    pub fn new(
        keys: KeyPair,
        party: Party,
        verifier: Arc<dyn ContractVerifier>,
        finalizer: Arc<dyn Finalizer>,
    ) -> Self {
        Self {
            keys,
            party,
            verifier,
            finalizer,
            progress: ProgressTracker::new("iou-initiator"),
        }
    }

    /// Steps taken so far
    pub fn progress(&self) -> &ProgressTracker<InitiatorStep> {
        &self.progress
    }

    /// Run the negotiation to completion
    pub async fn run(
        &mut self,
        endpoint: &Endpoint,
        terms: NegotiationTerms,
    ) -> std::result::Result<FinalizedRecord, NegotiationError> {
        match self.drive(endpoint, &terms).await {
            Ok(record) => {
                self.progress
                    .set_step(InitiatorStep::Done)
                    .map_err(|err| NegotiationError::new(InitiatorStep::Finalizing, err))?;
                tracing::info!(party = %self.party, proposal = %record.signed.proposal, "negotiation finalized");
                Ok(record)
            }
            Err(source) => {
                let step = self.progress.current().unwrap_or(InitiatorStep::Generating);
                if let Err(err) = self.progress.set_step(InitiatorStep::Failed) {
                    tracing::warn!(error = %err, "could not record failure");
                }
                tracing::warn!(party = %self.party, %step, error = %source, "negotiation failed");
                Err(NegotiationError::new(step, source))
            }
        }
    }

    async fn drive(&mut self, endpoint: &Endpoint, terms: &NegotiationTerms) -> Result<FinalizedRecord> {
        self.progress.set_step(InitiatorStep::Generating)?;
        let proposal = self.generate(endpoint, terms).await?;

        self.progress.set_step(InitiatorStep::Verifying)?;
        self.verifier.verify(&proposal)?;

        self.progress.set_step(InitiatorStep::Signing)?;
        let mut signed = SignedProposal::new(
            proposal.clone(),
            ProposalSignature::sign(&self.keys, &proposal.id()),
        );
        if let Some(attestation) = &terms.attestation {
            let assertion = FilteredAssertion::for_signer(&proposal, &attestation.oracle.key)?;
            let signature = SignRequester::new(attestation.oracle.clone())
                .run(endpoint, &proposal, assertion)
                .await?;
            signed = signed.with_signature(signature);
        }

        self.progress.set_step(InitiatorStep::GatheringSignatures)?;
        let signed =
            collect_signatures(endpoint, signed, std::slice::from_ref(&terms.counterparty)).await?;

        self.progress.set_step(InitiatorStep::Finalizing)?;
        self.finalizer.finalize(signed).await
    }

    async fn generate(&self, endpoint: &Endpoint, terms: &NegotiationTerms) -> Result<Proposal> {
        if terms.counterparty.key == self.party.key {
            return Err(AccordError::validation("cannot negotiate with ourselves"));
        }

        let mut builder = ProposalBuilder::new(terms.notary.clone())
            .add_output(OutputRecord::Iou(IouState {
                value: terms.value,
                lender: self.party.clone(),
                borrower: terms.counterparty.clone(),
            }))
            .add_command(Command::new(
                CommandKind::Create,
                vec![self.party.key, terms.counterparty.key],
            ));

        if let Some(attestation) = &terms.attestation {
            let answer = QueryRequester::new(attestation.oracle.clone())
                .run(endpoint, attestation.input)
                .await?;
            builder = builder.add_command(Command::new(
                CommandKind::AttestedFact {
                    of: attestation.input,
                    value: answer,
                },
                vec![attestation.oracle.key],
            ));
        }

        builder.build()
    }
}

impl fmt::Debug for Initiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Initiator")
            .field("party", &self.party)
            .field("progress", &self.progress)
            .finish()
    }
}
