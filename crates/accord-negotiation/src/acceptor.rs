//! Acceptor side of the IOU negotiation
//!
//! Single-shot and reactive: wait for one proposal, validate it, then either
//! countersign or send an explicit rejection so the collector never hangs.

use crate::collect::{check_received, countersign, receive_proposal, reject};
use accord_core::{
    AccordError, ContractVerifier, KeyPair, PartyKey, ProgressStep, ProgressTracker, Result,
    SignedProposal,
};
use accord_transport::Session;
use std::fmt;
use std::sync::Arc;

/// Acceptor steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AcceptorStep {
    /// Suspended on the initiator's proposal
    AwaitProposal,
    /// Checking contract, signatures and the acceptance bound
    Validate,
    /// Countersigning
    Sign,
    /// Sending the rejection
    Reject,
    /// Signature returned
    Done,
    /// Proposal refused or exchange failed
    Failed,
}

impl fmt::Display for AcceptorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AcceptorStep::AwaitProposal => "AWAIT_PROPOSAL",
            AcceptorStep::Validate => "VALIDATE",
            AcceptorStep::Sign => "SIGN",
            AcceptorStep::Reject => "REJECT",
            AcceptorStep::Done => "DONE",
            AcceptorStep::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

impl ProgressStep for AcceptorStep {
    fn is_terminal(&self) -> bool {
        matches!(self, AcceptorStep::Done | AcceptorStep::Failed)
    }
}

/// Responder role of the negotiation
pub struct Acceptor {
    keys: KeyPair,
    verifier: Arc<dyn ContractVerifier>,
    acceptance_threshold: i64,
    progress: ProgressTracker<AcceptorStep>,
}

impl Acceptor {
    /// Create an acceptor that signs IOUs up to `acceptance_threshold`
    pub fn new(
        keys: KeyPair,
        verifier: Arc<dyn ContractVerifier>,
        acceptance_threshold: i64,
    ) -> Self {
        Self {
            keys,
            verifier,
            acceptance_threshold,
            progress: ProgressTracker::new("iou-acceptor"),
        }
    }

    /// Steps taken so far
    pub fn progress(&self) -> &ProgressTracker<AcceptorStep> {
        &self.progress
    }

    /// Serve one negotiation on `session`
    ///
    /// Returns the proposal with the local signature added.
    pub async fn run(&mut self, session: Session) -> Result<SignedProposal> {
        let result = self.serve(session).await;
        let terminal = match &result {
            Ok(signed) => {
                tracing::info!(proposal = %signed.proposal, "countersigned");
                AcceptorStep::Done
            }
            Err(err) => {
                tracing::warn!(error = %err, "acceptor failed");
                AcceptorStep::Failed
            }
        };
        if let Err(err) = self.progress.set_step(terminal) {
            tracing::warn!(error = %err, "could not record {terminal}");
        }
        result
    }

    async fn serve(&mut self, mut session: Session) -> Result<SignedProposal> {
        self.progress.set_step(AcceptorStep::AwaitProposal)?;
        let signed = receive_proposal(&mut session).await?;

        self.progress.set_step(AcceptorStep::Validate)?;
        if let Err(err) = self.validate(&signed, &session.counterparty()) {
            self.progress.set_step(AcceptorStep::Reject)?;
            tracing::warn!(proposal = %signed.proposal, reason = %err, "rejecting proposal");
            if let Err(send_err) = reject(&session, &err) {
                tracing::warn!(error = %send_err, "rejection not delivered");
            }
            session.close();
            return Err(err);
        }

        self.progress.set_step(AcceptorStep::Sign)?;
        let signature = countersign(&session, &self.keys, &signed)?;
        session.close();
        Ok(signed.with_signature(signature))
    }

    fn validate(&self, signed: &SignedProposal, counterparty: &PartyKey) -> Result<()> {
        check_received(signed, &self.keys.public())?;
        if !signed.required_signers().contains(counterparty) {
            return Err(AccordError::validation(format!(
                "sender {counterparty} is not a signer of the proposal"
            )));
        }
        self.verifier.verify(&signed.proposal)?;

        let [output] = signed.proposal.outputs() else {
            return Err(AccordError::validation(
                "proposal must carry a single output",
            ));
        };
        let iou = output
            .as_iou()
            .ok_or_else(|| AccordError::validation("this must be an IOU transaction"))?;
        if iou.value > self.acceptance_threshold {
            return Err(AccordError::validation(format!(
                "IOU value {} exceeds the acceptance threshold {}",
                iou.value, self.acceptance_threshold
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Acceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acceptor")
            .field("key", &self.keys.public())
            .field("acceptance_threshold", &self.acceptance_threshold)
            .field("progress", &self.progress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::IouContract;
    use crate::messages::NegotiationMessage;
    use accord_core::{
        Command, CommandKind, IouState, OutputRecord, Party, ProposalBuilder, ProposalSignature,
    };
    use accord_transport::{InMemoryNetwork, ProtocolId};
    use assert_matches::assert_matches;

    fn keys(seed: u8) -> KeyPair {
        KeyPair::from_seed([seed; 32])
    }

    fn signed_by_alice(value: i64) -> SignedProposal {
        let alice = Party::new("Alice", keys(1).public());
        let bob = Party::new("Bob", keys(2).public());
        let proposal = ProposalBuilder::new(Party::new("Notary", keys(9).public()))
            .add_output(OutputRecord::Iou(IouState {
                value,
                lender: alice.clone(),
                borrower: bob.clone(),
            }))
            .add_command(Command::new(CommandKind::Create, vec![alice.key, bob.key]))
            .build()
            .unwrap();
        let id = proposal.id();
        SignedProposal::new(proposal, ProposalSignature::sign(&keys(1), &id))
    }

    #[tokio::test]
    async fn test_proposal_relayed_by_non_signer_is_rejected() {
        let network = InMemoryNetwork::default();
        let (carol, _carol_inbox) = network.register(keys(5).public()).await.unwrap();
        let (_, mut bob_inbox) = network.register(keys(2).public()).await.unwrap();

        let mut session = carol
            .open(&keys(2).public(), ProtocolId::Negotiation)
            .await
            .unwrap();
        session
            .send(&NegotiationMessage::Propose(signed_by_alice(50)))
            .unwrap();

        let mut acceptor = Acceptor::new(keys(2), Arc::new(IouContract), 100);
        let incoming = bob_inbox.accept().await.unwrap();
        assert_matches!(
            acceptor.run(incoming.session).await,
            Err(AccordError::Validation { .. })
        );
        assert_matches!(
            session.receive::<NegotiationMessage>().await,
            Ok(NegotiationMessage::Rejected { .. })
        );
        assert_eq!(
            acceptor.progress().history(),
            &[
                AcceptorStep::AwaitProposal,
                AcceptorStep::Validate,
                AcceptorStep::Reject,
                AcceptorStep::Failed,
            ]
        );
    }

    async fn offer_from_alice(value: i64) -> (Result<SignedProposal>, NegotiationMessage) {
        let network = InMemoryNetwork::default();
        let (alice, _alice_inbox) = network.register(keys(1).public()).await.unwrap();
        let (_, mut bob_inbox) = network.register(keys(2).public()).await.unwrap();

        let mut session = alice
            .open(&keys(2).public(), ProtocolId::Negotiation)
            .await
            .unwrap();
        session
            .send(&NegotiationMessage::Propose(signed_by_alice(value)))
            .unwrap();

        let mut acceptor = Acceptor::new(keys(2), Arc::new(IouContract), 100);
        let incoming = bob_inbox.accept().await.unwrap();
        let result = acceptor.run(incoming.session).await;
        let reply = session.receive::<NegotiationMessage>().await.unwrap();
        (result, reply)
    }

    #[tokio::test]
    async fn test_value_at_threshold_is_countersigned() {
        let (result, reply) = offer_from_alice(100).await;
        assert!(result.unwrap().missing_signers().is_empty());
        assert_matches!(reply, NegotiationMessage::Signature(_));
    }

    #[tokio::test]
    async fn test_value_one_over_threshold_is_rejected() {
        let (result, reply) = offer_from_alice(101).await;
        assert_matches!(result, Err(AccordError::Validation { .. }));
        assert_matches!(reply, NegotiationMessage::Rejected { .. });
    }

    #[tokio::test]
    async fn test_undeliverable_rejection_still_ends_failed() {
        let network = InMemoryNetwork::default();
        let (alice, _alice_inbox) = network.register(keys(1).public()).await.unwrap();
        let (_, mut bob_inbox) = network.register(keys(2).public()).await.unwrap();

        let session = alice
            .open(&keys(2).public(), ProtocolId::Negotiation)
            .await
            .unwrap();
        session
            .send(&NegotiationMessage::Propose(signed_by_alice(150)))
            .unwrap();
        session.close();

        let mut acceptor = Acceptor::new(keys(2), Arc::new(IouContract), 100);
        let incoming = bob_inbox.accept().await.unwrap();
        assert_matches!(
            acceptor.run(incoming.session).await,
            Err(AccordError::Validation { .. })
        );
        assert_eq!(
            acceptor.progress().history(),
            &[
                AcceptorStep::AwaitProposal,
                AcceptorStep::Validate,
                AcceptorStep::Reject,
                AcceptorStep::Failed,
            ]
        );
    }

    #[tokio::test]
    async fn test_initiator_hang_up_fails_without_validating() {
        let network = InMemoryNetwork::default();
        let (alice, _alice_inbox) = network.register(keys(1).public()).await.unwrap();
        let (_, mut bob_inbox) = network.register(keys(2).public()).await.unwrap();

        alice
            .open(&keys(2).public(), ProtocolId::Negotiation)
            .await
            .unwrap()
            .close();

        let mut acceptor = Acceptor::new(keys(2), Arc::new(IouContract), 100);
        let incoming = bob_inbox.accept().await.unwrap();
        assert_matches!(
            acceptor.run(incoming.session).await,
            Err(AccordError::SessionClosed { .. })
        );
        assert_eq!(
            acceptor.progress().history(),
            &[AcceptorStep::AwaitProposal, AcceptorStep::Failed]
        );
    }
}
