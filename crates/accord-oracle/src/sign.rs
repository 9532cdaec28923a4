//! Oracle Sign Protocol
//!
//! The requester ships a filtered view of its proposal and gets back either
//! the oracle's signature or the oracle's validation failure. A returned
//! signature is checked locally against the full proposal before it is
//! trusted.

use crate::messages::SignMessage;
use crate::service::OracleService;
use accord_core::{
    AccordError, FilteredAssertion, Party, ProgressStep, ProgressTracker, Proposal,
    ProposalSignature, Result,
};
use accord_transport::{Endpoint, ProtocolId, Session};
use std::fmt;

/// Requester steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignStep {
    /// Opening the session and sending the filtered view
    Requesting,
    /// Suspended on the oracle's reply
    AwaitingSignature,
    /// Checking the returned signature against the full proposal
    VerifyingSignature,
    /// Signature accepted
    Done,
    /// Exchange or verification failed
    Failed,
}

impl fmt::Display for SignStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignStep::Requesting => "REQUESTING",
            SignStep::AwaitingSignature => "AWAITING_SIGNATURE",
            SignStep::VerifyingSignature => "VERIFYING_SIGNATURE",
            SignStep::Done => "DONE",
            SignStep::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

impl ProgressStep for SignStep {
    fn is_terminal(&self) -> bool {
        matches!(self, SignStep::Done | SignStep::Failed)
    }
}

/// Requester role of the sign protocol
#[derive(Debug)]
pub struct SignRequester {
    oracle: Party,
    progress: ProgressTracker<SignStep>,
}

impl SignRequester {
    /// Prepare a sign request to `oracle`
    pub fn new(oracle: Party) -> Self {
        Self {
            oracle,
            progress: ProgressTracker::new("oracle-sign"),
        }
    }

    /// Steps taken so far
    pub fn progress(&self) -> &ProgressTracker<SignStep> {
        &self.progress
    }

    /// Obtain the oracle's signature over `proposal` by showing it `assertion`
    pub async fn run(
        &mut self,
        endpoint: &Endpoint,
        proposal: &Proposal,
        assertion: FilteredAssertion,
    ) -> Result<ProposalSignature> {
        let result = self.exchange(endpoint, proposal, assertion).await;
        match &result {
            Ok(_) => {
                self.record(SignStep::Done);
                tracing::info!(oracle = %self.oracle, %proposal, "oracle signature accepted");
            }
            Err(err) => {
                self.record(SignStep::Failed);
                tracing::warn!(oracle = %self.oracle, %proposal, error = %err, "oracle sign failed");
            }
        }
        result
    }

    fn record(&mut self, step: SignStep) {
        if let Err(err) = self.progress.set_step(step) {
            tracing::warn!(error = %err, "could not record {step}");
        }
    }

    async fn exchange(
        &mut self,
        endpoint: &Endpoint,
        proposal: &Proposal,
        assertion: FilteredAssertion,
    ) -> Result<ProposalSignature> {
        self.progress.set_step(SignStep::Requesting)?;
        let mut session = endpoint
            .open(&self.oracle.key, ProtocolId::OracleSign)
            .await?;
        session.send(&SignMessage::Request { assertion })?;

        self.progress.set_step(SignStep::AwaitingSignature)?;
        let reply: SignMessage = session.receive().await?;
        session.close();

        let signature = match reply {
            SignMessage::Signature(signature) => signature,
            SignMessage::Failed(err) => return Err(AccordError::Oracle(err)),
            SignMessage::Unavailable { reason } => {
                return Err(AccordError::rejected(self.oracle.name.clone(), reason))
            }
            SignMessage::Request { .. } => {
                return Err(AccordError::protocol("oracle replied with a sign request"))
            }
        };

        self.progress.set_step(SignStep::VerifyingSignature)?;
        if signature.by != self.oracle.key {
            return Err(AccordError::signature(format!(
                "expected a signature by {}, got one by {}",
                self.oracle.key, signature.by
            )));
        }
        signature.verify(&proposal.id())?;
        Ok(signature)
    }
}

/// Serve one sign request on `session`
///
/// Oracle validation failures are sent back as `SignMessage::Failed` and
/// also returned to the caller.
pub async fn respond_to_sign(service: &OracleService, mut session: Session) -> Result<()> {
    let request: SignMessage = session.receive().await?;
    let assertion = match request {
        SignMessage::Request { assertion } => assertion,
        other => {
            return Err(AccordError::protocol(format!(
                "expected a sign request, got {other:?}"
            )))
        }
    };

    let outcome = service.sign(&assertion);
    let reply = match &outcome {
        Ok(signature) => SignMessage::Signature(signature.clone()),
        Err(err) => {
            tracing::warn!(oracle = %service.party(), error = %err, "refused to sign");
            SignMessage::Failed(err.clone())
        }
    };
    session.send(&reply)?;
    session.close();
    outcome.map(|_| ()).map_err(AccordError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{
        Command, CommandKind, IouState, KeyPair, OracleError, OutputRecord, ProposalBuilder,
    };
    use accord_transport::{InMemoryNetwork, Inbox};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    struct Harness {
        alice: Endpoint,
        service: Arc<OracleService>,
        oracle_inbox: Inbox,
    }

    async fn harness() -> Harness {
        let network = InMemoryNetwork::default();
        let service = Arc::new(OracleService::new("Oracle", KeyPair::from_seed([3u8; 32])));
        let (alice, _) = network
            .register(KeyPair::from_seed([1u8; 32]).public())
            .await
            .unwrap();
        let (_, oracle_inbox) = network.register(service.key()).await.unwrap();
        Harness {
            alice,
            service,
            oracle_inbox,
        }
    }

    fn proposal_claiming(oracle: &Party, of: i64, value: i64) -> Proposal {
        let alice = Party::new("Alice", KeyPair::from_seed([1u8; 32]).public());
        let bob = Party::new("Bob", KeyPair::from_seed([2u8; 32]).public());
        ProposalBuilder::new(Party::new("Notary", KeyPair::from_seed([9u8; 32]).public()))
            .add_output(OutputRecord::Iou(IouState {
                value: 50,
                lender: alice.clone(),
                borrower: bob.clone(),
            }))
            .add_command(Command::new(CommandKind::Create, vec![alice.key, bob.key]))
            .add_command(Command::new(
                CommandKind::AttestedFact { of, value },
                vec![oracle.key],
            ))
            .build()
            .unwrap()
    }

    fn serve(service: Arc<OracleService>, mut inbox: Inbox) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move {
            let incoming = inbox
                .accept()
                .await
                .ok_or_else(|| AccordError::internal("inbox closed"))?;
            respond_to_sign(&service, incoming.session).await
        })
    }

    #[tokio::test]
    async fn test_sign_round_trip() {
        let h = harness().await;
        let oracle = h.service.party().clone();
        let proposal = proposal_claiming(&oracle, 5, 15);
        let assertion = FilteredAssertion::for_signer(&proposal, &oracle.key).unwrap();
        let responder = serve(Arc::clone(&h.service), h.oracle_inbox);

        let mut requester = SignRequester::new(oracle.clone());
        let signature = requester.run(&h.alice, &proposal, assertion).await.unwrap();
        assert_eq!(signature.by, oracle.key);
        assert!(responder.await.unwrap().is_ok());
        assert_eq!(requester.progress().current(), Some(SignStep::Done));
    }

    #[tokio::test]
    async fn test_fact_mismatch_propagates_to_requester() {
        let h = harness().await;
        let oracle = h.service.party().clone();
        let proposal = proposal_claiming(&oracle, 5, 16);
        let assertion = FilteredAssertion::for_signer(&proposal, &oracle.key).unwrap();
        let responder = serve(Arc::clone(&h.service), h.oracle_inbox);

        let mut requester = SignRequester::new(oracle);
        assert_matches!(
            requester.run(&h.alice, &proposal, assertion).await,
            Err(AccordError::Oracle(OracleError::FactMismatch {
                of: 5,
                expected: 15,
                claimed: 16
            }))
        );
        assert_matches!(
            responder.await.unwrap(),
            Err(AccordError::Oracle(OracleError::FactMismatch { .. }))
        );
        assert_eq!(requester.progress().current(), Some(SignStep::Failed));
    }

    #[tokio::test]
    async fn test_responder_stops_when_requester_hangs_up() {
        let mut h = harness().await;
        let session = h
            .alice
            .open(&h.service.key(), ProtocolId::OracleSign)
            .await
            .unwrap();
        session.close();

        let incoming = h.oracle_inbox.accept().await.unwrap();
        assert_eq!(incoming.protocol, ProtocolId::OracleSign);
        assert_matches!(
            respond_to_sign(&h.service, incoming.session).await,
            Err(AccordError::SessionClosed { .. })
        );
    }

    #[tokio::test]
    async fn test_signature_checked_against_local_proposal() {
        let h = harness().await;
        let oracle = h.service.party().clone();
        let shown = proposal_claiming(&oracle, 5, 15);
        let held = proposal_claiming(&oracle, 6, 16);
        let assertion = FilteredAssertion::for_signer(&shown, &oracle.key).unwrap();
        let _responder = serve(Arc::clone(&h.service), h.oracle_inbox);

        let mut requester = SignRequester::new(oracle);
        assert_matches!(
            requester.run(&h.alice, &held, assertion).await,
            Err(AccordError::SignatureVerification { .. })
        );
    }

    #[tokio::test]
    async fn test_signature_from_other_key_rejected() {
        let h = harness().await;
        let real = h.service.party().clone();
        let impostor = Party::new("Oracle", KeyPair::from_seed([4u8; 32]).public());
        let proposal = proposal_claiming(&real, 5, 15);
        let assertion = FilteredAssertion::for_signer(&proposal, &real.key).unwrap();
        let (_, impostor_inbox) = h.alice.network().register(impostor.key).await.unwrap();
        let _responder = serve(Arc::clone(&h.service), impostor_inbox);

        let mut requester = SignRequester::new(impostor);
        assert_matches!(
            requester.run(&h.alice, &proposal, assertion).await,
            Err(AccordError::SignatureVerification { .. })
        );
    }
}
