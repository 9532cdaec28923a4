//! Signature collection
//!
//! The collecting side sends the partially signed proposal to every
//! counterparty over its own session and waits for all of them. Completion
//! order does not matter; one rejection or closed session fails the whole
//! collection. The responding side is split into primitives so a flow can
//! put its own validation between receiving and answering.

use crate::messages::NegotiationMessage;
use accord_core::{
    AccordError, KeyPair, Party, PartyKey, ProposalSignature, Result, SignedProposal,
};
use accord_transport::{Endpoint, ProtocolId, Session};
use futures::future::try_join_all;
use std::collections::BTreeSet;

/// Gather a signature from every counterparty
///
/// Returns the proposal once every required signer has validly signed.
pub async fn collect_signatures(
    endpoint: &Endpoint,
    partially_signed: SignedProposal,
    counterparties: &[Party],
) -> Result<SignedProposal> {
    partially_signed.verify_signatures_except(&partially_signed.missing_signers())?;

    let asked: BTreeSet<PartyKey> = counterparties.iter().map(|party| party.key).collect();
    let unaccounted: Vec<String> = partially_signed
        .missing_signers()
        .difference(&asked)
        .map(ToString::to_string)
        .collect();
    if !unaccounted.is_empty() {
        return Err(AccordError::validation(format!(
            "no counterparty supplied for required signers {}",
            unaccounted.join(", ")
        )));
    }

    let requests = counterparties
        .iter()
        .map(|party| request_signature(endpoint, &partially_signed, party));
    let signatures = try_join_all(requests).await?;

    let signed = signatures
        .into_iter()
        .fold(partially_signed, SignedProposal::with_signature);
    signed.verify_required_signatures()?;
    Ok(signed)
}

async fn request_signature(
    endpoint: &Endpoint,
    signed: &SignedProposal,
    party: &Party,
) -> Result<ProposalSignature> {
    let mut session = endpoint.open(&party.key, ProtocolId::Negotiation).await?;
    tracing::debug!(session = %session.id(), party = %party, proposal = %signed.proposal, "requesting signature");
    session.send(&NegotiationMessage::Propose(signed.clone()))?;

    let reply: NegotiationMessage = session.receive().await?;
    session.close();

    match reply {
        NegotiationMessage::Signature(signature) => {
            if signature.by != party.key {
                return Err(AccordError::signature(format!(
                    "{party} answered with a signature by {}",
                    signature.by
                )));
            }
            signature.verify(&signed.id())?;
            tracing::debug!(party = %party, "signature received");
            Ok(signature)
        }
        NegotiationMessage::Rejected { reason } => {
            Err(AccordError::rejected(party.name.clone(), reason))
        }
        NegotiationMessage::Propose(_) => Err(AccordError::protocol(format!(
            "{party} answered a proposal with a proposal"
        ))),
    }
}

/// Wait for the proposal a collector sends
pub async fn receive_proposal(session: &mut Session) -> Result<SignedProposal> {
    match session.receive().await? {
        NegotiationMessage::Propose(signed) => Ok(signed),
        other => Err(AccordError::protocol(format!(
            "expected a proposal, got {other:?}"
        ))),
    }
}

/// Check that a received proposal needs `local` and carries valid signatures
/// from everybody else who has signed
pub fn check_received(signed: &SignedProposal, local: &PartyKey) -> Result<()> {
    if !signed.required_signers().contains(local) {
        return Err(AccordError::validation(format!(
            "{local} is not a required signer of {}",
            signed.proposal
        )));
    }
    signed.verify_signatures_except(&BTreeSet::from([*local]))
}

/// Sign the proposal and send the signature back to the collector
pub fn countersign(
    session: &Session,
    keys: &KeyPair,
    signed: &SignedProposal,
) -> Result<ProposalSignature> {
    let signature = ProposalSignature::sign(keys, &signed.id());
    session.send(&NegotiationMessage::Signature(signature.clone()))?;
    Ok(signature)
}

/// Tell the collector the proposal was refused
pub fn reject(session: &Session, reason: &AccordError) -> Result<()> {
    let reason = match reason {
        AccordError::Validation { message } => message.clone(),
        other => other.to_string(),
    };
    session.send(&NegotiationMessage::Rejected { reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{Command, CommandKind, IouState, OutputRecord, ProposalBuilder};
    use accord_transport::{InMemoryNetwork, Inbox};
    use assert_matches::assert_matches;

    struct Harness {
        alice_keys: KeyPair,
        bob_keys: KeyPair,
        alice: Endpoint,
        bob_inbox: Inbox,
        bob: Party,
    }

    async fn harness() -> Harness {
        let network = InMemoryNetwork::default();
        let alice_keys = KeyPair::from_seed([1u8; 32]);
        let bob_keys = KeyPair::from_seed([2u8; 32]);
        let (alice, _) = network.register(alice_keys.public()).await.unwrap();
        let (_, bob_inbox) = network.register(bob_keys.public()).await.unwrap();
        let bob = Party::new("Bob", bob_keys.public());
        Harness {
            alice_keys,
            bob_keys,
            alice,
            bob_inbox,
            bob,
        }
    }

    fn partially_signed(h: &Harness) -> SignedProposal {
        let alice = Party::new("Alice", h.alice_keys.public());
        let proposal = ProposalBuilder::new(Party::new("Notary", KeyPair::from_seed([9u8; 32]).public()))
            .add_output(OutputRecord::Iou(IouState {
                value: 50,
                lender: alice.clone(),
                borrower: h.bob.clone(),
            }))
            .add_command(Command::new(CommandKind::Create, vec![alice.key, h.bob.key]))
            .build()
            .unwrap();
        let id = proposal.id();
        SignedProposal::new(proposal, ProposalSignature::sign(&h.alice_keys, &id))
    }

    #[tokio::test]
    async fn test_collects_counterparty_signature() {
        let h = harness().await;
        let signed = partially_signed(&h);
        let bob_keys = h.bob_keys.clone();
        let mut inbox = h.bob_inbox;

        let responder = tokio::spawn(async move {
            let mut session = inbox.accept().await.unwrap().session;
            let received = receive_proposal(&mut session).await?;
            check_received(&received, &bob_keys.public())?;
            countersign(&session, &bob_keys, &received)
        });

        let full = collect_signatures(&h.alice, signed, &[h.bob.clone()])
            .await
            .unwrap();
        assert!(responder.await.unwrap().is_ok());
        assert!(full.missing_signers().is_empty());
        assert_eq!(full.signatures.len(), 2);
    }

    #[tokio::test]
    async fn test_rejection_fails_collection() {
        let h = harness().await;
        let signed = partially_signed(&h);
        let mut inbox = h.bob_inbox;

        tokio::spawn(async move {
            let mut session = inbox.accept().await.unwrap().session;
            receive_proposal(&mut session).await?;
            reject(&session, &AccordError::validation("value too high"))
        });

        assert_matches!(
            collect_signatures(&h.alice, signed, &[h.bob.clone()]).await,
            Err(AccordError::Rejected { ref party, ref reason }) if party == "Bob" && reason == "value too high"
        );
    }

    #[tokio::test]
    async fn test_closed_session_fails_collection() {
        let h = harness().await;
        let signed = partially_signed(&h);
        let mut inbox = h.bob_inbox;

        tokio::spawn(async move {
            let incoming = inbox.accept().await.unwrap();
            incoming.session.close();
        });

        assert_matches!(
            collect_signatures(&h.alice, signed, &[h.bob.clone()]).await,
            Err(AccordError::SessionClosed { .. })
        );
    }

    #[tokio::test]
    async fn test_wrong_signer_fails_collection() {
        let h = harness().await;
        let signed = partially_signed(&h);
        let impostor = KeyPair::from_seed([4u8; 32]);
        let mut inbox = h.bob_inbox;

        tokio::spawn(async move {
            let mut session = inbox.accept().await.unwrap().session;
            let received = receive_proposal(&mut session).await?;
            countersign(&session, &impostor, &received)
        });

        assert_matches!(
            collect_signatures(&h.alice, signed, &[h.bob.clone()]).await,
            Err(AccordError::SignatureVerification { .. })
        );
    }

    #[tokio::test]
    async fn test_missing_counterparty_is_local_failure() {
        let h = harness().await;
        let signed = partially_signed(&h);
        assert_matches!(
            collect_signatures(&h.alice, signed, &[]).await,
            Err(AccordError::Validation { .. })
        );
    }
}
