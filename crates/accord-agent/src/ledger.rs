//! In-memory notary and ledger
//!
//! Finalization collaborator shared by the parties of a network. It checks
//! that the proposal is addressed to this notary and fully signed, refuses
//! inputs that are unknown or already spent, countersigns and records.

use accord_core::{
    AccordError, Finalizer, FinalizedRecord, Hash32, KeyPair, Party, ProposalSignature, Result,
    SignedProposal, StateRef,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default)]
struct LedgerState {
    records: HashMap<Hash32, FinalizedRecord>,
    spent: HashSet<StateRef>,
}

/// Notary that records finalized proposals in memory
#[derive(Debug)]
pub struct InMemoryLedger {
    keys: KeyPair,
    party: Party,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// Create a notary signing as `name` with `keys`
    pub fn new(name: impl Into<String>, keys: KeyPair) -> Self {
        let party = Party::new(name, keys.public());
        Self {
            keys,
            party,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Notary identity
    pub fn party(&self) -> &Party {
        &self.party
    }

    /// Recorded proposal with id `id`
    pub fn record(&self, id: &Hash32) -> Option<FinalizedRecord> {
        self.state.lock().records.get(id).cloned()
    }

    /// Number of recorded proposals
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    /// True if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `input` has been consumed
    pub fn is_spent(&self, input: &StateRef) -> bool {
        self.state.lock().spent.contains(input)
    }

    fn check_inputs(state: &LedgerState, signed: &SignedProposal) -> Result<()> {
        let mut seen = HashSet::new();
        for input in signed.proposal.inputs() {
            if !seen.insert(*input) {
                return Err(AccordError::finalization(format!(
                    "input {}:{} consumed twice",
                    hex_id(&input.proposal_id),
                    input.index
                )));
            }
            let known = state
                .records
                .get(&input.proposal_id)
                .is_some_and(|record| (input.index as usize) < record.signed.proposal.outputs().len());
            if !known {
                return Err(AccordError::finalization(format!(
                    "input {}:{} does not exist",
                    hex_id(&input.proposal_id),
                    input.index
                )));
            }
            if state.spent.contains(input) {
                return Err(AccordError::finalization(format!(
                    "input {}:{} is already spent",
                    hex_id(&input.proposal_id),
                    input.index
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Finalizer for InMemoryLedger {
    async fn finalize(&self, signed: SignedProposal) -> Result<FinalizedRecord> {
        if signed.proposal.notary().key != self.party.key {
            return Err(AccordError::finalization(format!(
                "{} is addressed to {}, not {}",
                signed.proposal,
                signed.proposal.notary(),
                self.party
            )));
        }
        signed
            .verify_required_signatures()
            .map_err(|err| AccordError::finalization(err.to_string()))?;

        let id = signed.id();
        let mut state = self.state.lock();
        if state.records.contains_key(&id) {
            return Err(AccordError::finalization(format!(
                "{} is already recorded",
                signed.proposal
            )));
        }
        Self::check_inputs(&state, &signed)?;

        let record = FinalizedRecord {
            notary_signature: ProposalSignature::sign(&self.keys, &id),
            recorded_at_ms: now_ms(),
            signed,
        };
        state.spent.extend(record.signed.proposal.inputs().iter().copied());
        state.records.insert(id, record.clone());
        tracing::info!(notary = %self.party, proposal = %record.signed.proposal, "recorded");
        Ok(record)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn hex_id(id: &Hash32) -> String {
    hex::encode(&id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{Command, CommandKind, IouState, OutputRecord, Proposal, ProposalBuilder};
    use assert_matches::assert_matches;

    struct Fixture {
        ledger: InMemoryLedger,
        alice: KeyPair,
        bob: KeyPair,
    }

    fn fixture() -> Fixture {
        Fixture {
            ledger: InMemoryLedger::new("Notary", KeyPair::from_seed([9u8; 32])),
            alice: KeyPair::from_seed([1u8; 32]),
            bob: KeyPair::from_seed([2u8; 32]),
        }
    }

    fn proposal(f: &Fixture, inputs: &[StateRef], value: i64) -> Proposal {
        let alice = Party::new("Alice", f.alice.public());
        let bob = Party::new("Bob", f.bob.public());
        let mut builder = ProposalBuilder::new(f.ledger.party().clone())
            .add_output(OutputRecord::Iou(IouState {
                value,
                lender: alice.clone(),
                borrower: bob.clone(),
            }))
            .add_command(Command::new(CommandKind::Create, vec![alice.key, bob.key]));
        for input in inputs {
            builder = builder.add_input(*input);
        }
        builder.build().unwrap()
    }

    fn fully_signed(f: &Fixture, proposal: Proposal) -> SignedProposal {
        let id = proposal.id();
        SignedProposal::new(proposal, ProposalSignature::sign(&f.alice, &id))
            .with_signature(ProposalSignature::sign(&f.bob, &id))
    }

    #[tokio::test]
    async fn test_records_fully_signed_proposal() {
        let f = fixture();
        let signed = fully_signed(&f, proposal(&f, &[], 50));
        let id = signed.id();

        let record = f.ledger.finalize(signed).await.unwrap();
        assert!(record.notary_signature.verify(&id).is_ok());
        assert_eq!(record.notary_signature.by, f.ledger.party().key);
        assert_eq!(f.ledger.record(&id), Some(record));
        assert_eq!(f.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_signature_refused() {
        let f = fixture();
        let p = proposal(&f, &[], 50);
        let id = p.id();
        let signed = SignedProposal::new(p, ProposalSignature::sign(&f.alice, &id));

        assert_matches!(
            f.ledger.finalize(signed).await,
            Err(AccordError::Finalization { .. })
        );
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_refused() {
        let f = fixture();
        let signed = fully_signed(&f, proposal(&f, &[], 50));
        f.ledger.finalize(signed.clone()).await.unwrap();
        assert_matches!(
            f.ledger.finalize(signed).await,
            Err(AccordError::Finalization { .. })
        );
    }

    #[tokio::test]
    async fn test_double_spend_refused() {
        let f = fixture();
        let issued = fully_signed(&f, proposal(&f, &[], 50));
        let state = StateRef {
            proposal_id: issued.id(),
            index: 0,
        };
        f.ledger.finalize(issued).await.unwrap();

        let first = fully_signed(&f, proposal(&f, &[state], 40));
        f.ledger.finalize(first).await.unwrap();
        assert!(f.ledger.is_spent(&state));

        let second = fully_signed(&f, proposal(&f, &[state], 30));
        assert_matches!(
            f.ledger.finalize(second).await,
            Err(AccordError::Finalization { .. })
        );
    }

    #[tokio::test]
    async fn test_unknown_input_refused() {
        let f = fixture();
        let ghost = StateRef {
            proposal_id: [7u8; 32],
            index: 0,
        };
        let signed = fully_signed(&f, proposal(&f, &[ghost], 50));
        assert_matches!(
            f.ledger.finalize(signed).await,
            Err(AccordError::Finalization { .. })
        );
    }

    #[tokio::test]
    async fn test_other_notary_refused() {
        let f = fixture();
        let other = InMemoryLedger::new("Other", KeyPair::from_seed([8u8; 32]));
        let signed = fully_signed(&f, proposal(&f, &[], 50));
        assert_matches!(
            other.finalize(signed).await,
            Err(AccordError::Finalization { .. })
        );
    }
}
