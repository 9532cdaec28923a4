//! Reference IOU contract

use accord_core::{AccordError, CommandKind, ContractVerifier, PartyKey, Proposal, Result};
use std::collections::BTreeSet;

/// Structural rules every IOU issuance must satisfy
#[derive(Debug, Clone, Copy, Default)]
pub struct IouContract;

impl ContractVerifier for IouContract {
    fn verify(&self, proposal: &Proposal) -> Result<()> {
        let creates: Vec<_> = proposal
            .commands()
            .iter()
            .filter(|command| matches!(command.kind, CommandKind::Create))
            .collect();
        let [create] = creates.as_slice() else {
            return Err(AccordError::validation(format!(
                "expected exactly one Create command, found {}",
                creates.len()
            )));
        };

        if !proposal.inputs().is_empty() {
            return Err(AccordError::validation(
                "no inputs should be consumed when issuing an IOU",
            ));
        }

        let [output] = proposal.outputs() else {
            return Err(AccordError::validation(format!(
                "expected exactly one output, found {}",
                proposal.outputs().len()
            )));
        };
        let iou = output
            .as_iou()
            .ok_or_else(|| AccordError::validation("output is not an IOU"))?;

        if iou.value <= 0 {
            return Err(AccordError::validation(format!(
                "IOU value must be positive, got {}",
                iou.value
            )));
        }
        if iou.lender.key == iou.borrower.key {
            return Err(AccordError::validation(
                "lender and borrower cannot be the same entity",
            ));
        }

        let participants: BTreeSet<PartyKey> =
            iou.participants().iter().map(|party| party.key).collect();
        let signers: BTreeSet<PartyKey> = create.signers.iter().copied().collect();
        if signers != participants {
            return Err(AccordError::validation(
                "all participants must be signers of the Create command",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{Command, IouState, KeyPair, OutputRecord, Party, ProposalBuilder, StateRef};
    use assert_matches::assert_matches;

    fn party(name: &str, seed: u8) -> Party {
        Party::new(name, KeyPair::from_seed([seed; 32]).public())
    }

    fn builder(value: i64, lender: &Party, borrower: &Party) -> ProposalBuilder {
        ProposalBuilder::new(party("Notary", 9)).add_output(OutputRecord::Iou(IouState {
            value,
            lender: lender.clone(),
            borrower: borrower.clone(),
        }))
    }

    fn create(signers: &[&Party]) -> Command {
        Command::new(
            CommandKind::Create,
            signers.iter().map(|party| party.key).collect(),
        )
    }

    #[test]
    fn test_valid_issuance() {
        let (a, b) = (party("Alice", 1), party("Bob", 2));
        let proposal = builder(50, &a, &b).add_command(create(&[&a, &b])).build().unwrap();
        assert!(IouContract.verify(&proposal).is_ok());
    }

    #[test]
    fn test_attested_fact_allowed_alongside() {
        let (a, b, o) = (party("Alice", 1), party("Bob", 2), party("Oracle", 3));
        let proposal = builder(50, &a, &b)
            .add_command(create(&[&a, &b]))
            .add_command(Command::new(
                CommandKind::AttestedFact { of: 5, value: 15 },
                vec![o.key],
            ))
            .build()
            .unwrap();
        assert!(IouContract.verify(&proposal).is_ok());
    }

    #[test]
    fn test_rule_violations() {
        let (a, b) = (party("Alice", 1), party("Bob", 2));
        let cases = vec![
            builder(50, &a, &b).build().unwrap(),
            builder(50, &a, &b)
                .add_command(create(&[&a, &b]))
                .add_command(create(&[&a, &b]))
                .build()
                .unwrap(),
            builder(0, &a, &b).add_command(create(&[&a, &b])).build().unwrap(),
            builder(50, &a, &a).add_command(create(&[&a])).build().unwrap(),
            builder(50, &a, &b).add_command(create(&[&a])).build().unwrap(),
            builder(50, &a, &b)
                .add_input(StateRef {
                    proposal_id: [7u8; 32],
                    index: 0,
                })
                .add_command(create(&[&a, &b]))
                .build()
                .unwrap(),
            ProposalBuilder::new(party("Notary", 9))
                .add_command(create(&[&a, &b]))
                .build()
                .unwrap(),
        ];
        for proposal in cases {
            assert_matches!(
                IouContract.verify(&proposal),
                Err(AccordError::Validation { .. })
            );
        }
    }
}
