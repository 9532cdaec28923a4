//! Filtered assertions: partial, verifiable views of a proposal
//!
//! A `FilteredAssertion` reveals a chosen subset of a proposal's commands plus
//! the full signer lists, and nothing else. Hidden groups appear only as
//! their Merkle roots. The receiver can check that everything revealed hashes
//! back to the proposal id, and that no command requiring its key was hidden.

use crate::crypto::{
    merkle_proof, merkle_root, path_sides, verify_merkle_proof, Hash32, MerkleProof, PartyKey,
    Side,
};
use crate::proposal::{component_leaf, encode_component, Command, ComponentGroup, Proposal};
use crate::{AccordError, OracleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A revealed command with its inclusion proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCommand {
    /// Position of the command in the proposal
    pub index: u32,
    /// Component nonce the leaf was salted with
    pub nonce: Hash32,
    /// The command itself
    pub command: Command,
    /// Path from the command leaf to the Commands group root
    pub proof: MerkleProof,
}

/// Signer list of one command, revealed for every command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerEntry {
    /// Component nonce the leaf was salted with
    pub nonce: Hash32,
    /// Keys required by the command at this position
    pub keys: Vec<PartyKey>,
}

/// Partial view of a proposal exposing only selected commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredAssertion {
    /// Id of the proposal this view derives from
    pub id: Hash32,
    /// Roots of every component group
    pub group_roots: Vec<Hash32>,
    /// Commands selected for disclosure
    pub commands: Vec<RevealedCommand>,
    /// Full Signers group
    pub signers: Vec<SignerEntry>,
}

impl FilteredAssertion {
    /// Build a view of `proposal` revealing the commands accepted by `filter`
    pub fn build<F>(proposal: &Proposal, filter: F) -> Result<Self>
    where
        F: Fn(&Command) -> bool,
    {
        let command_leaves = proposal.group_leaves(ComponentGroup::Commands)?;
        let mut commands = Vec::new();
        for (index, command) in proposal.commands().iter().enumerate() {
            if !filter(command) {
                continue;
            }
            let proof = merkle_proof(&command_leaves, index)
                .ok_or_else(|| AccordError::internal("command index outside its group"))?;
            commands.push(RevealedCommand {
                index: index as u32,
                nonce: proposal.nonce(ComponentGroup::Commands, index),
                command: command.clone(),
                proof,
            });
        }

        let signers = proposal
            .commands()
            .iter()
            .enumerate()
            .map(|(index, command)| SignerEntry {
                nonce: proposal.nonce(ComponentGroup::Signers, index),
                keys: command.signers.clone(),
            })
            .collect();

        Ok(Self {
            id: proposal.id(),
            group_roots: proposal.group_roots().to_vec(),
            commands,
            signers,
        })
    }

    /// Build a view revealing exactly the commands `key` must sign
    pub fn for_signer(proposal: &Proposal, key: &PartyKey) -> Result<Self> {
        Self::build(proposal, |command| command.requires(key))
    }

    /// Revealed commands, in proposal order
    pub fn revealed_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().map(|revealed| &revealed.command)
    }

    /// Check that every revealed component genuinely derives from `id`
    pub fn verify(&self) -> std::result::Result<(), OracleError> {
        if self.group_roots.len() != ComponentGroup::ALL.len() {
            return Err(OracleError::integrity(format!(
                "expected {} group roots, found {}",
                ComponentGroup::ALL.len(),
                self.group_roots.len()
            )));
        }
        if merkle_root(&self.group_roots) != self.id {
            return Err(OracleError::integrity("group roots do not hash to the id"));
        }

        let signer_leaves = self
            .signers
            .iter()
            .map(|entry| {
                encode_component(&entry.keys)
                    .map(|encoded| component_leaf(&entry.nonce, &encoded))
                    .map_err(|e| OracleError::integrity(e.to_string()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if merkle_root(&signer_leaves) != self.group_roots[ComponentGroup::Signers.ordinal()] {
            return Err(OracleError::integrity(
                "signer lists do not match the Signers root",
            ));
        }

        // One signer entry per command, so the Signers group fixes the command count.
        let command_count = self.signers.len();
        let commands_root = &self.group_roots[ComponentGroup::Commands.ordinal()];
        let mut seen = BTreeSet::new();
        for revealed in &self.commands {
            let index = revealed.index as usize;
            let claimed_sides: Vec<Side> =
                revealed.proof.path.iter().map(|step| step.side).collect();
            match path_sides(command_count, index) {
                None => {
                    return Err(OracleError::integrity(format!(
                        "command {index} is outside the {command_count} committed commands"
                    )))
                }
                Some(sides) if sides != claimed_sides => {
                    return Err(OracleError::integrity(format!(
                        "proof of command {index} leads to a different position"
                    )))
                }
                Some(_) => {}
            }
            if !seen.insert(index) {
                return Err(OracleError::integrity(format!(
                    "command {index} revealed twice"
                )));
            }
            let entry = self.signers.get(index).ok_or_else(|| {
                OracleError::integrity(format!("command {index} has no signer entry"))
            })?;
            if entry.keys != revealed.command.signers {
                return Err(OracleError::integrity(format!(
                    "command {index} signers disagree with the Signers group"
                )));
            }
            let encoded = encode_component(&revealed.command)
                .map_err(|e| OracleError::integrity(e.to_string()))?;
            let leaf = component_leaf(&revealed.nonce, &encoded);
            if !verify_merkle_proof(&revealed.proof, commands_root, &leaf) {
                return Err(OracleError::integrity(format!(
                    "command {index} is not included under the Commands root"
                )));
            }
        }
        Ok(())
    }

    /// Run `check` over every revealed command
    ///
    /// Fails on the first command rejected by `check`.
    pub fn check_with<F>(&self, mut check: F) -> std::result::Result<(), OracleError>
    where
        F: FnMut(&Command) -> std::result::Result<(), OracleError>,
    {
        self.revealed_commands().try_for_each(|command| check(command))
    }

    /// Fail unless every command that `key` must sign is revealed
    pub fn check_command_visibility(&self, key: &PartyKey) -> std::result::Result<(), OracleError> {
        let revealed: BTreeSet<usize> = self
            .commands
            .iter()
            .map(|revealed| revealed.index as usize)
            .collect();
        let hidden: Vec<usize> = self
            .signers
            .iter()
            .enumerate()
            .filter(|(index, entry)| entry.keys.contains(key) && !revealed.contains(index))
            .map(|(index, _)| index)
            .collect();

        if hidden.is_empty() {
            Ok(())
        } else {
            Err(OracleError::visibility(format!(
                "commands {hidden:?} require {key} but are hidden"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::identity::Party;
    use crate::proposal::{CommandKind, IouState, OutputRecord, ProposalBuilder};
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    struct Fixture {
        alice: Party,
        bob: Party,
        oracle: Party,
    }

    fn fixture() -> Fixture {
        Fixture {
            alice: Party::new("Alice", KeyPair::from_seed([1u8; 32]).public()),
            bob: Party::new("Bob", KeyPair::from_seed([2u8; 32]).public()),
            oracle: Party::new("Oracle", KeyPair::from_seed([3u8; 32]).public()),
        }
    }

    fn proposal_with_facts(f: &Fixture, facts: &[(i64, i64)]) -> Proposal {
        let notary = Party::new("Notary", KeyPair::from_seed([9u8; 32]).public());
        let mut builder = ProposalBuilder::new(notary)
            .add_output(OutputRecord::Iou(IouState {
                value: 50,
                lender: f.alice.clone(),
                borrower: f.bob.clone(),
            }))
            .add_command(Command::new(
                CommandKind::Create,
                vec![f.alice.key, f.bob.key],
            ));
        for (of, value) in facts {
            builder = builder.add_command(Command::new(
                CommandKind::AttestedFact {
                    of: *of,
                    value: *value,
                },
                vec![f.oracle.key],
            ));
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_filtered_view_verifies() {
        let f = fixture();
        let proposal = proposal_with_facts(&f, &[(5, 15)]);
        let view = FilteredAssertion::for_signer(&proposal, &f.oracle.key).unwrap();

        assert_eq!(view.id, proposal.id());
        assert_eq!(view.commands.len(), 1);
        assert_eq!(view.signers.len(), 2);
        assert!(view.verify().is_ok());
        assert!(view.check_command_visibility(&f.oracle.key).is_ok());
    }

    #[test]
    fn test_tampered_command_fails_integrity() {
        let f = fixture();
        let proposal = proposal_with_facts(&f, &[(5, 15)]);
        let mut view = FilteredAssertion::for_signer(&proposal, &f.oracle.key).unwrap();
        view.commands[0].command.kind = CommandKind::AttestedFact { of: 5, value: 16 };

        assert_matches!(view.verify(), Err(OracleError::AssertionIntegrity { .. }));
    }

    #[test]
    fn test_tampered_id_fails_integrity() {
        let f = fixture();
        let proposal = proposal_with_facts(&f, &[(5, 15)]);
        let mut view = FilteredAssertion::for_signer(&proposal, &f.oracle.key).unwrap();
        view.id[0] ^= 0xff;

        assert_matches!(view.verify(), Err(OracleError::AssertionIntegrity { .. }));
    }

    #[test]
    fn test_hidden_command_fails_visibility() {
        let f = fixture();
        let proposal = proposal_with_facts(&f, &[(5, 15), (6, 16)]);
        let view = FilteredAssertion::build(&proposal, |command| {
            matches!(command.kind, CommandKind::AttestedFact { of: 5, .. })
        })
        .unwrap();

        assert!(view.verify().is_ok());
        assert_matches!(
            view.check_command_visibility(&f.oracle.key),
            Err(OracleError::Visibility { .. })
        );
    }

    #[test]
    fn test_duplicate_reveal_fails_integrity() {
        let f = fixture();
        let proposal = proposal_with_facts(&f, &[(5, 15)]);
        let mut view = FilteredAssertion::for_signer(&proposal, &f.oracle.key).unwrap();
        let duplicate = view.commands[0].clone();
        view.commands.push(duplicate);

        assert_matches!(view.verify(), Err(OracleError::AssertionIntegrity { .. }));
    }

    #[test]
    fn test_command_revealed_under_foreign_index_fails_integrity() {
        let f = fixture();
        let proposal = proposal_with_facts(&f, &[(5, 15), (5, 999)]);
        let mut view = FilteredAssertion::build(&proposal, |command| {
            matches!(command.kind, CommandKind::AttestedFact { value: 15, .. })
        })
        .unwrap();
        let mut relabelled = view.commands[0].clone();
        relabelled.index = 2;
        view.commands.push(relabelled);

        assert_matches!(view.verify(), Err(OracleError::AssertionIntegrity { .. }));
    }

    #[test]
    fn test_index_past_last_command_fails_integrity() {
        let f = fixture();
        let proposal = proposal_with_facts(&f, &[(5, 15)]);
        let mut view = FilteredAssertion::for_signer(&proposal, &f.oracle.key).unwrap();
        view.commands[0].index = 7;

        assert_matches!(view.verify(), Err(OracleError::AssertionIntegrity { .. }));
    }

    proptest! {
        #[test]
        fn prop_any_claimed_value_change_is_detected(of in -1000i64..1000, delta in 1i64..1000) {
            let f = fixture();
            let proposal = proposal_with_facts(&f, &[(of, of + 10)]);
            let mut view = FilteredAssertion::for_signer(&proposal, &f.oracle.key).unwrap();
            view.commands[0].command.kind = CommandKind::AttestedFact { of, value: of + 10 + delta };
            prop_assert!(view.verify().is_err());
        }
    }
}
