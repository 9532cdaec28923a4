//! `accord sign`

use super::common::{short_hex, DemoNetwork};
use accord_core::{
    Command, CommandKind, FilteredAssertion, IouState, OutputRecord, ProposalBuilder,
};
use anyhow::Result;

/// Ask the oracle to attest that `of` derives `claimed`
pub async fn run(demo: &DemoNetwork, of: i64, claimed: i64) -> Result<()> {
    let alice = demo.alice.party().clone();
    let bob = demo.bob.party().clone();
    let oracle = demo.oracle.party().clone();

    let proposal = ProposalBuilder::new(demo.ledger.party().clone())
        .add_output(OutputRecord::Iou(IouState {
            value: 1,
            lender: alice.clone(),
            borrower: bob.clone(),
        }))
        .add_command(Command::new(CommandKind::Create, vec![alice.key, bob.key]))
        .add_command(Command::new(
            CommandKind::AttestedFact { of, value: claimed },
            vec![oracle.key],
        ))
        .build()?;
    let assertion = FilteredAssertion::for_signer(&proposal, &oracle.key)?;

    let signature = demo
        .alice
        .start_oracle_sign(&proposal, oracle.clone(), assertion)
        .await?;
    println!(
        "{oracle} signed {} ({of} -> {claimed}): {}",
        short_hex(&proposal.id()),
        short_hex(&signature.bytes)
    );
    Ok(())
}
