//! `accord negotiate`

use super::common::{short_hex, DemoNetwork};
use anyhow::Result;
use tracing::info;

/// Run one negotiation from Alice to Bob
pub async fn run(demo: &DemoNetwork, value: i64, attest: Option<i64>) -> Result<()> {
    let bob = demo.bob.party().clone();
    info!(value, counterparty = %bob, "starting negotiation");

    let outcome = match attest {
        Some(input) => {
            demo.alice
                .start_attested_negotiation(value, bob, demo.oracle.party().clone(), input)
                .await
        }
        None => demo.alice.start_negotiation(value, bob).await,
    };
    let record = outcome?;

    println!("finalized {}", short_hex(&record.id()));
    for signature in record.signatures() {
        println!("  signed by {}", signature.by);
    }
    println!("  notarised by {}", demo.ledger.party());
    Ok(())
}
