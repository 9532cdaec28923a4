//! `accord query`

use super::common::DemoNetwork;
use anyhow::Result;

/// Ask the oracle for the value derived from `input`
pub async fn run(demo: &DemoNetwork, input: i64) -> Result<()> {
    let value = demo
        .alice
        .start_oracle_query(input, demo.oracle.party().clone())
        .await?;
    println!("{input} -> {value}");
    Ok(())
}
