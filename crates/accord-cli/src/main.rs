//! Accord operator CLI
//!
//! Starts an in-process network (Alice, Bob, an oracle and a notary) and
//! drives one of the public entry points against it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{common, negotiate, query, sign};

#[derive(Parser)]
#[command(name = "accord")]
#[command(about = "Accord - two-party IOU negotiation with an attesting oracle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Alice issues an IOU to Bob and finalizes it with the notary
    Negotiate {
        /// IOU value
        #[arg(long)]
        value: i64,

        /// Embed the oracle's attested fact for this input
        #[arg(long)]
        attest: Option<i64>,
    },

    /// Ask the oracle for the value derived from an input
    Query {
        /// Queried input
        #[arg(long)]
        input: i64,
    },

    /// Ask the oracle to sign a proposal claiming `of -> claimed`
    Sign {
        /// Declared input
        #[arg(long)]
        of: i64,

        /// Declared derived value
        #[arg(long)]
        claimed: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = common::load_config(cli.config.as_deref())?;
    let demo = common::DemoNetwork::start(&config).await?;

    match cli.command {
        Commands::Negotiate { value, attest } => negotiate::run(&demo, value, attest).await,
        Commands::Query { input } => query::run(&demo, input).await,
        Commands::Sign { of, claimed } => sign::run(&demo, of, claimed).await,
    }
}
