//! Shared CLI plumbing: configuration loading and the demo network

use accord_agent::{Agent, AgentBuilder, InMemoryLedger};
use accord_core::{AccordConfig, InMemoryDirectory, KeyPair, Party};
use accord_oracle::OracleService;
use accord_transport::{InMemoryNetwork, TransportConfig};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Load `path`, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<AccordConfig> {
    match path {
        Some(path) => AccordConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(AccordConfig::default()),
    }
}

/// Parties of the in-process network
pub struct DemoNetwork {
    /// Initiating party
    pub alice: Agent,
    /// Accepting party
    pub bob: Agent,
    /// Party running the oracle service
    pub oracle: Agent,
    /// Shared notary
    pub ledger: Arc<InMemoryLedger>,
}

impl DemoNetwork {
    /// Start every party with fresh keys
    pub async fn start(config: &AccordConfig) -> Result<Self> {
        let network = InMemoryNetwork::new(TransportConfig::from(&config.transport));
        let directory = Arc::new(InMemoryDirectory::new());
        let ledger = Arc::new(InMemoryLedger::new("Notary", KeyPair::generate()));
        directory.register(ledger.party().clone());

        let oracle_keys = KeyPair::generate();
        let oracle_service = Arc::new(OracleService::new("Oracle", oracle_keys.clone()));

        let builder = |name: &str, keys: KeyPair| {
            directory.register(Party::new(name, keys.public()));
            AgentBuilder::new(name, keys)
                .with_config(config.clone())
                .with_notary(ledger.party().clone(), ledger.clone())
                .with_directory(directory.clone())
        };

        let alice = builder("Alice", KeyPair::generate()).start(&network).await?;
        let bob = builder("Bob", KeyPair::generate()).start(&network).await?;
        let oracle = builder("Oracle", oracle_keys)
            .with_oracle(oracle_service)
            .start(&network)
            .await?;

        Ok(Self {
            alice,
            bob,
            oracle,
            ledger,
        })
    }
}

/// Short hex form of a 32-byte id
pub fn short_hex(bytes: &[u8]) -> String {
    let full = hex::encode(bytes);
    full.chars().take(16).collect()
}
