//! Multi-party test networks

use crate::keys::{test_keys, ALICE_SEED, BOB_SEED, NOTARY_SEED, ORACLE_SEED};
use accord_agent::{Agent, AgentBuilder, InMemoryLedger};
use accord_core::{AccordConfig, InMemoryDirectory, Party, Result};
use accord_oracle::OracleService;
use accord_transport::{InMemoryNetwork, TransportConfig};
use std::sync::Arc;

/// Alice, Bob and an oracle on one in-memory network, sharing a notary
pub struct TestNetwork {
    /// Underlying network
    pub network: InMemoryNetwork,
    /// Network map holding every party
    pub directory: Arc<InMemoryDirectory>,
    /// Shared notary
    pub ledger: Arc<InMemoryLedger>,
    /// Initiating party
    pub alice: Agent,
    /// Accepting party
    pub bob: Agent,
    /// Party running the oracle service
    pub oracle: Agent,
}

impl TestNetwork {
    /// Start the network with default configuration
    pub async fn start() -> Result<Self> {
        Self::with_config(AccordConfig::default()).await
    }

    /// Start the network with `config` applied to every party
    pub async fn with_config(config: AccordConfig) -> Result<Self> {
        let network = InMemoryNetwork::new(TransportConfig::from(&config.transport));
        let directory = Arc::new(InMemoryDirectory::new());
        let ledger = Arc::new(InMemoryLedger::new("Notary", test_keys(NOTARY_SEED)));
        directory.register(ledger.party().clone());

        let oracle_service = Arc::new(OracleService::new("Oracle", test_keys(ORACLE_SEED)));

        let agent = |name: &str, seed: u8| {
            let keys = test_keys(seed);
            directory.register(Party::new(name, keys.public()));
            AgentBuilder::new(name, keys)
                .with_config(config.clone())
                .with_notary(ledger.party().clone(), ledger.clone())
                .with_directory(directory.clone())
        };

        let alice = agent("Alice", ALICE_SEED).start(&network).await?;
        let bob = agent("Bob", BOB_SEED).start(&network).await?;
        let oracle = agent("Oracle", ORACLE_SEED)
            .with_oracle(oracle_service)
            .start(&network)
            .await?;
        tracing::debug!("test network started");

        Ok(Self {
            network,
            directory,
            ledger,
            alice,
            bob,
            oracle,
        })
    }

    /// Oracle service run by the oracle party
    pub fn oracle_service(&self) -> Option<&Arc<OracleService>> {
        self.oracle.oracle()
    }
}
