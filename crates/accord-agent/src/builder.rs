//! Agent construction

use crate::agent::{Agent, AgentInner};
use accord_core::{
    AccordConfig, AccordError, ContractVerifier, Finalizer, IdentityDirectory, InMemoryDirectory,
    KeyPair, Party, Result,
};
use accord_negotiation::IouContract;
use accord_oracle::OracleService;
use accord_transport::InMemoryNetwork;
use std::sync::Arc;

/// Builder for an [`Agent`]
pub struct AgentBuilder {
    name: String,
    keys: KeyPair,
    config: AccordConfig,
    notary: Option<Party>,
    finalizer: Option<Arc<dyn Finalizer>>,
    verifier: Arc<dyn ContractVerifier>,
    directory: Option<Arc<dyn IdentityDirectory>>,
    oracle: Option<Arc<OracleService>>,
}

impl AgentBuilder {
    /// Start building an agent acting as `name` with `keys`
    pub fn new(name: impl Into<String>, keys: KeyPair) -> Self {
        Self {
            name: name.into(),
            keys,
            config: AccordConfig::default(),
            notary: None,
            finalizer: None,
            verifier: Arc::new(IouContract),
            directory: None,
            oracle: None,
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: AccordConfig) -> Self {
        self.config = config;
        self
    }

    /// Notary proposals are addressed to, and the finalizer that notarises them
    pub fn with_notary(mut self, notary: Party, finalizer: Arc<dyn Finalizer>) -> Self {
        self.notary = Some(notary);
        self.finalizer = Some(finalizer);
        self
    }

    /// Replace the default IOU contract
    pub fn with_verifier(mut self, verifier: Arc<dyn ContractVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Share a network map
    pub fn with_directory(mut self, directory: Arc<dyn IdentityDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Run an oracle service on this agent
    ///
    /// The service must sign with the agent's own key.
    pub fn with_oracle(mut self, oracle: Arc<OracleService>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Register on `network` and start answering inbound sessions
    pub async fn start(self, network: &InMemoryNetwork) -> Result<Agent> {
        self.config.validate()?;
        let party = Party::new(self.name, self.keys.public());

        let (notary, finalizer) = match (self.notary, self.finalizer) {
            (Some(notary), Some(finalizer)) => (notary, finalizer),
            _ => return Err(AccordError::config(format!("{party} has no notary configured"))),
        };
        if let Some(oracle) = &self.oracle {
            if oracle.key() != party.key {
                return Err(AccordError::config(format!(
                    "oracle service of {party} signs with a foreign key"
                )));
            }
        }

        let directory: Arc<dyn IdentityDirectory> = match self.directory {
            Some(directory) => directory,
            None => {
                let directory = InMemoryDirectory::default();
                directory.register(party.clone());
                Arc::new(directory)
            }
        };

        let (endpoint, inbox) = network.register(party.key).await?;
        let inner = Arc::new(AgentInner {
            keys: self.keys,
            party,
            endpoint,
            notary,
            finalizer,
            verifier: self.verifier,
            directory,
            oracle: self.oracle,
            config: self.config,
        });
        Ok(Agent::spawn(inner, inbox))
    }
}
