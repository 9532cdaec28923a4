//! A running party
//!
//! The agent owns its identity and services, answers inbound sessions in
//! spawned tasks and exposes the public entry points.

use accord_core::{
    AccordConfig, AccordError, ContractVerifier, FilteredAssertion, FinalizedRecord, Finalizer,
    IdentityDirectory, KeyPair, Party, PartyKey, Proposal, ProposalSignature, Result,
};
use accord_negotiation::{Acceptor, Initiator, NegotiationError, NegotiationTerms};
use accord_oracle::{
    refuse_query, refuse_sign, respond_to_query, respond_to_sign, OracleService, QueryRequester,
    SignRequester,
};
use accord_transport::{Endpoint, Inbox, IncomingSession, ProtocolId};
use std::sync::Arc;
use tokio::task::JoinHandle;

const NO_ORACLE: &str = "this party runs no oracle service";

pub(crate) struct AgentInner {
    pub(crate) keys: KeyPair,
    pub(crate) party: Party,
    pub(crate) endpoint: Endpoint,
    pub(crate) notary: Party,
    pub(crate) finalizer: Arc<dyn Finalizer>,
    pub(crate) verifier: Arc<dyn ContractVerifier>,
    pub(crate) directory: Arc<dyn IdentityDirectory>,
    pub(crate) oracle: Option<Arc<OracleService>>,
    pub(crate) config: AccordConfig,
}

impl AgentInner {
    fn name_of(&self, key: &PartyKey) -> String {
        self.directory
            .party_for_key(key)
            .map(|party| party.name)
            .unwrap_or_else(|| key.to_string())
    }

    async fn dispatch(&self, incoming: IncomingSession) -> Result<()> {
        let IncomingSession { protocol, session } = incoming;
        tracing::debug!(
            party = %self.party,
            from = %self.name_of(&session.counterparty()),
            session = %session.id(),
            %protocol,
            "inbound session"
        );

        match protocol {
            ProtocolId::Negotiation => {
                let mut acceptor = Acceptor::new(
                    self.keys.clone(),
                    Arc::clone(&self.verifier),
                    self.config.negotiation.acceptance_threshold,
                );
                acceptor.run(session).await.map(|_| ())
            }
            ProtocolId::OracleQuery => match &self.oracle {
                Some(oracle) => respond_to_query(oracle, session).await,
                None => refuse_query(session, NO_ORACLE).await,
            },
            ProtocolId::OracleSign => match &self.oracle {
                Some(oracle) => respond_to_sign(oracle, session).await,
                None => refuse_sign(session, NO_ORACLE).await,
            },
        }
    }
}

async fn listen(inner: Arc<AgentInner>, mut inbox: Inbox) {
    while let Some(incoming) = inbox.accept().await {
        let inner = Arc::clone(&inner);
        tokio::spawn(async move {
            let protocol = incoming.protocol;
            if let Err(err) = inner.dispatch(incoming).await {
                tracing::warn!(party = %inner.party, %protocol, error = %err, "responder failed");
            }
        });
    }
    tracing::debug!(party = %inner.party, "listener stopped");
}

/// A party attached to a network
pub struct Agent {
    inner: Arc<AgentInner>,
    listener: JoinHandle<()>,
}

impl Agent {
    pub(crate) fn spawn(inner: Arc<AgentInner>, inbox: Inbox) -> Self {
        let listener = tokio::spawn(listen(Arc::clone(&inner), inbox));
        tracing::info!(party = %inner.party, key = %inner.party.key, "agent started");
        Self { inner, listener }
    }

    /// Identity of this agent
    pub fn party(&self) -> &Party {
        &self.inner.party
    }

    /// Notary this agent addresses proposals to
    pub fn notary(&self) -> &Party {
        &self.inner.notary
    }

    /// Oracle service, if this agent runs one
    pub fn oracle(&self) -> Option<&Arc<OracleService>> {
        self.inner.oracle.as_ref()
    }

    /// Look up a party by name in the network map
    pub fn resolve(&self, name: &str) -> Result<Party> {
        self.inner
            .directory
            .party_by_name(name)
            .ok_or_else(|| AccordError::peer_unreachable(format!("no party named {name}")))
    }

    /// Issue an IOU of `value` to `counterparty` and finalize it
    pub async fn start_negotiation(
        &self,
        value: i64,
        counterparty: Party,
    ) -> std::result::Result<FinalizedRecord, NegotiationError> {
        let terms = NegotiationTerms::new(value, counterparty, self.inner.notary.clone());
        self.negotiate(terms).await
    }

    /// Issue an IOU that also carries `oracle`'s attested fact for `input`
    pub async fn start_attested_negotiation(
        &self,
        value: i64,
        counterparty: Party,
        oracle: Party,
        input: i64,
    ) -> std::result::Result<FinalizedRecord, NegotiationError> {
        let terms = NegotiationTerms::new(value, counterparty, self.inner.notary.clone())
            .with_attestation(oracle, input);
        self.negotiate(terms).await
    }

    async fn negotiate(
        &self,
        terms: NegotiationTerms,
    ) -> std::result::Result<FinalizedRecord, NegotiationError> {
        let mut initiator = Initiator::new(
            self.inner.keys.clone(),
            self.inner.party.clone(),
            Arc::clone(&self.inner.verifier),
            Arc::clone(&self.inner.finalizer),
        );
        initiator.run(&self.inner.endpoint, terms).await
    }

    /// Ask `oracle` for the value derived from `input`
    pub async fn start_oracle_query(&self, input: i64, oracle: Party) -> Result<i64> {
        QueryRequester::new(oracle)
            .run(&self.inner.endpoint, input)
            .await
    }

    /// Obtain `oracle`'s signature over `proposal` by showing it `assertion`
    pub async fn start_oracle_sign(
        &self,
        proposal: &Proposal,
        oracle: Party,
        assertion: FilteredAssertion,
    ) -> Result<ProposalSignature> {
        SignRequester::new(oracle)
            .run(&self.inner.endpoint, proposal, assertion)
            .await
    }

    /// Leave the network and stop answering sessions
    pub async fn shutdown(self) {
        self.inner
            .endpoint
            .network()
            .unregister(&self.inner.party.key)
            .await;
        self.listener.abort();
        tracing::info!(party = %self.inner.party, "agent stopped");
    }
}
