//! In-memory network of party endpoints

use crate::config::TransportConfig;
use crate::session::{ProtocolId, Session};
use accord_core::{AccordError, PartyKey, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// A session opened by a remote initiator, tagged with its protocol
#[derive(Debug)]
pub struct IncomingSession {
    /// Protocol the initiator asked for
    pub protocol: ProtocolId,
    /// Responder's end of the session
    pub session: Session,
}

/// Shared registry routing session openings to registered parties
#[derive(Debug, Clone, Default)]
pub struct InMemoryNetwork {
    registry: Arc<RwLock<HashMap<PartyKey, mpsc::UnboundedSender<IncomingSession>>>>,
    config: TransportConfig,
}

impl InMemoryNetwork {
    /// Create an empty network
    pub fn new(config: TransportConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Settings applied to sessions on this network
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Attach `key` to the network
    ///
    /// Returns the endpoint used to open sessions and the inbox receiving
    /// sessions opened towards `key`.
    pub async fn register(&self, key: PartyKey) -> Result<(Endpoint, Inbox)> {
        let mut registry = self.registry.write().await;
        if registry.contains_key(&key) {
            return Err(AccordError::network(format!("{key} is already registered")));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        registry.insert(key, sender);
        tracing::debug!(party = %key, "registered on network");

        Ok((
            Endpoint {
                local: key,
                network: self.clone(),
            },
            Inbox { receiver },
        ))
    }

    /// Detach `key`; later attempts to reach it fail with `PeerUnreachable`
    pub async fn unregister(&self, key: &PartyKey) {
        if self.registry.write().await.remove(key).is_some() {
            tracing::debug!(party = %key, "unregistered from network");
        }
    }

    /// True if `key` is currently registered
    pub async fn is_reachable(&self, key: &PartyKey) -> bool {
        self.registry.read().await.contains_key(key)
    }
}

/// A party's handle for opening sessions
#[derive(Debug, Clone)]
pub struct Endpoint {
    local: PartyKey,
    network: InMemoryNetwork,
}

impl Endpoint {
    /// Key this endpoint belongs to
    pub fn local(&self) -> PartyKey {
        self.local
    }

    /// Network the endpoint is attached to
    pub fn network(&self) -> &InMemoryNetwork {
        &self.network
    }

    /// Open a session with `target` for `protocol`
    pub async fn open(&self, target: &PartyKey, protocol: ProtocolId) -> Result<Session> {
        let registry = self.network.registry.read().await;
        let inbox = registry
            .get(target)
            .ok_or_else(|| AccordError::peer_unreachable(target.to_string()))?;

        let (local, remote) =
            Session::pair(self.local, *target, self.network.config.receive_timeout);
        tracing::debug!(session = %local.id(), to = %target, %protocol, "open");
        inbox
            .send(IncomingSession {
                protocol,
                session: remote,
            })
            .map_err(|_| AccordError::peer_unreachable(target.to_string()))?;
        Ok(local)
    }
}

/// Sessions opened towards one party
#[derive(Debug)]
pub struct Inbox {
    receiver: mpsc::UnboundedReceiver<IncomingSession>,
}

impl Inbox {
    /// Next incoming session; `None` once the party is unregistered
    pub async fn accept(&mut self) -> Option<IncomingSession> {
        self.receiver.recv().await
    }
}
