//! Point-to-point sessions
//!
//! A session is an ordered, reliable, typed message channel between exactly
//! two parties. Messages are bincode frames; a frame that does not decode as
//! the expected type is a protocol violation.

use accord_core::{AccordError, PartyKey, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Protocol a session was opened for; the responder dispatches on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolId {
    /// IOU negotiation and signature collection
    Negotiation,
    /// Oracle fact lookup
    OracleQuery,
    /// Oracle signature over a filtered assertion
    OracleSign,
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolId::Negotiation => "negotiation",
            ProtocolId::OracleQuery => "oracle-query",
            ProtocolId::OracleSign => "oracle-sign",
        };
        f.write_str(name)
    }
}

/// Session identifier shared by both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// One end of a session
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    local: PartyKey,
    counterparty: PartyKey,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    timeout: Option<Duration>,
}

impl Session {
    /// Create both ends of a session between `initiator` and `responder`
    pub(crate) fn pair(
        initiator: PartyKey,
        responder: PartyKey,
        timeout: Option<Duration>,
    ) -> (Session, Session) {
        let id = SessionId::new();
        let (to_responder, from_initiator) = mpsc::unbounded_channel();
        let (to_initiator, from_responder) = mpsc::unbounded_channel();
        let initiator_end = Session {
            id,
            local: initiator,
            counterparty: responder,
            tx: to_responder,
            rx: from_responder,
            timeout,
        };
        let responder_end = Session {
            id,
            local: responder,
            counterparty: initiator,
            tx: to_initiator,
            rx: from_initiator,
            timeout,
        };
        (initiator_end, responder_end)
    }

    /// Session id
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Key of the local party
    pub fn local(&self) -> PartyKey {
        self.local
    }

    /// Key of the party at the other end
    pub fn counterparty(&self) -> PartyKey {
        self.counterparty
    }

    /// Send one message to the counterparty
    pub fn send<M: Serialize>(&self, message: &M) -> Result<()> {
        let frame = bincode::serialize(message)?;
        tracing::debug!(session = %self.id, to = %self.counterparty, bytes = frame.len(), "send");
        self.tx.send(frame).map_err(|_| {
            AccordError::session_closed(format!("{} hung up before send", self.counterparty))
        })
    }

    /// Wait for the next message from the counterparty
    ///
    /// Fails with `SessionClosed` if the counterparty hung up, with `Timeout`
    /// if the configured deadline passes and with `Protocol` if the frame is
    /// not an `M`.
    pub async fn receive<M: DeserializeOwned>(&mut self) -> Result<M> {
        let frame = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.rx.recv())
                .await
                .map_err(|_| {
                    AccordError::timeout(
                        format!("receive from {}", self.counterparty),
                        u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    )
                })?,
            None => self.rx.recv().await,
        };

        let frame = frame.ok_or_else(|| {
            AccordError::session_closed(format!("{} hung up", self.counterparty))
        })?;
        tracing::debug!(session = %self.id, from = %self.counterparty, bytes = frame.len(), "receive");

        bincode::deserialize(&frame).map_err(|e| {
            AccordError::protocol(format!(
                "unexpected message from {}: {e}",
                self.counterparty
            ))
        })
    }

    /// End the session; the counterparty's pending receive fails with `SessionClosed`
    pub fn close(self) {
        tracing::debug!(session = %self.id, "close");
    }
}
