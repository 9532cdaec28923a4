//! # Accord Transport
//!
//! Sessions between two parties over an in-memory network. A party registers
//! its key, receives an [`Endpoint`] for opening sessions and an [`Inbox`] of
//! sessions others open towards it. Every session carries the
//! [`ProtocolId`] the initiator asked for so the responder can dispatch.

pub mod config;
pub mod network;
pub mod session;

pub use config::TransportConfig;
pub use network::{Endpoint, InMemoryNetwork, Inbox, IncomingSession};
pub use session::{ProtocolId, Session, SessionId};
