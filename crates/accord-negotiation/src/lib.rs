//! # Accord Negotiation
//!
//! The two-party IOU negotiation: an [`Initiator`] that builds, verifies,
//! signs and finalizes a proposal, an [`Acceptor`] that countersigns or
//! rejects it, the signature collection both sides speak, and the reference
//! [`IouContract`].

pub mod acceptor;
pub mod collect;
pub mod contract;
pub mod error;
pub mod initiator;
pub mod messages;

pub use acceptor::{Acceptor, AcceptorStep};
pub use collect::collect_signatures;
pub use contract::IouContract;
pub use error::NegotiationError;
pub use initiator::{Initiator, InitiatorStep, NegotiationTerms, OracleAttestation};
pub use messages::NegotiationMessage;
