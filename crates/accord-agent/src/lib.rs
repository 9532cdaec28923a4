//! # Accord Agent
//!
//! Runtime for one party: its keys, the responders it runs for inbound
//! sessions (negotiation acceptor, oracle query and sign), and the public
//! entry points `start_negotiation`, `start_oracle_query` and
//! `start_oracle_sign`. Also hosts [`InMemoryLedger`], the notary every
//! agent on an in-process network finalizes against.

mod agent;
mod builder;
pub mod ledger;

pub use agent::Agent;
pub use builder::AgentBuilder;
pub use ledger::InMemoryLedger;
