//! Accord Testing Infrastructure
//!
//! Deterministic keys and a ready-made network of Alice, Bob, an oracle and
//! a shared notary, so end-to-end tests start from one line.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod keys;
pub mod network;

pub use keys::*;
pub use network::TestNetwork;
