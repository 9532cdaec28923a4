//! # Accord Core
//!
//! Foundation types shared by every Accord crate:
//!
//! - **Identity**: [`Party`], [`PartyKey`], [`KeyPair`] and the
//!   [`IdentityDirectory`] that maps keys back to parties
//! - **Proposals**: [`Proposal`] and [`ProposalBuilder`], committed as salted
//!   Merkle leaves so the id is derived from content
//! - **Filtered assertions**: [`FilteredAssertion`], a partial view revealing
//!   selected commands that still verifies against the proposal id
//! - **Signatures**: [`SignedProposal`] and [`FinalizedRecord`]
//! - **Effects**: [`ContractVerifier`] and [`Finalizer`] collaborator traits
//! - **Errors**: [`AccordError`] and the wire-safe [`OracleError`]
//! - **Configuration** and **progress tracking** used by every flow

pub mod config;
pub mod crypto;
pub mod effects;
pub mod errors;
pub mod filtered;
pub mod identity;
pub mod progress;
pub mod proposal;
pub mod signed;

pub use config::{AccordConfig, NegotiationConfig, TransportSection};
pub use crypto::{hash, hash_parts, Hash32, KeyPair, PartyKey};
pub use effects::{ContractVerifier, Finalizer};
pub use errors::{AccordError, OracleError, Result};
pub use filtered::{FilteredAssertion, RevealedCommand, SignerEntry};
pub use identity::{IdentityDirectory, InMemoryDirectory, Party};
pub use progress::{ProgressStep, ProgressTracker};
pub use proposal::{
    Command, CommandKind, ComponentGroup, IouState, OutputRecord, Proposal, ProposalBuilder,
    StateRef,
};
pub use signed::{FinalizedRecord, ProposalSignature, SignedProposal};
