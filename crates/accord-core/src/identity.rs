//! Party identities and the identity directory
//!
//! A `Party` is an opaque, immutable identity with a unique verifiable public
//! key. The directory resolves keys back to parties so flows can check that a
//! signature really came from the party they addressed.

use crate::crypto::PartyKey;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identity of a participant in a negotiation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    /// Human-readable legal name
    pub name: String,
    /// Owning public key
    pub key: PartyKey,
}

impl Party {
    /// Create a party from a name and its public key
    pub fn new(name: impl Into<String>, key: PartyKey) -> Self {
        Self {
            name: name.into(),
            key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Resolves between parties and their keys
pub trait IdentityDirectory: Send + Sync {
    /// Look up the party owning `key`
    fn party_for_key(&self, key: &PartyKey) -> Option<Party>;

    /// Look up a party by legal name
    fn party_by_name(&self, name: &str) -> Option<Party>;

    /// True when `key` belongs to `party`
    fn is_key_of(&self, key: &PartyKey, party: &Party) -> bool {
        self.party_for_key(key)
            .map(|owner| &owner == party)
            .unwrap_or(false)
    }
}

/// Shared in-memory network map
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    by_key: RwLock<HashMap<PartyKey, Party>>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a party
    pub fn register(&self, party: Party) {
        self.by_key.write().insert(party.key, party);
    }

    /// Number of registered parties
    pub fn len(&self) -> usize {
        self.by_key.read().len()
    }

    /// True when no party is registered
    pub fn is_empty(&self) -> bool {
        self.by_key.read().is_empty()
    }
}

impl IdentityDirectory for InMemoryDirectory {
    fn party_for_key(&self, key: &PartyKey) -> Option<Party> {
        self.by_key.read().get(key).cloned()
    }

    fn party_by_name(&self, name: &str) -> Option<Party> {
        self.by_key
            .read()
            .values()
            .find(|party| party.name == name)
            .cloned()
    }
}
