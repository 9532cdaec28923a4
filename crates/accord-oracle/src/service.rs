//! The oracle service
//!
//! One service instance owns the oracle's signing key and its fact base.
//! `query` mutates the fact base under the state mutex; `sign` only reads the
//! immutable identity and never takes the lock.

use accord_core::{
    CommandKind, FilteredAssertion, KeyPair, OracleError, Party, PartyKey,
    ProposalSignature,
};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Offset the placeholder derivation adds to its input
pub const DERIVATION_OFFSET: i64 = 10;

/// Default value the state starts with before initialisation
const INITIAL_DEFAULT_VALUE: i64 = 20;

/// Default value installed once the service is initialised
const STARTUP_DEFAULT_VALUE: i64 = 10;

/// Value the oracle derives from `input`
///
/// Saturates at the `i64` bounds.
pub fn derive(input: i64) -> i64 {
    input.saturating_add(DERIVATION_OFFSET)
}

/// Mutable fact base, only reachable through the service's lock
#[derive(Debug)]
struct OracleState {
    known_facts: HashSet<i64>,
    default_value: i64,
    queries_served: u64,
}

impl OracleState {
    fn new() -> Self {
        Self {
            known_facts: HashSet::new(),
            default_value: INITIAL_DEFAULT_VALUE,
            queries_served: 0,
        }
    }
}

/// Trusted oracle: answers fact queries and attests to filtered assertions
#[derive(Debug)]
pub struct OracleService {
    keys: KeyPair,
    party: Party,
    state: Mutex<OracleState>,
}

impl OracleService {
    /// Start a service signing as `name` with `keys`
    pub fn new(name: impl Into<String>, keys: KeyPair) -> Self {
        let party = Party::new(name, keys.public());
        let service = Self {
            keys,
            party,
            state: Mutex::new(OracleState::new()),
        };
        service.initialise_default_value();
        service
    }

    fn initialise_default_value(&self) {
        self.state.lock().default_value = STARTUP_DEFAULT_VALUE;
    }

    /// Oracle identity
    pub fn party(&self) -> &Party {
        &self.party
    }

    /// Oracle signing key
    pub fn key(&self) -> PartyKey {
        self.party.key
    }

    /// Answer a fact query
    ///
    /// The whole read-modify-write of the fact base runs under the state lock,
    /// so concurrent queries behave as if served one at a time.
    pub fn query(&self, input: i64) -> i64 {
        let mut state = self.state.lock();
        state.known_facts.insert(input);
        state.queries_served += 1;
        let derived = derive(input);
        tracing::debug!(input, derived, served = state.queries_served, "oracle query");
        derived
    }

    /// Validate a filtered assertion and sign its proposal id
    pub fn sign(&self, assertion: &FilteredAssertion) -> Result<ProposalSignature, OracleError> {
        let key = self.key();

        assertion.verify()?;

        if assertion.commands.is_empty() {
            return Err(OracleError::unexpected_command(
                "assertion reveals no commands to attest",
            ));
        }
        assertion.check_with(|command| {
            if !command.requires(&key) {
                return Err(OracleError::unexpected_command(format!(
                    "command {:?} does not list {key} as a signer",
                    command.kind
                )));
            }
            match command.kind {
                CommandKind::AttestedFact { .. } => Ok(()),
                other => Err(OracleError::unexpected_command(format!(
                    "{other:?} is not an attested fact"
                ))),
            }
        })?;

        assertion.check_with(|command| match command.kind {
            CommandKind::AttestedFact { of, value } => {
                let expected = derive(of);
                if value == expected {
                    Ok(())
                } else {
                    Err(OracleError::FactMismatch {
                        of,
                        expected,
                        claimed: value,
                    })
                }
            }
            other => Err(OracleError::unexpected_command(format!(
                "{other:?} is not an attested fact"
            ))),
        })?;

        assertion.check_command_visibility(&key)?;

        tracing::info!(
            oracle = %self.party,
            commands = assertion.commands.len(),
            "attested filtered assertion"
        );
        Ok(ProposalSignature::sign(&self.keys, &assertion.id))
    }

    /// Number of queries answered since startup
    pub fn queries_served(&self) -> u64 {
        self.state.lock().queries_served
    }

    /// True if `input` has been queried
    pub fn knows(&self, input: i64) -> bool {
        self.state.lock().known_facts.contains(&input)
    }

    /// Current default value
    pub fn default_value(&self) -> i64 {
        self.state.lock().default_value
    }
}
