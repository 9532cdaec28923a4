//! Proposals and their component commitments
//!
//! A proposal is built once through [`ProposalBuilder`] and frozen. Each
//! component is committed as a Merkle leaf salted with a per-component nonce;
//! components are grouped, every group gets its own root, and the proposal id
//! is the root over the group roots. This is what lets a filtered view reveal
//! a subset of components while staying verifiable against the id.

use crate::crypto::{hash_parts, merkle_root, Hash32, PartyKey};
use crate::identity::Party;
use crate::{AccordError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Reference to an output of an earlier finalized proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateRef {
    /// Id of the proposal that produced the state
    pub proposal_id: Hash32,
    /// Output index within that proposal
    pub index: u32,
}

/// An IOU: `borrower` owes `lender` `value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IouState {
    /// Amount owed
    pub value: i64,
    /// Party that issued the IOU
    pub lender: Party,
    /// Party that owes the value
    pub borrower: Party,
}

impl IouState {
    /// Parties that must agree on this IOU
    pub fn participants(&self) -> Vec<Party> {
        vec![self.lender.clone(), self.borrower.clone()]
    }
}

/// Output record carried by a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputRecord {
    /// IOU obligation
    Iou(IouState),
}

impl OutputRecord {
    /// Parties that participate in this record
    pub fn participants(&self) -> Vec<Party> {
        match self {
            OutputRecord::Iou(iou) => iou.participants(),
        }
    }

    /// The IOU payload, if this record is one
    pub fn as_iou(&self) -> Option<&IouState> {
        match self {
            OutputRecord::Iou(iou) => Some(iou),
        }
    }
}

/// Typed instruction carried by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Issue a new IOU
    Create,
    /// Oracle-attested fact: `value` is what the oracle derives from `of`
    AttestedFact {
        /// Declared input
        of: i64,
        /// Declared derived value
        value: i64,
    },
}

/// A command plus the ordered keys that must sign for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Instruction payload
    pub kind: CommandKind,
    /// Required signers, in declaration order
    pub signers: Vec<PartyKey>,
}

impl Command {
    /// Create a command
    pub fn new(kind: CommandKind, signers: Vec<PartyKey>) -> Self {
        Self { kind, signers }
    }

    /// True if `key` must sign this command
    pub fn requires(&self, key: &PartyKey) -> bool {
        self.signers.contains(key)
    }
}

/// Component groups, in commitment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentGroup {
    /// Input state references
    Inputs = 0,
    /// Output records
    Outputs = 1,
    /// Commands
    Commands = 2,
    /// Notary identity
    Notary = 3,
    /// Per-command signer lists
    Signers = 4,
}

impl ComponentGroup {
    /// All groups in commitment order
    pub const ALL: [ComponentGroup; 5] = [
        ComponentGroup::Inputs,
        ComponentGroup::Outputs,
        ComponentGroup::Commands,
        ComponentGroup::Notary,
        ComponentGroup::Signers,
    ];

    /// Position of the group among the group roots
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Encode a component for commitment
pub fn encode_component<T: Serialize>(component: &T) -> Result<Vec<u8>> {
    bincode::serialize(component).map_err(AccordError::from)
}

/// Nonce blinding component `index` of `group`
pub fn component_nonce(salt: &Hash32, group: ComponentGroup, index: usize) -> Hash32 {
    hash_parts(&[
        salt,
        &[group as u8],
        &(index as u64).to_le_bytes(),
    ])
}

/// Merkle leaf for an encoded component
pub fn component_leaf(nonce: &Hash32, encoded: &[u8]) -> Hash32 {
    hash_parts(&[nonce, encoded])
}

/// Wire form of a proposal; the id is recomputed when it is frozen again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalData {
    inputs: Vec<StateRef>,
    outputs: Vec<OutputRecord>,
    commands: Vec<Command>,
    notary: Party,
    privacy_salt: Hash32,
}

/// A frozen proposal with its id computed from content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ProposalData", try_from = "ProposalData")]
pub struct Proposal {
    data: ProposalData,
    group_roots: Vec<Hash32>,
    id: Hash32,
}

impl From<Proposal> for ProposalData {
    fn from(proposal: Proposal) -> Self {
        proposal.data
    }
}

impl TryFrom<ProposalData> for Proposal {
    type Error = AccordError;

    fn try_from(data: ProposalData) -> Result<Self> {
        Proposal::freeze(data)
    }
}

impl Proposal {
    fn freeze(data: ProposalData) -> Result<Self> {
        let mut group_roots = Vec::with_capacity(ComponentGroup::ALL.len());
        for group in ComponentGroup::ALL {
            group_roots.push(merkle_root(&leaves_for(&data, group)?));
        }
        let id = merkle_root(&group_roots);
        Ok(Self {
            data,
            group_roots,
            id,
        })
    }

    /// Content-derived proposal id
    pub fn id(&self) -> Hash32 {
        self.id
    }

    /// Input references
    pub fn inputs(&self) -> &[StateRef] {
        &self.data.inputs
    }

    /// Output records
    pub fn outputs(&self) -> &[OutputRecord] {
        &self.data.outputs
    }

    /// Commands
    pub fn commands(&self) -> &[Command] {
        &self.data.commands
    }

    /// Notary the proposal is addressed to
    pub fn notary(&self) -> &Party {
        &self.data.notary
    }

    /// Roots of every component group, in commitment order
    pub fn group_roots(&self) -> &[Hash32] {
        &self.group_roots
    }

    /// Merkle leaves of one component group
    pub fn group_leaves(&self, group: ComponentGroup) -> Result<Vec<Hash32>> {
        leaves_for(&self.data, group)
    }

    /// Nonce for component `index` of `group`
    pub fn nonce(&self, group: ComponentGroup, index: usize) -> Hash32 {
        component_nonce(&self.data.privacy_salt, group, index)
    }

    /// Union of every command's signer keys
    pub fn required_signers(&self) -> BTreeSet<PartyKey> {
        self.data
            .commands
            .iter()
            .flat_map(|command| command.signers.iter().copied())
            .collect()
    }
}

impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proposal-{}", &hex::encode(self.id)[..16])
    }
}

fn leaves_for(data: &ProposalData, group: ComponentGroup) -> Result<Vec<Hash32>> {
    fn leaves<T: Serialize>(
        salt: &Hash32,
        group: ComponentGroup,
        items: &[T],
    ) -> Result<Vec<Hash32>> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let nonce = component_nonce(salt, group, index);
                Ok(component_leaf(&nonce, &encode_component(item)?))
            })
            .collect()
    }

    let salt = &data.privacy_salt;
    match group {
        ComponentGroup::Inputs => leaves(salt, group, &data.inputs),
        ComponentGroup::Outputs => leaves(salt, group, &data.outputs),
        ComponentGroup::Commands => leaves(salt, group, &data.commands),
        ComponentGroup::Notary => leaves(salt, group, std::slice::from_ref(&data.notary)),
        ComponentGroup::Signers => {
            let signers: Vec<&Vec<PartyKey>> =
                data.commands.iter().map(|command| &command.signers).collect();
            leaves(salt, group, &signers)
        }
    }
}

/// Mutable proposal under construction
#[derive(Debug, Clone)]
pub struct ProposalBuilder {
    data: ProposalData,
}

impl ProposalBuilder {
    /// Start a proposal addressed to `notary`
    pub fn new(notary: Party) -> Self {
        Self {
            data: ProposalData {
                inputs: Vec::new(),
                outputs: Vec::new(),
                commands: Vec::new(),
                notary,
                privacy_salt: rand::random(),
            },
        }
    }

    /// Consume an earlier state
    pub fn add_input(mut self, input: StateRef) -> Self {
        self.data.inputs.push(input);
        self
    }

    /// Produce an output record
    pub fn add_output(mut self, output: OutputRecord) -> Self {
        self.data.outputs.push(output);
        self
    }

    /// Attach a command
    pub fn add_command(mut self, command: Command) -> Self {
        self.data.commands.push(command);
        self
    }

    /// Override the random privacy salt
    pub fn with_salt(mut self, salt: Hash32) -> Self {
        self.data.privacy_salt = salt;
        self
    }

    /// Commands attached so far
    pub fn commands(&self) -> &[Command] {
        &self.data.commands
    }

    /// Freeze the proposal and compute its id
    pub fn build(self) -> Result<Proposal> {
        Proposal::freeze(self.data)
    }
}
