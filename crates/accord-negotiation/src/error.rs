//! Terminal error of the negotiation flow

use crate::initiator::InitiatorStep;
use accord_core::AccordError;

/// The single failure `StartNegotiation` reports, naming the step that failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("negotiation failed during {step}: {source}")]
pub struct NegotiationError {
    /// Initiator step that was running when the failure happened
    pub step: InitiatorStep,
    /// Underlying failure
    #[source]
    pub source: AccordError,
}

impl NegotiationError {
    /// Wrap `source` as a failure of `step`
    pub fn new(step: InitiatorStep, source: AccordError) -> Self {
        Self { step, source }
    }

    /// True if the counterparty refused the proposal
    pub fn is_rejection(&self) -> bool {
        matches!(self.source, AccordError::Rejected { .. })
    }
}
