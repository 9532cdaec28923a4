//! Progress tracking for protocol state machines
//!
//! Each flow declares its steps as an ordered enum. The tracker only lets a
//! flow move forward, refuses any transition out of a terminal step, logs
//! every transition and keeps the history for inspection.

use crate::{AccordError, Result};
use std::fmt;

/// A step of a protocol state machine
pub trait ProgressStep: Copy + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// True for DONE/FAILED-style steps that end the flow
    fn is_terminal(&self) -> bool;
}

/// Strictly forward-moving step tracker
#[derive(Debug, Clone)]
pub struct ProgressTracker<S: ProgressStep> {
    flow: &'static str,
    history: Vec<S>,
}

impl<S: ProgressStep> ProgressTracker<S> {
    /// Create a tracker for the named flow
    pub fn new(flow: &'static str) -> Self {
        Self {
            flow,
            history: Vec::new(),
        }
    }

    /// Current step, if the flow has started
    pub fn current(&self) -> Option<S> {
        self.history.last().copied()
    }

    /// Every step entered so far, in order
    pub fn history(&self) -> &[S] {
        &self.history
    }

    /// Enter `step`
    ///
    /// Fails if `step` does not come strictly after the current step or the
    /// flow has already reached a terminal step.
    pub fn set_step(&mut self, step: S) -> Result<()> {
        if let Some(current) = self.current() {
            if current.is_terminal() {
                return Err(AccordError::internal(format!(
                    "{} already finished in {current}",
                    self.flow
                )));
            }
            if step <= current {
                return Err(AccordError::internal(format!(
                    "{}: {step} cannot follow {current}",
                    self.flow
                )));
            }
        }

        tracing::info!(flow = self.flow, step = %step, "progress");
        self.history.push(step);
        Ok(())
    }
}
