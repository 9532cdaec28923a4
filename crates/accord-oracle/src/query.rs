//! Oracle Query Protocol
//!
//! Requester sends one `Request`, suspends, and returns the `Answer`. The
//! responder serves exactly one request per session and terminates.

use crate::messages::QueryMessage;
use crate::service::OracleService;
use accord_core::{AccordError, Party, ProgressStep, ProgressTracker, Result};
use accord_transport::{Endpoint, ProtocolId, Session};
use std::fmt;

/// Requester steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QueryStep {
    /// Opening the session and sending the input
    Requesting,
    /// Suspended on the oracle's answer
    AwaitingAnswer,
    /// Answer received
    Done,
    /// Exchange failed
    Failed,
}

impl fmt::Display for QueryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QueryStep::Requesting => "REQUESTING",
            QueryStep::AwaitingAnswer => "AWAITING_ANSWER",
            QueryStep::Done => "DONE",
            QueryStep::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

impl ProgressStep for QueryStep {
    fn is_terminal(&self) -> bool {
        matches!(self, QueryStep::Done | QueryStep::Failed)
    }
}

/// Requester role of the query protocol
#[derive(Debug)]
pub struct QueryRequester {
    oracle: Party,
    progress: ProgressTracker<QueryStep>,
}

impl QueryRequester {
    /// Prepare a query to `oracle`
    pub fn new(oracle: Party) -> Self {
        Self {
            oracle,
            progress: ProgressTracker::new("oracle-query"),
        }
    }

    /// Steps taken so far
    pub fn progress(&self) -> &ProgressTracker<QueryStep> {
        &self.progress
    }

    /// Ask the oracle for the value derived from `input`
    pub async fn run(&mut self, endpoint: &Endpoint, input: i64) -> Result<i64> {
        let result = self.exchange(endpoint, input).await;
        match &result {
            Ok(value) => {
                self.record(QueryStep::Done);
                tracing::info!(oracle = %self.oracle, input, value, "oracle answered");
            }
            Err(err) => {
                self.record(QueryStep::Failed);
                tracing::warn!(oracle = %self.oracle, input, error = %err, "oracle query failed");
            }
        }
        result
    }

    fn record(&mut self, step: QueryStep) {
        if let Err(err) = self.progress.set_step(step) {
            tracing::warn!(error = %err, "could not record {step}");
        }
    }

    async fn exchange(&mut self, endpoint: &Endpoint, input: i64) -> Result<i64> {
        self.progress.set_step(QueryStep::Requesting)?;
        let mut session = endpoint
            .open(&self.oracle.key, ProtocolId::OracleQuery)
            .await?;
        session.send(&QueryMessage::Request { input })?;

        self.progress.set_step(QueryStep::AwaitingAnswer)?;
        let reply: QueryMessage = session.receive().await?;
        session.close();

        match reply {
            QueryMessage::Answer { value } => Ok(value),
            QueryMessage::Unavailable { reason } => {
                Err(AccordError::rejected(self.oracle.name.clone(), reason))
            }
            QueryMessage::Request { .. } => Err(AccordError::protocol(
                "oracle replied with a query request",
            )),
        }
    }
}

/// Serve one query request on `session`
///
/// Terminates with `SessionClosed` if the requester hangs up before sending.
pub async fn respond_to_query(service: &OracleService, mut session: Session) -> Result<()> {
    let request: QueryMessage = session.receive().await?;
    let reply = match request {
        QueryMessage::Request { input } => QueryMessage::Answer {
            value: service.query(input),
        },
        other => {
            return Err(AccordError::protocol(format!(
                "expected a query request, got {other:?}"
            )))
        }
    };
    session.send(&reply)?;
    session.close();
    Ok(())
}
