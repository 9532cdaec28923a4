//! # Accord Oracle
//!
//! A trusted service that derives facts and attests to them, plus the two
//! request/response protocols that expose it over a session:
//!
//! - **Query**: `input -> derived value`, serialised through the service lock
//! - **Sign**: validate a [`FilteredAssertion`](accord_core::FilteredAssertion)
//!   and sign the proposal id it commits to

pub mod messages;
pub mod query;
pub mod service;
pub mod sign;

pub use messages::{QueryMessage, SignMessage};
pub use query::{respond_to_query, QueryRequester, QueryStep};
pub use service::{derive, OracleService, DERIVATION_OFFSET};
pub use sign::{respond_to_sign, SignRequester, SignStep};

use accord_transport::Session;

/// Answer a query request from a party that runs no oracle
pub async fn refuse_query(mut session: Session, reason: &str) -> accord_core::Result<()> {
    let _: QueryMessage = session.receive().await?;
    session.send(&QueryMessage::Unavailable {
        reason: reason.to_string(),
    })?;
    session.close();
    Ok(())
}

/// Answer a sign request from a party that runs no oracle
pub async fn refuse_sign(mut session: Session, reason: &str) -> accord_core::Result<()> {
    let _: SignMessage = session.receive().await?;
    session.send(&SignMessage::Unavailable {
        reason: reason.to_string(),
    })?;
    session.close();
    Ok(())
}
