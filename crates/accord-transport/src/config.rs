//! Transport configuration

use accord_core::config::{TransportSection, DEFAULT_RECEIVE_TIMEOUT_MS};
use std::time::Duration;

/// Settings applied to every session opened on a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Deadline for a single `receive`; `None` waits until the peer sends or hangs up
    pub receive_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            receive_timeout: Some(Duration::from_millis(DEFAULT_RECEIVE_TIMEOUT_MS)),
        }
    }
}

impl From<&TransportSection> for TransportConfig {
    fn from(section: &TransportSection) -> Self {
        Self {
            receive_timeout: section.receive_timeout(),
        }
    }
}
