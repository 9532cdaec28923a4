//! Node configuration
//!
//! Loaded from TOML. Every field has a default so an empty file is a valid
//! configuration.
//!
//! ```toml
//! [negotiation]
//! acceptance_threshold = 100
//!
//! [transport]
//! receive_timeout_ms = 30000
//! ```

use crate::{AccordError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default upper bound the acceptor allows for an IOU value
pub const DEFAULT_ACCEPTANCE_THRESHOLD: i64 = 100;

/// Default receive timeout in milliseconds
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 30_000;

/// Negotiation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Largest IOU value the acceptor will sign
    pub acceptance_threshold: i64,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

/// Transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSection {
    /// Receive timeout in milliseconds; 0 waits forever
    pub receive_timeout_ms: u64,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
        }
    }
}

impl TransportSection {
    /// Receive timeout, or `None` when disabled
    pub fn receive_timeout(&self) -> Option<Duration> {
        (self.receive_timeout_ms > 0).then(|| Duration::from_millis(self.receive_timeout_ms))
    }
}

/// Top-level node configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccordConfig {
    /// Negotiation settings
    pub negotiation: NegotiationConfig,
    /// Transport settings
    pub transport: TransportSection,
}

impl AccordConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AccordError::config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AccordError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject settings no flow can run with
    pub fn validate(&self) -> Result<()> {
        if self.negotiation.acceptance_threshold <= 0 {
            return Err(AccordError::config(format!(
                "acceptance_threshold must be positive, got {}",
                self.negotiation.acceptance_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AccordConfig::from_toml_str("").unwrap();
        assert_eq!(config, AccordConfig::default());
        assert_eq!(config.negotiation.acceptance_threshold, 100);
        assert_eq!(
            config.transport.receive_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = AccordConfig::from_toml_str("[transport]\nreceive_timeout_ms = 0\n").unwrap();
        assert_eq!(config.transport.receive_timeout(), None);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let result = AccordConfig::from_toml_str("[negotiation]\nacceptance_threshold = 0\n");
        assert_matches!(result, Err(AccordError::Config { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[negotiation]\nacceptance_threshold = 250").unwrap();
        let config = AccordConfig::load(file.path()).unwrap();
        assert_eq!(config.negotiation.acceptance_threshold, 250);
        assert_eq!(config.transport.receive_timeout_ms, DEFAULT_RECEIVE_TIMEOUT_MS);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AccordConfig::load(&dir.path().join("absent.toml"));
        assert_matches!(result, Err(AccordError::Config { .. }));
    }
}
