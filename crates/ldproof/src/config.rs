//! Configuration for the service facade.

use std::time::Duration;

use ldproof_channel::{validate_node, ChannelConfig};

use crate::error::{LdProofsError, Result};

/// Node used when none is configured.
pub const DEFAULT_NODE: &str = "https://chrysalis-nodes.iota.org";

/// Configuration for [`LdProofs`](crate::LdProofs).
#[derive(Debug, Clone)]
pub struct LdProofsConfig {
    /// Ledger node new channels are created against.
    pub node: String,
    /// Timeouts for channel submissions and reads.
    pub channel: ChannelConfig,
}

impl Default for LdProofsConfig {
    fn default() -> Self {
        Self {
            node: DEFAULT_NODE.to_owned(),
            channel: ChannelConfig::default(),
        }
    }
}

impl LdProofsConfig {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.channel.submit_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.channel.read_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_node(&self.node).map_err(|e| LdProofsError::Config(e.to_string()))?;
        if self.channel.submit_timeout.is_zero() || self.channel.read_timeout.is_zero() {
            return Err(LdProofsError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}
