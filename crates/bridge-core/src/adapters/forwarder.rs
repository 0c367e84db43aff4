//! Recording forwarder.
//!
//! Accepts forwards over known channels and records them. Hosts without a
//! real cross-chain transport use it as a sink; tests use it to inject
//! failures.

use std::collections::BTreeSet;

use shared_types::{AccountAddress, Coin};

use crate::ports::outbound::{ForwardError, Forwarder};

/// A forward accepted by [`RecordingForwarder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRecord {
    pub receiver: AccountAddress,
    pub coin: Coin,
    pub channel: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingForwarder {
    channels: BTreeSet<String>,
    failing: bool,
    sent: Vec<ForwardRecord>,
}

impl RecordingForwarder {
    /// Forwarder that accepts the given channels.
    pub fn with_channels(channels: &[&str]) -> Self {
        Self {
            channels: channels.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Reject every subsequent forward.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn sent(&self) -> &[ForwardRecord] {
        &self.sent
    }
}

impl Forwarder for RecordingForwarder {
    fn forward(&mut self, receiver: &AccountAddress, coin: &Coin, channel: &str) -> Result<(), ForwardError> {
        if !self.channels.contains(channel) {
            return Err(ForwardError::UnknownChannel(channel.to_string()));
        }
        if self.failing {
            return Err(ForwardError::Rejected(format!("channel {} is closed", channel)));
        }
        self.sent.push(ForwardRecord {
            receiver: receiver.clone(),
            coin: coin.clone(),
            channel: channel.to_string(),
        });
        Ok(())
    }
}
