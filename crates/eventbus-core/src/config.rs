//! EventBus configuration
//!
//! The channel manifest lists channels to register up front, so hosts can
//! declare their channels in data rather than in startup code.

use crate::types::ChannelRegistration;

// ----------------------------------------------------------------------------
// Bus Configuration
// ----------------------------------------------------------------------------

/// Configuration for an [`EventBus`](crate::EventBus)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Log a warning when a registered publisher's signal drifts away from
    /// the channel signature during cleanup
    pub log_signature_drift: bool,
    /// Channels registered when the bus is built from this configuration
    pub channels: Vec<ChannelRegistration>,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            log_signature_drift: true,
            channels: Vec::new(),
        }
    }
}

impl EventBusConfig {
    /// Create configuration for unit tests: no manifest, drift logging on
    pub fn testing() -> Self {
        Self::default()
    }

    /// Create configuration with drift warnings suppressed
    pub fn quiet() -> Self {
        Self {
            log_signature_drift: false,
            ..Self::default()
        }
    }

    /// Builder helper appending a channel to the manifest
    pub fn with_channel(mut self, registration: ChannelRegistration) -> Self {
        self.channels.push(registration);
        self
    }
}
