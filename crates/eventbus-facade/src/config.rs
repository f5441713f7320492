//! Facade configuration
//!
//! One TOML document carries the bus channel manifest under `[bus]` and the
//! allowlist under `[allowlist]`.

use std::path::Path;

use eventbus_core::EventBusConfig;
use serde::{Deserialize, Serialize};

use crate::allowlist::AllowlistRegistry;
use crate::error::{FacadeError, Result};

/// Complete configuration for an [`EventBusFacade`](crate::EventBusFacade)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    /// Channel manifest and bus options
    pub bus: EventBusConfig,
    /// Allowlist consulted by validated adds; without one every validated
    /// add is denied
    pub allowlist: Option<AllowlistRegistry>,
}

impl FacadeConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| FacadeError::io(path, err))?;
        Self::from_toml_str(&contents)
    }

    /// Checks every manifest tag and allowlist rule
    pub fn validate(&self) -> Result<()> {
        for registration in &self.bus.channels {
            eventbus_core::validation::validate_channel_tag(&registration.channel_tag)?;
        }
        if let Some(allowlist) = &self.allowlist {
            allowlist.validate()?;
        }
        Ok(())
    }
}
