//! Engine settings.
//!
//! Settings can be built in code or read from `VIGIL_`-prefixed
//! environment variables:
//!
//! ```bash
//! VIGIL_MAX_DEPTH=32
//! VIGIL_FAIL_FAST=true
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Prefix of the environment variables read by [`EngineConfig::from_env`].
pub const ENV_PREFIX: &str = "VIGIL_";

/// Tunables of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many cascade levels below the root may be entered
    pub max_depth: usize,
    /// Stop at the first violation instead of collecting all of them
    pub fail_fast: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            fail_fast: false,
        }
    }
}

impl EngineConfig {
    /// Read settings from the process environment. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .map_err(|e| ConfigError::Environment(e.to_string()))
    }

    /// Like [`from_env`](Self::from_env), over an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Self>(vars)
            .map_err(|e| ConfigError::Environment(e.to_string()))
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}
