use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Longest permitted stretch of identical trial classes. Fixed by the
/// protocol, named so tests can exercise other bounds.
pub const MAX_RUN: u32 = 5;

/// Session timing and randomization parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Explicit seed makes the whole session reproducible; `None` seeds
    /// from process entropy.
    pub seed: Option<u64>,
    pub trials_per_class: u32,
    pub initial_fixation_ms: u64,
    pub active_ms: u64,
    /// Inclusive bounds for the separator between trials; equal bounds
    /// mean a fixed separator.
    pub inter_trial_range_ms: (u64, u64),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            trials_per_class: 50,
            initial_fixation_ms: 4_000,
            active_ms: 10_000,
            inter_trial_range_ms: (4_000, 4_000),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl SessionConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials_per_class == 0 {
            return Err(ConfigError::Invalid("trials_per_class must be at least 1"));
        }
        if self.active_ms == 0 {
            return Err(ConfigError::Invalid("active_ms must be nonzero"));
        }
        let (lo, hi) = self.inter_trial_range_ms;
        if lo > hi {
            return Err(ConfigError::Invalid(
                "inter_trial_range_ms minimum exceeds maximum",
            ));
        }
        Ok(())
    }

    pub fn trial_count(&self) -> usize {
        self.trials_per_class as usize * 2
    }

    /// Expected wall-clock length of a non-aborted session: initial
    /// fixation, every trial, and a mean-length separator between each
    /// consecutive pair. No fixation follows the last trial.
    pub fn nominal_total_ms(&self) -> u64 {
        let trials = self.trial_count() as u64;
        let (lo, hi) = self.inter_trial_range_ms;
        let separator = (lo + hi) / 2;
        self.initial_fixation_ms + trials * self.active_ms + (trials - 1) * separator
    }
}
