//! Engine configuration

use crate::{ConfigError, PisteError, PisteResult};
use serde::{Deserialize, Serialize};

/// Limits applied when validating formulas and composing draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EngineConfig {
    /// Smallest allowed target pool size.
    pub min_pool_size: u32,
    /// Largest allowed target pool size.
    pub max_pool_size: u32,
    /// Largest elimination draw the engine will produce. Power of two.
    pub max_draw_size: u32,
    /// Fixed seed for RANDOM draws. `None` uses system randomness.
    pub random_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_pool_size: 3,
            max_pool_size: 10,
            max_draw_size: 256,
            random_seed: None,
        }
    }
}

impl EngineConfig {
    /// Create EngineConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PISTE_MIN_POOL_SIZE`: smallest target pool size (default: 3)
    /// - `PISTE_MAX_POOL_SIZE`: largest target pool size (default: 10)
    /// - `PISTE_MAX_DRAW_SIZE`: largest elimination draw (default: 256)
    /// - `PISTE_RANDOM_SEED`: fixed seed for random draws (default: unset)
    pub fn from_env() -> PisteResult<Self> {
        let defaults = Self::default();
        let config = Self {
            min_pool_size: env_parse("PISTE_MIN_POOL_SIZE")?.unwrap_or(defaults.min_pool_size),
            max_pool_size: env_parse("PISTE_MAX_POOL_SIZE")?.unwrap_or(defaults.max_pool_size),
            max_draw_size: env_parse("PISTE_MAX_DRAW_SIZE")?.unwrap_or(defaults.max_draw_size),
            random_seed: env_parse("PISTE_RANDOM_SEED")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> PisteResult<()> {
        if self.min_pool_size < 2 {
            return Err(invalid(
                "min_pool_size",
                self.min_pool_size,
                "a pool needs at least two fencers",
            ));
        }
        if self.max_pool_size < self.min_pool_size {
            return Err(invalid(
                "max_pool_size",
                self.max_pool_size,
                "must be greater than or equal to min_pool_size",
            ));
        }
        if self.max_draw_size < 2 || !self.max_draw_size.is_power_of_two() {
            return Err(invalid(
                "max_draw_size",
                self.max_draw_size,
                "must be a power of two of at least 2",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> PisteError {
    PisteError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> PisteResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(key, &raw, "not a valid number")),
        Err(_) => Ok(None),
    }
}
