//! Season configuration for PickEngine

use crate::PickEngineError;
use serde::{Deserialize, Serialize};

/// Default week shown as "current" when none is configured
pub const DEFAULT_CURRENT_WEEK: u32 = 1;

/// Default last week whose picks are visible to other members
pub const DEFAULT_REVEALED_WEEK: u32 = 0;

/// Last scoring week of the NFL regular season
pub const DEFAULT_FINAL_WEEK: u32 = 18;

/// BYE selections allowed per season
pub const DEFAULT_BYE_LIMIT: u32 = 4;

/// Season-level settings injected by the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonConfig {
    pub current_season: String,
    pub current_week: u32,
    pub revealed_week: u32,
    pub final_week: u32,
    pub bye_limit: u32,
}

impl SeasonConfig {
    /// Create a config for `season` with every other setting at its default
    pub fn new(season: impl Into<String>) -> Self {
        Self {
            current_season: season.into(),
            current_week: DEFAULT_CURRENT_WEEK,
            revealed_week: DEFAULT_REVEALED_WEEK,
            final_week: DEFAULT_FINAL_WEEK,
            bye_limit: DEFAULT_BYE_LIMIT,
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self, PickEngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PickEngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let current_season = lookup("CURRENT_SEASON").ok_or_else(|| {
            PickEngineError::InvalidConfig { message: "CURRENT_SEASON not set".to_string() }
        })?;

        let config = Self {
            current_season,
            current_week: parse_u32(&lookup, "CURRENT_WEEK", DEFAULT_CURRENT_WEEK)?,
            revealed_week: parse_u32(&lookup, "REVEALED_WEEK", DEFAULT_REVEALED_WEEK)?,
            final_week: parse_u32(&lookup, "FINAL_WEEK", DEFAULT_FINAL_WEEK)?,
            bye_limit: parse_u32(&lookup, "BYE_LIMIT", DEFAULT_BYE_LIMIT)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), PickEngineError> {
        if self.current_season.trim().is_empty() {
            return Err(PickEngineError::InvalidConfig {
                message: "current_season must not be empty".to_string(),
            });
        }

        if self.final_week == 0 {
            return Err(PickEngineError::InvalidConfig {
                message: "final_week must be greater than 0".to_string(),
            });
        }

        if self.bye_limit == 0 {
            return Err(PickEngineError::InvalidConfig {
                message: "bye_limit must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_u32<F>(lookup: &F, key: &str, default: u32) -> Result<u32, PickEngineError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| PickEngineError::InvalidConfig { message: format!("Invalid {}", key) }),
        _ => Ok(default),
    }
}
