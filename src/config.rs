//! Generator configuration

use crate::error::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings fixed for the duration of one generation run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Maximum number of adverts played back to back before music must intervene
    #[serde(default = "default_max_advert_sequence")]
    pub max_advert_sequence: u32,

    /// Minimum silence or other content between two plays of the same item,
    /// counted after the mandatory inter-item delay
    #[serde(default = "default_min_same_track_gap")]
    pub min_same_track_gap_secs: i64,

    /// Mandatory gap inserted between any two consecutive items
    #[serde(default = "default_delay_between_tracks")]
    pub delay_between_tracks_secs: i64,

    /// Silence (beyond the inter-item delay) that ends a run of adverts
    #[serde(default = "default_sequence_break")]
    pub sequence_break_secs: i64,

    /// Upper bound for each catalog query
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Fixed seed for music selection; `None` draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_advert_sequence: default_max_advert_sequence(),
            min_same_track_gap_secs: default_min_same_track_gap(),
            delay_between_tracks_secs: default_delay_between_tracks(),
            sequence_break_secs: default_sequence_break(),
            query_timeout_secs: default_query_timeout(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables are prefixed with `PLAYLIST__`, e.g.
    /// `PLAYLIST__MAX_ADVERT_SEQUENCE=2`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = ::config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(::config::File::from(path));
        }

        settings = settings.add_source(
            ::config::Environment::with_prefix("PLAYLIST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| GeneratorError::InvalidConfiguration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_advert_sequence == 0 {
            return Err(GeneratorError::InvalidConfiguration(
                "max_advert_sequence must be at least 1".to_string(),
            ));
        }
        if self.min_same_track_gap_secs < 0 {
            return Err(GeneratorError::InvalidConfiguration(format!(
                "min_same_track_gap_secs must not be negative (got {})",
                self.min_same_track_gap_secs
            )));
        }
        if self.delay_between_tracks_secs < 0 {
            return Err(GeneratorError::InvalidConfiguration(format!(
                "delay_between_tracks_secs must not be negative (got {})",
                self.delay_between_tracks_secs
            )));
        }
        if self.sequence_break_secs < 0 {
            return Err(GeneratorError::InvalidConfiguration(format!(
                "sequence_break_secs must not be negative (got {})",
                self.sequence_break_secs
            )));
        }
        if self.query_timeout_secs == 0 {
            return Err(GeneratorError::InvalidConfiguration(
                "query_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

// Default values
fn default_max_advert_sequence() -> u32 {
    2
}

fn default_min_same_track_gap() -> i64 {
    600
}

fn default_delay_between_tracks() -> i64 {
    0
}

fn default_sequence_break() -> i64 {
    60
}

fn default_query_timeout() -> u64 {
    30
}
