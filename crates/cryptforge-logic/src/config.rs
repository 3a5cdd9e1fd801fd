//! Generation parameters and their validation.
//!
//! Every tunable of the growth algorithm, the session retry loop and the
//! reconciler lives here so tests and tools can run the generator with
//! explicit values instead of ambient globals.
//!
//! ```
//! use cryptforge_logic::config::{validate_config, GenerationConfig};
//!
//! let mut config = GenerationConfig::default();
//! config.seed = Some(7);
//! assert!(validate_config(&config).is_empty());
//! assert_eq!(config.max_growth_attempts(10), 50);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for one dungeon session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Target room count used when the session request carries none.
    pub default_room_count: u32,
    /// Growth attempts allowed per requested room (maxAttempts = target × this).
    pub attempts_per_room: u32,
    /// Fraction of the target a build must reach to be accepted.
    pub acceptance_ratio: f32,
    /// Whole-build retries before the session fails.
    pub max_session_attempts: u32,
    /// Scale applied to a module's geometry bounds before overlap tests.
    pub bounds_shrink: f32,
    /// Size added to already-placed bounds when testing a candidate.
    pub overlap_margin: f32,
    /// Open connectors closer than this are treated as a closed loop.
    pub loop_closure_distance: f32,
    /// How far a wall cap is pushed down along its up vector.
    pub cap_inset: f32,
    /// Random seed (None = random, logged at session start).
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_room_count: 20,
            attempts_per_room: 5,
            acceptance_ratio: 0.7,
            max_session_attempts: 10,
            bounds_shrink: 0.95,
            overlap_margin: 0.5,
            loop_closure_distance: 1.0,
            cap_inset: 0.1,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Growth-loop attempt budget for a build targeting `target` modules.
    pub fn max_growth_attempts(&self, target: u32) -> u32 {
        target.saturating_mul(self.attempts_per_room)
    }

    /// Whether `placed` modules satisfy the acceptance threshold for `target`.
    pub fn meets_quota(&self, placed: usize, target: u32) -> bool {
        placed as f32 >= target as f32 * self.acceptance_ratio
    }

    /// Parse a config from JSON and validate it. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(json)?;
        let errors = validate_config(&config);
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigLoadError::Invalid(errors))
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("default room count must be at least 1")]
    ZeroRoomCount,
    #[error("attempts per room must be at least 1")]
    ZeroAttemptsPerRoom,
    #[error("acceptance ratio {0} is outside (0, 1]")]
    AcceptanceRatioOutOfRange(f32),
    #[error("max session attempts must be at least 1")]
    ZeroSessionAttempts,
    #[error("bounds shrink {0} is outside (0, 1]")]
    ShrinkOutOfRange(f32),
    #[error("overlap margin {0} is negative")]
    NegativeMargin(f32),
    #[error("loop closure distance {0} must be positive")]
    NonPositiveLoopDistance(f32),
    #[error("cap inset {0} is negative")]
    NegativeCapInset(f32),
}

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config failed validation: {0:?}")]
    Invalid(Vec<ConfigError>),
}

/// Validate a generation config, returning all errors found.
pub fn validate_config(config: &GenerationConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.default_room_count == 0 {
        errors.push(ConfigError::ZeroRoomCount);
    }
    if config.attempts_per_room == 0 {
        errors.push(ConfigError::ZeroAttemptsPerRoom);
    }
    if !(config.acceptance_ratio > 0.0 && config.acceptance_ratio <= 1.0) {
        errors.push(ConfigError::AcceptanceRatioOutOfRange(
            config.acceptance_ratio,
        ));
    }
    if config.max_session_attempts == 0 {
        errors.push(ConfigError::ZeroSessionAttempts);
    }
    if !(config.bounds_shrink > 0.0 && config.bounds_shrink <= 1.0) {
        errors.push(ConfigError::ShrinkOutOfRange(config.bounds_shrink));
    }
    if !(config.overlap_margin >= 0.0) {
        errors.push(ConfigError::NegativeMargin(config.overlap_margin));
    }
    if !(config.loop_closure_distance > 0.0) {
        errors.push(ConfigError::NonPositiveLoopDistance(
            config.loop_closure_distance,
        ));
    }
    if !(config.cap_inset >= 0.0) {
        errors.push(ConfigError::NegativeCapInset(config.cap_inset));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GenerationConfig::default();
        let errors = validate_config(&config);
        assert!(
            errors.is_empty(),
            "default config should be valid: {errors:?}"
        );
    }

    #[test]
    fn attempt_budget_scales_with_target() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_growth_attempts(10), 50);
        assert_eq!(config.max_growth_attempts(0), 0);
        assert_eq!(config.max_growth_attempts(u32::MAX), u32::MAX);
    }

    #[test]
    fn quota_is_seventy_percent_by_default() {
        let config = GenerationConfig::default();
        assert!(!config.meets_quota(6, 10));
        assert!(config.meets_quota(7, 10));
        assert!(config.meets_quota(12, 10));
        assert!(config.meets_quota(14, 20));
        assert!(!config.meets_quota(13, 20));
    }

    #[test]
    fn zero_counts_rejected() {
        let config = GenerationConfig {
            default_room_count: 0,
            attempts_per_room: 0,
            max_session_attempts: 0,
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert!(errors.contains(&ConfigError::ZeroRoomCount));
        assert!(errors.contains(&ConfigError::ZeroAttemptsPerRoom));
        assert!(errors.contains(&ConfigError::ZeroSessionAttempts));
    }

    #[test]
    fn ratio_and_shrink_ranges() {
        let mut config = GenerationConfig::default();
        config.acceptance_ratio = 0.0;
        config.bounds_shrink = 1.5;
        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::AcceptanceRatioOutOfRange(_))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::ShrinkOutOfRange(_))));
    }

    #[test]
    fn nan_values_rejected() {
        let mut config = GenerationConfig::default();
        config.overlap_margin = f32::NAN;
        config.loop_closure_distance = f32::NAN;
        assert_eq!(validate_config(&config).len(), 2);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config = GenerationConfig::from_json(r#"{ "default_room_count": 12, "seed": 99 }"#)
            .expect("valid config");
        assert_eq!(config.default_room_count, 12);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.max_session_attempts, 10);
    }

    #[test]
    fn invalid_json_config_reports_errors() {
        match GenerationConfig::from_json(r#"{ "acceptance_ratio": 2.0 }"#) {
            Err(ConfigLoadError::Invalid(errors)) => {
                assert_eq!(errors, vec![ConfigError::AcceptanceRatioOutOfRange(2.0)]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(matches!(
            GenerationConfig::from_json("not json"),
            Err(ConfigLoadError::Json(_))
        ));
    }
}
