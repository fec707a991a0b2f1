//! Experiment constants, grouped per component.
//!
//! The defaults are the values the experiment was run with; they are passed
//! explicitly to constructors rather than read from global state.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};

/// Configuration for an [`Advisor`](crate::Advisor).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Reward anchor subtracted from every observed reward before regression.
    ///
    /// Must equal [`LandscapeConfig::average_reward`] of the landscape the
    /// advisor observes; [`Advisor::for_landscape`](crate::Advisor::for_landscape)
    /// takes it from there.
    pub mean_reward: f64,
    /// Relative singular value cutoff for the pseudo-inverse.
    pub rcond: f64,
    /// Softmax temperature applied to reward estimates before sampling.
    ///
    /// 1.0 is plain softmax. The live experiment advised with 2.0.
    pub temperature: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            mean_reward: 100.0,
            rcond: 1e-5,
            temperature: 1.0,
        }
    }
}

impl AdvisorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.mean_reward.is_finite() {
            return Err(AdvisorError::InvalidParameter {
                message: format!("mean_reward must be finite, got {}", self.mean_reward),
            });
        }
        if !(self.rcond >= 0.0 && self.rcond < 1.0) {
            return Err(AdvisorError::InvalidParameter {
                message: format!("rcond must be in [0, 1), got {}", self.rcond),
            });
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(AdvisorError::InvalidParameter {
                message: format!("temperature must be finite and positive, got {}", self.temperature),
            });
        }
        Ok(())
    }
}

/// Reward scaling and noise for a [`ScaledLandscape`](crate::ScaledLandscape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandscapeConfig {
    /// Scaled reward of a combination whose unscaled reward is zero.
    ///
    /// Advisors observing this landscape must use it as their
    /// [`AdvisorConfig::mean_reward`].
    pub average_reward: f64,
    /// Variance of the Gaussian noise added to noisy rewards.
    pub gaussian_variance: f64,
    /// Range the random minimum reward is drawn from (upper bound exclusive).
    pub min_reward_range: Range<i64>,
}

impl LandscapeConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.average_reward.is_finite() {
            return Err(AdvisorError::InvalidParameter {
                message: format!("average_reward must be finite, got {}", self.average_reward),
            });
        }
        if self.min_reward_range.is_empty() {
            return Err(AdvisorError::InvalidParameter {
                message: format!("min_reward_range {:?} is empty", self.min_reward_range),
            });
        }
        // Draws stay below the exclusive end, which must not pass the average.
        if self.min_reward_range.end as f64 > self.average_reward {
            return Err(AdvisorError::InvalidParameter {
                message: format!(
                    "min_reward_range {:?} reaches past average_reward {}",
                    self.min_reward_range, self.average_reward
                ),
            });
        }
        Ok(())
    }
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            average_reward: 100.0,
            gaussian_variance: 4.0,
            min_reward_range: 20..70,
        }
    }
}

/// Random landscape synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Redraws allowed before synthesis gives up.
    pub max_attempts: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { max_attempts: 1000 }
    }
}

impl SynthesisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(AdvisorError::InvalidParameter {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let advisor = AdvisorConfig::default();
        assert_eq!(advisor.mean_reward, 100.0);
        assert_eq!(advisor.rcond, 1e-5);
        assert_eq!(advisor.temperature, 1.0);
        assert!(advisor.validate().is_ok());

        let landscape = LandscapeConfig::default();
        assert_eq!(landscape.gaussian_variance, 4.0);
        assert_eq!(landscape.min_reward_range, 20..70);
        assert!(landscape.validate().is_ok());
        assert!(SynthesisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_advisor_config_validation() {
        let config = AdvisorConfig {
            rcond: -1.0,
            ..AdvisorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AdvisorConfig {
            mean_reward: f64::NAN,
            ..AdvisorConfig::default()
        };
        assert!(config.validate().is_err());

        for temperature in [0.0, -2.0, f64::INFINITY] {
            let config = AdvisorConfig {
                temperature,
                ..AdvisorConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(AdvisorError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_landscape_config_validation() {
        let config = LandscapeConfig {
            min_reward_range: 50..50,
            ..LandscapeConfig::default()
        };
        assert!(config.validate().is_err());

        // The whole range must lie below the average reward.
        let config = LandscapeConfig {
            min_reward_range: 90..120,
            ..LandscapeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AdvisorError::InvalidParameter { .. })
        ));

        let config = LandscapeConfig {
            min_reward_range: 20..100,
            ..LandscapeConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_synthesis_config_validation() {
        let config = SynthesisConfig { max_attempts: 0 };
        assert!(matches!(
            config.validate(),
            Err(AdvisorError::InvalidParameter { .. })
        ));
        assert!(SynthesisConfig { max_attempts: 1 }.validate().is_ok());
    }
}
