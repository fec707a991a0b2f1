//! Ground-truth reward landscapes.
//!
//! A [`Landscape`] is a linear reward function over the 256 combinations: one
//! coefficient per raw feature plus one per block product. Rewards are only
//! observable after scaling, which turns the landscape into a
//! [`ScaledLandscape`] with a fixed `[min_reward, max_reward]` range and
//! Gaussian observation noise.

use std::hash::{Hash, Hasher};

use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::combination::{
    Combination, NUM_BLOCKS, NUM_COEFFICIENTS, NUM_COMBINATIONS, NUM_FEATURES, all_combinations,
    check_block_pair,
};
use crate::config::LandscapeConfig;
use crate::error::{AdvisorError, Result};
use crate::suggestion::Suggestion;

/// An observed combination and the reward it realized.
///
/// Two selections are equal when they chose the same combination, whatever
/// the reward.
#[derive(Clone, Copy, Debug)]
pub struct Selection {
    combination: Combination,
    reward: f64,
}

impl Selection {
    pub fn new(combination: Combination, reward: f64) -> Self {
        Self {
            combination,
            reward,
        }
    }

    pub fn combination(&self) -> &Combination {
        &self.combination
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    /// Reward normalized to `[0, 100]` within `[min_reward, max_reward]`.
    pub fn reward_in_percentage(&self, min_reward: f64, max_reward: f64) -> f64 {
        (self.reward - min_reward) / (max_reward - min_reward) * 100.0
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.combination == other.combination
    }
}

impl Eq for Selection {}

impl Hash for Selection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.combination.hash(state);
    }
}

/// Persisted form of a landscape.
///
/// Scaling state is never part of the record; callers re-derive it with
/// [`Landscape::init_scaled_rewards`] or
/// [`Landscape::init_scaled_rewards_with_min_reward`] after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandscapeRecord {
    pub coefficients_low: [f64; NUM_FEATURES],
    pub coefficients_high: [f64; NUM_BLOCKS],
    pub block_nr1: usize,
    pub block_nr2: usize,
    #[serde(default)]
    pub id: u64,
}

/// A linear reward function over the combination space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LandscapeRecord", into = "LandscapeRecord")]
pub struct Landscape {
    coefficients_low: [f64; NUM_FEATURES],
    coefficients_high: [f64; NUM_BLOCKS],
    block_nr1: usize,
    block_nr2: usize,
    id: u64,
    combinations: Vec<Combination>,
    unscaled_rewards: Vec<f64>,
}

impl Landscape {
    /// Creates a landscape and precomputes the unscaled reward of every combination.
    pub fn new(
        coefficients_low: [f64; NUM_FEATURES],
        coefficients_high: [f64; NUM_BLOCKS],
        block_nr1: usize,
        block_nr2: usize,
        id: u64,
    ) -> Result<Self> {
        check_block_pair(block_nr1, block_nr2)?;
        if let Some(value) = coefficients_low
            .iter()
            .chain(coefficients_high.iter())
            .find(|value| !value.is_finite())
        {
            return Err(AdvisorError::InvalidParameter {
                message: format!("landscape coefficients must be finite, got {value}"),
            });
        }

        let mut landscape = Self {
            coefficients_low,
            coefficients_high,
            block_nr1,
            block_nr2,
            id,
            combinations: all_combinations(),
            unscaled_rewards: Vec::with_capacity(NUM_COMBINATIONS),
        };
        landscape.unscaled_rewards = landscape
            .combinations
            .iter()
            .map(|combination| landscape.combination_unscaled_reward(combination))
            .collect();
        Ok(landscape)
    }

    /// The same landscape under a different identifier.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn coefficients_low(&self) -> &[f64; NUM_FEATURES] {
        &self.coefficients_low
    }

    pub fn coefficients_high(&self) -> &[f64; NUM_BLOCKS] {
        &self.coefficients_high
    }

    /// All twelve coefficients, low-level first.
    pub fn coefficients(&self) -> [f64; NUM_COEFFICIENTS] {
        let mut coefficients = [0.0; NUM_COEFFICIENTS];
        coefficients[..NUM_FEATURES].copy_from_slice(&self.coefficients_low);
        coefficients[NUM_FEATURES..].copy_from_slice(&self.coefficients_high);
        coefficients
    }

    pub fn block_nr1(&self) -> usize {
        self.block_nr1
    }

    pub fn block_nr2(&self) -> usize {
        self.block_nr2
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// All 256 combinations, in the order of [`unscaled_rewards`](Self::unscaled_rewards).
    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }

    pub fn unscaled_rewards(&self) -> &[f64] {
        &self.unscaled_rewards
    }

    /// A uniformly random combination.
    pub fn random_combination(&self, rng: &mut dyn RngCore) -> Combination {
        self.combinations[rng.random_range(0..self.combinations.len())]
    }

    pub fn combination_unscaled_reward(&self, combination: &Combination) -> f64 {
        self.coefficients()
            .iter()
            .zip(combination.features())
            .map(|(coefficient, feature)| coefficient * feature)
            .sum()
    }

    /// Unscaled value of the entries a suggestion specifies.
    pub fn suggestion_value(&self, suggestion: &Suggestion) -> f64 {
        let (low, high) = suggestion.suggestion_values();
        let high_value: f64 = high
            .iter()
            .zip(self.coefficients_high.iter())
            .filter_map(|(value, coefficient)| value.map(|v| f64::from(v) * coefficient))
            .sum();
        let low_value: f64 = low
            .iter()
            .zip(self.coefficients_low.iter())
            .filter_map(|(value, coefficient)| value.map(|v| f64::from(v) * coefficient))
            .sum();
        high_value + low_value
    }

    pub fn record(&self) -> LandscapeRecord {
        LandscapeRecord {
            coefficients_low: self.coefficients_low,
            coefficients_high: self.coefficients_high,
            block_nr1: self.block_nr1,
            block_nr2: self.block_nr2,
            id: self.id,
        }
    }

    /// Scales rewards with a minimum drawn uniformly from the configured range.
    pub fn init_scaled_rewards(&self, rng: &mut dyn RngCore) -> Result<ScaledLandscape> {
        self.init_scaled_rewards_with_config(LandscapeConfig::default(), rng)
    }

    pub fn init_scaled_rewards_with_config(
        &self,
        config: LandscapeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<ScaledLandscape> {
        config.validate()?;
        let min_reward = rng.random_range(config.min_reward_range.clone()) as f64;
        ScaledLandscape::new(self.clone(), config, min_reward)
    }

    /// Scales rewards so that the worst combination maps exactly to `min_reward`.
    pub fn init_scaled_rewards_with_min_reward(&self, min_reward: f64) -> Result<ScaledLandscape> {
        ScaledLandscape::new(self.clone(), LandscapeConfig::default(), min_reward)
    }
}

impl TryFrom<LandscapeRecord> for Landscape {
    type Error = AdvisorError;

    fn try_from(record: LandscapeRecord) -> Result<Self> {
        Self::new(
            record.coefficients_low,
            record.coefficients_high,
            record.block_nr1,
            record.block_nr2,
            record.id,
        )
    }
}

impl From<Landscape> for LandscapeRecord {
    fn from(landscape: Landscape) -> Self {
        landscape.record()
    }
}

/// A landscape with reward scaling fixed; the only way to observe rewards.
#[derive(Debug, Clone)]
pub struct ScaledLandscape {
    landscape: Landscape,
    config: LandscapeConfig,
    noise: Normal<f64>,
    min_reward: f64,
    max_reward: f64,
    scalar: f64,
}

impl ScaledLandscape {
    fn new(landscape: Landscape, config: LandscapeConfig, min_reward: f64) -> Result<Self> {
        if !(min_reward.is_finite() && min_reward < config.average_reward) {
            return Err(AdvisorError::InvalidParameter {
                message: format!(
                    "min_reward must be finite and below the average reward {}, got {min_reward}",
                    config.average_reward
                ),
            });
        }
        let noise = Normal::new(0.0, config.gaussian_variance.sqrt()).map_err(|err| {
            AdvisorError::InvalidParameter {
                message: format!(
                    "gaussian variance {} is invalid: {err}",
                    config.gaussian_variance
                ),
            }
        })?;

        let min_unscaled = landscape
            .unscaled_rewards
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        if !(min_unscaled < 0.0) {
            return Err(AdvisorError::DegenerateLandscape { min_unscaled });
        }

        let scalar = (min_reward - config.average_reward) / min_unscaled;
        let max_reward = landscape
            .unscaled_rewards
            .iter()
            .map(|reward| (scalar * reward + config.average_reward).round_ties_even())
            .fold(f64::NEG_INFINITY, f64::max);

        tracing::debug!(
            landscape_id = landscape.id,
            min_reward,
            max_reward,
            scalar,
            "initialized reward scaling"
        );

        Ok(Self {
            landscape,
            config,
            noise,
            min_reward,
            max_reward,
            scalar,
        })
    }

    pub fn landscape(&self) -> &Landscape {
        &self.landscape
    }

    pub fn min_reward(&self) -> f64 {
        self.min_reward
    }

    pub fn max_reward(&self) -> f64 {
        self.max_reward
    }

    pub fn scalar(&self) -> f64 {
        self.scalar
    }

    pub fn average_reward(&self) -> f64 {
        self.config.average_reward
    }

    pub fn gaussian_variance(&self) -> f64 {
        self.config.gaussian_variance
    }

    fn clip(&self, value: f64) -> f64 {
        self.min_reward.max(self.max_reward.min(value))
    }

    fn scale(&self, unscaled: f64) -> f64 {
        self.scalar * unscaled + self.config.average_reward
    }

    /// Observes `combination` with Gaussian noise, rounded and clipped to the reward range.
    pub fn selection_with_noisy_reward(
        &self,
        combination: Combination,
        rng: &mut dyn RngCore,
    ) -> Selection {
        let scaled = self.scale(self.landscape.combination_unscaled_reward(&combination));
        let noisy = (scaled + self.noise.sample(rng)).round_ties_even();
        Selection::new(combination, self.clip(noisy))
    }

    /// Observes `combination` without noise.
    pub fn selection_with_non_noisy_reward(&self, combination: Combination) -> Selection {
        let scaled = self
            .scale(self.landscape.combination_unscaled_reward(&combination))
            .round_ties_even();
        Selection::new(combination, self.clip(scaled))
    }

    pub fn suggestion_value(&self, suggestion: &Suggestion) -> f64 {
        self.landscape.suggestion_value(suggestion)
    }

    /// Suggestion value on the reward scale, clipped to the reward range (not rounded).
    pub fn scaled_suggestion_value(&self, suggestion: &Suggestion) -> f64 {
        self.clip(self.scale(self.suggestion_value(suggestion)))
    }

    /// Suggestion value normalized to `[0, 100]` within the reward range.
    pub fn suggestion_value_in_percentage(&self, suggestion: &Suggestion) -> f64 {
        (self.scaled_suggestion_value(suggestion) - self.min_reward)
            / (self.max_reward - self.min_reward)
            * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::{all_high_level_suggestions, all_low_level_suggestions};
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn uniform_landscape() -> Landscape {
        Landscape::new([1.0; 8], [0.0; 4], 0, 1, 7).unwrap()
    }

    #[test]
    fn test_unscaled_rewards() {
        let landscape = uniform_landscape();
        assert_eq!(landscape.unscaled_rewards().len(), 256);
        let all_up = Combination::new([1; 8]).unwrap();
        let all_down = Combination::new([-1; 8]).unwrap();
        assert_eq!(landscape.combination_unscaled_reward(&all_up), 8.0);
        assert_eq!(landscape.combination_unscaled_reward(&all_down), -8.0);
    }

    #[test]
    fn test_high_level_terms_in_reward() {
        let landscape = Landscape::new([0.0; 8], [1.0, -2.0, 0.5, 0.0], 2, 3, 0).unwrap();
        // Blocks: (1,1) -> 1, (1,-1) -> -1, (-1,-1) -> 1, (1,1) -> 1.
        let combination = Combination::new([1, 1, 1, -1, -1, -1, 1, 1]).unwrap();
        assert_abs_diff_eq!(
            landscape.combination_unscaled_reward(&combination),
            1.0 + 2.0 + 0.5
        );
    }

    #[test]
    fn test_scaling_with_min_reward() {
        let scaled = uniform_landscape()
            .init_scaled_rewards_with_min_reward(20.0)
            .unwrap();
        assert_abs_diff_eq!(scaled.scalar(), 10.0);
        assert_eq!(scaled.min_reward(), 20.0);
        assert_eq!(scaled.max_reward(), 180.0);

        let worst = scaled.selection_with_non_noisy_reward(Combination::new([-1; 8]).unwrap());
        assert_eq!(worst.reward(), 20.0);
        let best = scaled.selection_with_non_noisy_reward(Combination::new([1; 8]).unwrap());
        assert_eq!(best.reward(), 180.0);
    }

    #[test]
    fn test_random_min_reward_in_range() {
        let landscape = uniform_landscape();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let scaled = landscape.init_scaled_rewards(&mut rng).unwrap();
            assert!((20.0..70.0).contains(&scaled.min_reward()));
            assert_eq!(scaled.min_reward().fract(), 0.0);
        }
    }

    #[test]
    fn test_noisy_reward_is_integral_and_clipped() {
        let scaled = uniform_landscape()
            .init_scaled_rewards_with_min_reward(30.0)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for combination in scaled.landscape().combinations() {
            let selection = scaled.selection_with_noisy_reward(*combination, &mut rng);
            assert_eq!(selection.reward().fract(), 0.0);
            assert!(selection.reward() >= scaled.min_reward());
            assert!(selection.reward() <= scaled.max_reward());
        }
    }

    #[test]
    fn test_noisy_reward_is_gaussian_around_scaled_reward() {
        let scaled = uniform_landscape()
            .init_scaled_rewards_with_min_reward(20.0)
            .unwrap();
        // Unscaled reward 0, so the noiseless reward is the average, far from either bound.
        let balanced = Combination::new([1, -1, 1, -1, 1, -1, 1, -1]).unwrap();
        assert_eq!(
            scaled.selection_with_non_noisy_reward(balanced).reward(),
            100.0
        );

        let mut rng = StdRng::seed_from_u64(1234);
        let draws: Vec<f64> = (0..10_000)
            .map(|_| scaled.selection_with_noisy_reward(balanced, &mut rng).reward())
            .collect();
        let n = draws.len() as f64;
        let mean = draws.iter().sum::<f64>() / n;
        let variance = draws.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);

        // Rounding to integers adds about 1/12 to the variance of 4.
        assert_abs_diff_eq!(mean, 100.0, epsilon = 0.1);
        assert_abs_diff_eq!(variance, 4.0, epsilon = 0.3);
    }

    #[test]
    fn test_scaling_config_checked_up_front() {
        let config = LandscapeConfig {
            min_reward_range: 90..150,
            ..LandscapeConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            uniform_landscape().init_scaled_rewards_with_config(config, &mut rng),
            Err(AdvisorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_degenerate_and_invalid_scaling() {
        let flat = Landscape::new([0.0; 8], [0.0; 4], 0, 1, 0).unwrap();
        assert!(matches!(
            flat.init_scaled_rewards_with_min_reward(20.0),
            Err(AdvisorError::DegenerateLandscape { .. })
        ));
        assert!(matches!(
            uniform_landscape().init_scaled_rewards_with_min_reward(120.0),
            Err(AdvisorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_landscape_validation() {
        assert!(Landscape::new([0.0; 8], [0.0; 4], 1, 1, 0).is_err());
        assert!(Landscape::new([f64::NAN; 8], [0.0; 4], 0, 1, 0).is_err());
    }

    #[test]
    fn test_suggestion_values_on_landscape() {
        let landscape =
            Landscape::new([1.0, -1.0, 0.5, 0.5, 2.0, 0.0, 0.0, 1.0], [0.5; 4], 0, 2, 0).unwrap();
        let scaled = landscape.init_scaled_rewards_with_min_reward(40.0).unwrap();

        let low = all_low_level_suggestions(0, 2).unwrap();
        let high = all_high_level_suggestions();
        for suggestion in low.iter().chain(high.iter()) {
            let percentage = scaled.suggestion_value_in_percentage(suggestion);
            assert!((0.0..=100.0).contains(&percentage));
            let scaled_value = scaled.scaled_suggestion_value(suggestion);
            assert!(scaled_value >= scaled.min_reward() && scaled_value <= scaled.max_reward());
        }

        // Block 0 = (1, -1), block 2 = (1, -1): 1 + 1 + 2 + 0 - 0.5 - 0.5.
        let suggestion =
            Suggestion::LowLevel(crate::LowLevelSuggestion::new([1, -1], [1, -1], 0, 2).unwrap());
        assert_abs_diff_eq!(landscape.suggestion_value(&suggestion), 3.0);
    }

    #[test]
    fn test_selection_equality_by_combination() {
        let combination = Combination::new([1, -1, 1, -1, 1, -1, 1, -1]).unwrap();
        let a = Selection::new(combination, 50.0);
        let b = Selection::new(combination, 90.0);
        assert_eq!(a, b);
        assert_abs_diff_eq!(a.reward_in_percentage(20.0, 120.0), 30.0);
    }

    #[test]
    fn test_random_combination_covers_space() {
        let landscape = uniform_landscape();
        let mut rng = StdRng::seed_from_u64(3);
        let seen: std::collections::HashSet<_> = (0..5000)
            .map(|_| landscape.random_combination(&mut rng))
            .collect();
        assert_eq!(seen.len(), 256);
    }
}
