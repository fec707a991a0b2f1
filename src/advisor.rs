use std::fmt;

use rand::RngCore;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::combination::{Combination, NUM_COEFFICIENTS, check_block_pair};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::landscape::{ScaledLandscape, Selection};
use crate::regression;
use crate::suggestion::{Suggestion, all_high_level_suggestions, all_low_level_suggestions};

/// Which kind of suggestion an advisor produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Block products for all four blocks
    High,
    /// Raw values for the advisor's two blocks
    Low,
}

impl Granularity {
    fn as_str(self) -> &'static str {
        match self {
            Granularity::High => "high",
            Granularity::Low => "low",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Softmax of `values / temperature` with the maximum subtracted before exponentiating.
///
/// The shift leaves the distribution unchanged but keeps `exp` from
/// overflowing for large estimates. Higher temperatures flatten the result.
pub fn stable_softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    let scaled: Vec<f64> = values.iter().map(|v| v / temperature).collect();
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let numerators: Vec<f64> = scaled.iter().map(|v| (v - max).exp()).collect();
    let denominator: f64 = numerators.iter().sum();
    numerators.into_iter().map(|n| n / denominator).collect()
}

/// Online linear advisor over the combination space
///
/// The advisor keeps every observed [`Selection`] and, after each one, refits
/// all twelve reward coefficients (8 raw features, 4 block products) by
/// minimum-norm least squares on `reward - mean_reward`. Suggestions come
/// from the resulting reward estimates, either sampled through a softmax or
/// taken at the maximum with uniform tie-breaking.
#[derive(Debug, Clone)]
pub struct Advisor {
    block_nr1: usize,
    block_nr2: usize,
    config: AdvisorConfig,
    selections: Vec<Selection>,
    coefficients: [f64; NUM_COEFFICIENTS],
    high_level_suggestions: Vec<Suggestion>,
    low_level_suggestions: Vec<Suggestion>,
}

impl Advisor {
    /// Create an advisor whose low-level suggestions fix blocks `block_nr1` and `block_nr2`
    pub fn new(block_nr1: usize, block_nr2: usize) -> Result<Self> {
        Self::with_config(block_nr1, block_nr2, AdvisorConfig::default())
    }

    /// Create an advisor for `landscape`: its block pair, and its average
    /// reward as the regression anchor.
    pub fn for_landscape(landscape: &ScaledLandscape) -> Result<Self> {
        let config = AdvisorConfig {
            mean_reward: landscape.average_reward(),
            ..AdvisorConfig::default()
        };
        let base = landscape.landscape();
        Self::with_config(base.block_nr1(), base.block_nr2(), config)
    }

    pub fn with_config(block_nr1: usize, block_nr2: usize, config: AdvisorConfig) -> Result<Self> {
        check_block_pair(block_nr1, block_nr2)?;
        config.validate()?;
        Ok(Self {
            block_nr1,
            block_nr2,
            config,
            selections: Vec::new(),
            coefficients: [0.0; NUM_COEFFICIENTS],
            high_level_suggestions: all_high_level_suggestions(),
            low_level_suggestions: all_low_level_suggestions(block_nr1, block_nr2)?,
        })
    }

    pub fn block_nr1(&self) -> usize {
        self.block_nr1
    }

    pub fn block_nr2(&self) -> usize {
        self.block_nr2
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Current coefficient estimates: 8 low-level followed by 4 high-level
    pub fn coefficients(&self) -> &[f64; NUM_COEFFICIENTS] {
        &self.coefficients
    }

    /// Observed selections, in the order they were added
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// The 16 enumerated suggestions of the given granularity
    pub fn suggestions(&self, granularity: Granularity) -> &[Suggestion] {
        match granularity {
            Granularity::High => &self.high_level_suggestions,
            Granularity::Low => &self.low_level_suggestions,
        }
    }

    pub fn combination_reward_estimate(&self, combination: &Combination) -> f64 {
        self.coefficients
            .iter()
            .zip(combination.features())
            .map(|(coefficient, feature)| coefficient * feature)
            .sum()
    }

    fn reward_estimates(&self, all_combinations: &[Combination]) -> Result<Vec<f64>> {
        if all_combinations.is_empty() {
            return Err(AdvisorError::NoCombinations);
        }
        Ok(all_combinations
            .iter()
            .map(|combination| self.combination_reward_estimate(combination))
            .collect())
    }

    /// Every combination whose estimate equals the maximum estimate exactly
    pub fn all_best_combinations(&self, all_combinations: &[Combination]) -> Result<Vec<Combination>> {
        let estimates = self.reward_estimates(all_combinations)?;
        let best = estimates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(all_combinations
            .iter()
            .zip(estimates)
            .filter(|(_, estimate)| *estimate == best)
            .map(|(combination, _)| *combination)
            .collect())
    }

    /// A maximizing combination; ties are broken uniformly at random
    pub fn best_combination(
        &self,
        all_combinations: &[Combination],
        rng: &mut dyn RngCore,
    ) -> Result<Combination> {
        let best = self.all_best_combinations(all_combinations)?;
        best.choose(rng).copied().ok_or(AdvisorError::NoCombinations)
    }

    /// Softmax of the reward estimates at the configured temperature, aligned with `all_combinations`
    pub fn combination_probabilities(&self, all_combinations: &[Combination]) -> Result<Vec<f64>> {
        let estimates = self.reward_estimates(all_combinations)?;
        Ok(stable_softmax(&estimates, self.config.temperature))
    }

    /// Draw one combination from the softmax distribution
    pub fn sample_combination(
        &self,
        all_combinations: &[Combination],
        rng: &mut dyn RngCore,
    ) -> Result<Combination> {
        let probabilities = self.combination_probabilities(all_combinations)?;
        let distribution =
            WeightedIndex::new(&probabilities).map_err(|err| AdvisorError::NumericalError {
                message: format!("invalid combination probabilities: {err}"),
            })?;
        Ok(all_combinations[distribution.sample(rng)])
    }

    /// The unique enumerated suggestion of `granularity` that matches `combination`
    pub fn matching_suggestion(
        &self,
        granularity: Granularity,
        combination: &Combination,
    ) -> Result<Suggestion> {
        let matching: Vec<&Suggestion> = self
            .suggestions(granularity)
            .iter()
            .filter(|suggestion| suggestion.is_matching_combination(combination))
            .collect();
        match matching.as_slice() {
            [suggestion] => Ok(**suggestion),
            _ => Err(AdvisorError::SuggestionMismatch {
                granularity: granularity.as_str(),
                combination: combination.to_string(),
                matches: matching.len(),
            }),
        }
    }

    pub fn sample_suggestion(
        &self,
        granularity: Granularity,
        all_combinations: &[Combination],
        rng: &mut dyn RngCore,
    ) -> Result<Suggestion> {
        let combination = self.sample_combination(all_combinations, rng)?;
        self.matching_suggestion(granularity, &combination)
    }

    pub fn best_suggestion(
        &self,
        granularity: Granularity,
        all_combinations: &[Combination],
        rng: &mut dyn RngCore,
    ) -> Result<Suggestion> {
        let combination = self.best_combination(all_combinations, rng)?;
        self.matching_suggestion(granularity, &combination)
    }

    /// Every suggestion of `granularity` that matches at least one maximizing combination
    pub fn all_best_suggestions(
        &self,
        granularity: Granularity,
        all_combinations: &[Combination],
    ) -> Result<Vec<Suggestion>> {
        let best = self.all_best_combinations(all_combinations)?;
        Ok(self
            .suggestions(granularity)
            .iter()
            .filter(|suggestion| best.iter().any(|c| suggestion.is_matching_combination(c)))
            .copied()
            .collect())
    }

    pub fn sample_suggestion_high_level(
        &self,
        all_combinations: &[Combination],
        rng: &mut dyn RngCore,
    ) -> Result<Suggestion> {
        self.sample_suggestion(Granularity::High, all_combinations, rng)
    }

    pub fn sample_suggestion_low_level(
        &self,
        all_combinations: &[Combination],
        rng: &mut dyn RngCore,
    ) -> Result<Suggestion> {
        self.sample_suggestion(Granularity::Low, all_combinations, rng)
    }

    pub fn best_suggestion_high_level(
        &self,
        all_combinations: &[Combination],
        rng: &mut dyn RngCore,
    ) -> Result<Suggestion> {
        self.best_suggestion(Granularity::High, all_combinations, rng)
    }

    pub fn best_suggestion_low_level(
        &self,
        all_combinations: &[Combination],
        rng: &mut dyn RngCore,
    ) -> Result<Suggestion> {
        self.best_suggestion(Granularity::Low, all_combinations, rng)
    }

    pub fn all_best_suggestions_high_level(
        &self,
        all_combinations: &[Combination],
    ) -> Result<Vec<Suggestion>> {
        self.all_best_suggestions(Granularity::High, all_combinations)
    }

    pub fn all_best_suggestions_low_level(
        &self,
        all_combinations: &[Combination],
    ) -> Result<Vec<Suggestion>> {
        self.all_best_suggestions(Granularity::Low, all_combinations)
    }

    fn design_rows(&self) -> Vec<Vec<f64>> {
        self.selections
            .iter()
            .map(|selection| selection.combination().features().to_vec())
            .collect()
    }

    /// Append `selection` and refit every coefficient from the full history
    ///
    /// On a numerical failure the selection is not kept and the previous
    /// coefficients stay in place.
    pub fn update_with_selection(&mut self, selection: Selection) -> Result<()> {
        self.selections.push(selection);

        let rows = self.design_rows();
        let targets: Vec<f64> = self
            .selections
            .iter()
            .map(|s| s.reward() - self.config.mean_reward)
            .collect();

        match regression::solve(&rows, &targets, NUM_COEFFICIENTS, self.config.rcond) {
            Ok(beta) => {
                self.coefficients.copy_from_slice(&beta);
                tracing::trace!(
                    selections = self.selections.len(),
                    coefficients = ?self.coefficients,
                    "refit advisor coefficients"
                );
                Ok(())
            }
            Err(err) => {
                self.selections.pop();
                tracing::warn!(error = %err, "advisor refit failed, selection discarded");
                Err(err)
            }
        }
    }

    /// Rank of the design matrix built from the selection history
    ///
    /// The regression is fully determined once this reaches 12.
    pub fn selections_matrix_rank(&self) -> Result<usize> {
        regression::matrix_rank(&self.design_rows(), NUM_COEFFICIENTS)
    }
}
