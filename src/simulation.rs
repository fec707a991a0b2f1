//! Episode-level simulation primitives.
//!
//! An episode pairs one fresh [`Advisor`] with one [`ScaledLandscape`]: each
//! trial the advisor proposes a suggestion, the value of that suggestion is
//! recorded, and the advisor then observes a uniformly random combination with
//! a noisy reward. Episodes share no state, so batches run on rayon workers,
//! each with its own seeded generator.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::advisor::{Advisor, Granularity};
use crate::error::{AdvisorError, Result};
use crate::landscape::{Landscape, ScaledLandscape};
use crate::suggestion::{all_high_level_suggestions, all_low_level_suggestions};

/// Per-trial suggestion values (in percent of the reward range) for one episode.
///
/// Entry `i` is the value of the suggestion made after the advisor has seen
/// `i` random observations.
pub fn advisor_rewards_after_random_selections(
    landscape: &ScaledLandscape,
    nr_trials: usize,
    granularity: Granularity,
    rng: &mut dyn RngCore,
) -> Result<Vec<f64>> {
    let base = landscape.landscape();
    let all_combinations = base.combinations();
    let mut advisor = Advisor::for_landscape(landscape)?;

    let mut rewards = Vec::with_capacity(nr_trials);
    for _ in 0..nr_trials {
        let suggestion = advisor.sample_suggestion(granularity, all_combinations, rng)?;
        rewards.push(landscape.suggestion_value_in_percentage(&suggestion));

        let combination = base.random_combination(rng);
        advisor.update_with_selection(landscape.selection_with_noisy_reward(combination, rng))?;
    }
    Ok(rewards)
}

/// Mean per-trial suggestion value across `landscapes`, one episode each.
///
/// Episode `i` runs with `StdRng::seed_from_u64(seed + i)`, so the result is
/// reproducible regardless of how rayon schedules the episodes.
pub fn mean_advisor_rewards(
    landscapes: &[ScaledLandscape],
    nr_trials: usize,
    granularity: Granularity,
    seed: u64,
) -> Result<Vec<f64>> {
    if landscapes.is_empty() {
        return Err(AdvisorError::InvalidParameter {
            message: "at least one landscape is required".to_string(),
        });
    }

    let curves = landscapes
        .par_iter()
        .enumerate()
        .map(|(episode, landscape)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(episode as u64));
            advisor_rewards_after_random_selections(landscape, nr_trials, granularity, &mut rng)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut means = vec![0.0; nr_trials];
    for curve in &curves {
        for (mean, value) in means.iter_mut().zip(curve) {
            *mean += value;
        }
    }
    let count = curves.len() as f64;
    for mean in &mut means {
        *mean /= count;
    }

    tracing::debug!(
        episodes = curves.len(),
        nr_trials,
        %granularity,
        "averaged advisor episodes"
    );
    Ok(means)
}

/// Weights for [`weighted_suggestion_value_difference`], aligned with sorted
/// suggestion values from lowest to highest.
///
/// Entry `i` is how often participants received the suggestion ranked `i`
/// from the bottom, so differences among the best suggestions dominate.
pub const SUGGESTION_RANK_WEIGHTS: [f64; 16] = [
    0.5388,
    0.693125,
    0.7597499999999999,
    0.880725,
    1.0107249999999999,
    1.2241750000000002,
    1.4245,
    1.6677750000000002,
    1.8658499999999996,
    2.1835500000000003,
    2.6847250000000003,
    3.4429749999999997,
    4.552925,
    7.1568,
    11.128025000000001,
    58.78557500000001,
];

/// Sorted unscaled values of every high-level and every low-level suggestion.
///
/// Comparing these two profiles is how landscapes are preselected so that
/// neither granularity is favoured; see [`weighted_suggestion_value_difference`].
pub fn sorted_suggestion_values(landscape: &Landscape) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut high: Vec<f64> = all_high_level_suggestions()
        .iter()
        .map(|suggestion| landscape.suggestion_value(suggestion))
        .collect();
    let mut low: Vec<f64> = all_low_level_suggestions(landscape.block_nr1(), landscape.block_nr2())?
        .iter()
        .map(|suggestion| landscape.suggestion_value(suggestion))
        .collect();
    high.sort_by(f64::total_cmp);
    low.sort_by(f64::total_cmp);
    Ok((high, low))
}

/// Preselection score of a landscape set: the sorted high-level and
/// low-level value profiles are summed over `landscapes`, and the score is the
/// weighted sum of absolute differences between the two totals, rank by rank.
///
/// Lower scores mean the set offers high- and low-level advice of more equal
/// value. Pass [`SUGGESTION_RANK_WEIGHTS`] for the weighting used to pick the
/// experiment's landscapes.
pub fn weighted_suggestion_value_difference(
    landscapes: &[Landscape],
    weights: &[f64; 16],
) -> Result<f64> {
    if landscapes.is_empty() {
        return Err(AdvisorError::InvalidParameter {
            message: "at least one landscape is required".to_string(),
        });
    }

    let mut high_sum = [0.0; 16];
    let mut low_sum = [0.0; 16];
    for landscape in landscapes {
        let (high, low) = sorted_suggestion_values(landscape)?;
        for (total, value) in high_sum.iter_mut().zip(high) {
            *total += value;
        }
        for (total, value) in low_sum.iter_mut().zip(low) {
            *total += value;
        }
    }

    Ok(high_sum
        .iter()
        .zip(&low_sum)
        .zip(weights)
        .map(|((high, low), weight)| (high - low).abs() * weight)
        .sum())
}
