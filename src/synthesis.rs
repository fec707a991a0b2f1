//! Constrained random landscape synthesis.
//!
//! Squared coefficient magnitudes are obtained from a least squares solve of
//! a 14×12 system: six rows (one per block pair) tie the low-level variance
//! of the two blocks outside the pair to the high-level variance of the two
//! blocks inside it, and eight rows pin each low-level square to an
//! independent `Uniform(0, 1)^2` draw. Draws that produce a negative square are
//! discarded and redrawn from scratch.

use rand::seq::index;
use rand::{Rng, RngCore};

use crate::combination::{NUM_BLOCKS, NUM_COEFFICIENTS, NUM_FEATURES};
use crate::config::SynthesisConfig;
use crate::error::{AdvisorError, Result};
use crate::landscape::Landscape;
use crate::regression;

const NUM_BLOCK_PAIRS: usize = NUM_BLOCKS * (NUM_BLOCKS - 1) / 2;

/// Rows of the variance-balance system: one per unordered block pair, then
/// one identity row per low-level coefficient.
fn constraint_matrix() -> Vec<Vec<f64>> {
    let mut rows = Vec::with_capacity(NUM_BLOCK_PAIRS + NUM_FEATURES);
    for first in 0..NUM_BLOCKS {
        for second in (first + 1)..NUM_BLOCKS {
            let in_pair = |block: usize| block == first || block == second;
            let mut row = vec![0.0; NUM_COEFFICIENTS];
            for block in 0..NUM_BLOCKS {
                if in_pair(block) {
                    row[NUM_FEATURES + block] = -1.0;
                } else {
                    row[2 * block] = 1.0;
                    row[2 * block + 1] = 1.0;
                }
            }
            rows.push(row);
        }
    }
    for feature in 0..NUM_FEATURES {
        let mut row = vec![0.0; NUM_COEFFICIENTS];
        row[feature] = 1.0;
        rows.push(row);
    }
    rows
}

/// Least squares solution for one random draw of the low-level squares.
fn solve_squared_magnitudes(matrix: &[Vec<f64>], rng: &mut dyn RngCore) -> Result<Vec<f64>> {
    let mut dependent_values = vec![0.0; NUM_BLOCK_PAIRS];
    dependent_values.extend((0..NUM_FEATURES).map(|_| rng.random::<f64>().powi(2)));

    let rcond = f64::EPSILON * matrix.len().max(NUM_COEFFICIENTS) as f64;
    regression::solve(matrix, &dependent_values, NUM_COEFFICIENTS, rcond)
}

/// One draw of the twelve squared magnitudes, or `None` if any is negative.
fn draw_squared_magnitudes(
    matrix: &[Vec<f64>],
    rng: &mut dyn RngCore,
) -> Result<Option<Vec<f64>>> {
    let squares = solve_squared_magnitudes(matrix, rng)?;
    if squares.iter().any(|&square| square < 0.0) {
        return Ok(None);
    }
    Ok(Some(squares))
}

fn random_sign(rng: &mut dyn RngCore) -> f64 {
    if rng.random_bool(0.5) { 1.0 } else { -1.0 }
}

/// Signs the high-level magnitudes so the best high-level setting of each
/// block agrees with its best low-level setting.
///
/// When the high-level magnitude exceeds either low-level magnitude of its
/// block the sign is free and drawn at random.
fn signed_high_coefficients(
    magnitudes: &[f64],
    coefficients_low: &[f64; NUM_FEATURES],
    rng: &mut dyn RngCore,
) -> [f64; NUM_BLOCKS] {
    let mut coefficients_high = [0.0; NUM_BLOCKS];
    for (block, coefficient) in coefficients_high.iter_mut().enumerate() {
        let magnitude = magnitudes[block];
        let first = coefficients_low[2 * block];
        let second = coefficients_low[2 * block + 1];
        *coefficient = if magnitude > first.abs() || magnitude > second.abs() {
            random_sign(rng) * magnitude
        } else {
            let same_settings_sum = (first + second).abs();
            let different_settings_sum = (-first + second).abs();
            if same_settings_sum < different_settings_sum {
                -magnitude
            } else {
                magnitude
            }
        };
    }
    coefficients_high
}

/// Generate a random landscape with the default attempt cap.
pub fn generate_random_landscape(rng: &mut dyn RngCore) -> Result<Landscape> {
    generate_random_landscape_with_config(&SynthesisConfig::default(), rng)
}

/// Generate a random landscape with id 0.
///
/// Fails with [`AdvisorError::SynthesisExhausted`] if every one of
/// `config.max_attempts` draws produced a negative squared coefficient.
pub fn generate_random_landscape_with_config(
    config: &SynthesisConfig,
    rng: &mut dyn RngCore,
) -> Result<Landscape> {
    config.validate()?;
    let matrix = constraint_matrix();

    let mut squares = None;
    for attempt in 1..=config.max_attempts {
        if let Some(drawn) = draw_squared_magnitudes(&matrix, rng)? {
            squares = Some(drawn);
            break;
        }
        tracing::debug!(attempt, "negative squared coefficient, redrawing landscape");
    }
    let squares = squares.ok_or(AdvisorError::SynthesisExhausted {
        attempts: config.max_attempts,
    })?;
    let magnitudes: Vec<f64> = squares.iter().map(|square| square.sqrt()).collect();

    let blocks = index::sample(rng, NUM_BLOCKS, 2);
    let (block_nr1, block_nr2) = (blocks.index(0), blocks.index(1));

    let mut coefficients_low = [0.0; NUM_FEATURES];
    for (coefficient, magnitude) in coefficients_low.iter_mut().zip(&magnitudes) {
        *coefficient = random_sign(rng) * magnitude;
    }
    let coefficients_high =
        signed_high_coefficients(&magnitudes[NUM_FEATURES..], &coefficients_low, rng);

    Landscape::new(coefficients_low, coefficients_high, block_nr1, block_nr2, 0)
}
