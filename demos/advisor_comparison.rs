//! Compares high-level and low-level advice on randomly generated landscapes.
//!
//! Each landscape is rescaled many times with fresh minimum rewards, one
//! advisor episode runs per rescaling, and the mean per-trial suggestion
//! value is reported for both granularities as JSON lines.
//!
//! Run with `RUST_LOG=combo_advisor=debug` to see scaling and synthesis events.

use combo_advisor::simulation::{
    SUGGESTION_RANK_WEIGHTS, mean_advisor_rewards, sorted_suggestion_values,
    weighted_suggestion_value_difference,
};
use combo_advisor::{Granularity, ScaledLandscape, generate_random_landscape};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

const NR_LANDSCAPES: u64 = 5;
const REPEAT_LANDSCAPE: usize = 300;
const NR_TRIALS: usize = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut rng = StdRng::seed_from_u64(42);

    for id in 0..NR_LANDSCAPES {
        let landscape = generate_random_landscape(&mut rng)?.with_id(id);
        let scaled: Vec<ScaledLandscape> = (0..REPEAT_LANDSCAPE)
            .map(|_| landscape.init_scaled_rewards(&mut rng))
            .collect::<Result<_, _>>()?;

        let high_rewards = mean_advisor_rewards(&scaled, NR_TRIALS, Granularity::High, id * 1000)?;
        let low_rewards = mean_advisor_rewards(&scaled, NR_TRIALS, Granularity::Low, id * 1000)?;
        let (high_values, low_values) = sorted_suggestion_values(&landscape)?;
        let balance_score = weighted_suggestion_value_difference(
            std::slice::from_ref(&landscape),
            &SUGGESTION_RANK_WEIGHTS,
        )?;

        tracing::info!(
            landscape_id = id,
            block_nr1 = landscape.block_nr1(),
            block_nr2 = landscape.block_nr2(),
            final_high = high_rewards[NR_TRIALS - 1],
            final_low = low_rewards[NR_TRIALS - 1],
            balance_score,
            "landscape finished"
        );

        let mut record = serde_json::to_value(landscape.record())?;
        if let Some(object) = record.as_object_mut() {
            object.insert("high_rewards".into(), serde_json::to_value(&high_rewards)?);
            object.insert("low_rewards".into(), serde_json::to_value(&low_rewards)?);
            object.insert("high_suggestion_values".into(), serde_json::to_value(&high_values)?);
            object.insert("low_suggestion_values".into(), serde_json::to_value(&low_values)?);
            object.insert("balance_score".into(), serde_json::to_value(balance_score)?);
        }
        println!("{record}");
    }

    Ok(())
}
