//! combo-advisor: a contextual-bandit advisor over a synthetic combination space.
//!
//! Combinations are eight ±1 features grouped into four blocks of two. A
//! [`Landscape`] assigns each combination a linear reward over the raw features
//! and the block products; an [`Advisor`] learns those twelve coefficients
//! online from observed [`Selection`]s and produces advice at two
//! granularities: [`HighLevelSuggestion`] (all four block products) and
//! [`LowLevelSuggestion`] (raw values of two blocks).
//!
//! # Quick Start
//!
//! ```
//! use combo_advisor::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! // Draw a landscape and fix its reward scale
//! let landscape = generate_random_landscape(&mut rng).unwrap();
//! let scaled = landscape.init_scaled_rewards(&mut rng).unwrap();
//!
//! // One advisor per episode, paired with the landscape's blocks and reward anchor
//! let mut advisor = Advisor::for_landscape(&scaled).unwrap();
//! let all = all_combinations();
//!
//! for _ in 0..5 {
//!     let suggestion = advisor.sample_suggestion_low_level(&all, &mut rng).unwrap();
//!     let value = scaled.suggestion_value_in_percentage(&suggestion);
//!     assert!((0.0..=100.0).contains(&value));
//!
//!     let combination = landscape.random_combination(&mut rng);
//!     let selection = scaled.selection_with_noisy_reward(combination, &mut rng);
//!     advisor.update_with_selection(selection).unwrap();
//! }
//! assert_eq!(advisor.selections().len(), 5);
//! ```

mod advisor;
mod combination;
pub mod config;
mod error;
mod landscape;
mod regression;
pub mod simulation;
mod suggestion;
mod synthesis;

pub use advisor::{Advisor, Granularity, stable_softmax};
pub use combination::{
    BLOCK_SIZE, Combination, HighLevelCombination, NUM_BLOCKS, NUM_COEFFICIENTS,
    NUM_COMBINATIONS, NUM_FEATURES, all_block_settings, all_combinations,
};
pub use config::{AdvisorConfig, LandscapeConfig, SynthesisConfig};
pub use error::{AdvisorError, Result};
pub use landscape::{Landscape, LandscapeRecord, ScaledLandscape, Selection};
pub use suggestion::{
    BlockSetting, HighLevelSuggestion, LowLevelSuggestion, Suggestion, SuggestionValues,
    all_high_level_suggestions, all_low_level_suggestions,
};
pub use synthesis::{generate_random_landscape, generate_random_landscape_with_config};

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use combo_advisor::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Advisor, AdvisorError, Combination, Granularity, HighLevelSuggestion, Landscape,
        LowLevelSuggestion, Result, ScaledLandscape, Selection, Suggestion,
        all_combinations, all_high_level_suggestions, all_low_level_suggestions,
        generate_random_landscape,
    };
}
