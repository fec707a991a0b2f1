//! Partial advice over the combination space.
//!
//! A [`Suggestion`] fixes part of a combination, either at block level
//! ([`HighLevelSuggestion`]: the product of every block) or at raw-feature
//! level for two blocks ([`LowLevelSuggestion`]). For a fixed granularity (and
//! for low-level advice, a fixed block pair) the 16 enumerated suggestions
//! partition the 256 combinations: every combination matches exactly one.

use std::fmt;

use crate::combination::{
    BLOCK_SIZE, Combination, HighLevelCombination, NUM_BLOCKS, NUM_COEFFICIENTS, NUM_FEATURES,
    all_block_settings, all_combinations, check_block_pair,
};
use crate::error::{AdvisorError, Result};

/// Low-level (8) and high-level (4) projections of a suggestion; `None` marks
/// an entry the suggestion leaves open.
pub type SuggestionValues = ([Option<i8>; NUM_FEATURES], [Option<i8>; NUM_BLOCKS]);

/// Advice that fixes every block-level product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HighLevelSuggestion {
    high_level_combination: HighLevelCombination,
}

impl HighLevelSuggestion {
    pub fn new(high_level_combination: HighLevelCombination) -> Self {
        Self {
            high_level_combination,
        }
    }

    pub fn high_level_combination(&self) -> &HighLevelCombination {
        &self.high_level_combination
    }

    /// True when the combination's block products equal this suggestion.
    pub fn is_matching_combination(&self, combination: &Combination) -> bool {
        combination.high_level() == self.high_level_combination
    }

    pub fn suggestion_values(&self) -> SuggestionValues {
        let mut high = [None; NUM_BLOCKS];
        for (slot, &value) in high.iter_mut().zip(self.high_level_combination.values()) {
            *slot = Some(value);
        }
        ([None; NUM_FEATURES], high)
    }

    /// Expected reward under `coefficients`, using only the high-level terms.
    pub fn mean_reward(&self, coefficients: &[f64; NUM_COEFFICIENTS]) -> f64 {
        self.high_level_combination
            .values()
            .iter()
            .enumerate()
            .map(|(block, &value)| f64::from(value) * coefficients[NUM_FEATURES + block])
            .sum()
    }
}

impl fmt::Display for HighLevelSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "high-level: {}", self.high_level_combination)
    }
}

/// Raw values for one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockSetting {
    pub block: usize,
    pub values: [i8; BLOCK_SIZE],
}

impl BlockSetting {
    fn product(&self) -> i8 {
        self.values[0] * self.values[1]
    }
}

/// Advice that fixes the raw values of two blocks.
///
/// The two block settings are kept sorted by block index, so a suggestion
/// built as `(a, b, 0, 1)` is the same value as one built as `(b, a, 1, 0)` and
/// the derived `Hash` agrees with `Eq`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LowLevelSuggestion {
    settings: [BlockSetting; 2],
}

impl LowLevelSuggestion {
    /// Creates a suggestion fixing block `block_number1` to `values1` and block
    /// `block_number2` to `values2`.
    pub fn new(
        values1: [i8; BLOCK_SIZE],
        values2: [i8; BLOCK_SIZE],
        block_number1: usize,
        block_number2: usize,
    ) -> Result<Self> {
        check_block_pair(block_number1, block_number2)?;
        for value in values1.iter().chain(values2.iter()) {
            if *value != 1 && *value != -1 {
                return Err(AdvisorError::InvalidCombination {
                    message: format!("block value {value} is not -1 or +1"),
                });
            }
        }
        let mut settings = [
            BlockSetting {
                block: block_number1,
                values: values1,
            },
            BlockSetting {
                block: block_number2,
                values: values2,
            },
        ];
        settings.sort();
        Ok(Self { settings })
    }

    /// The two fixed blocks, ordered by block index.
    pub fn settings(&self) -> &[BlockSetting; 2] {
        &self.settings
    }

    pub fn is_matching_combination(&self, combination: &Combination) -> bool {
        self.settings
            .iter()
            .all(|setting| combination.block(setting.block) == setting.values)
    }

    /// Projections of the two fixed blocks; the high-level entries of those
    /// blocks carry the products of the fixed raw values.
    pub fn suggestion_values(&self) -> SuggestionValues {
        let mut low = [None; NUM_FEATURES];
        let mut high = [None; NUM_BLOCKS];
        for setting in &self.settings {
            for (offset, &value) in setting.values.iter().enumerate() {
                low[BLOCK_SIZE * setting.block + offset] = Some(value);
            }
            high[setting.block] = Some(setting.product());
        }
        (low, high)
    }

    pub fn mean_reward(&self, coefficients: &[f64; NUM_COEFFICIENTS]) -> f64 {
        self.settings
            .iter()
            .map(|setting| {
                let raw: f64 = setting
                    .values
                    .iter()
                    .enumerate()
                    .map(|(offset, &value)| {
                        f64::from(value) * coefficients[BLOCK_SIZE * setting.block + offset]
                    })
                    .sum();
                raw + f64::from(setting.product()) * coefficients[NUM_FEATURES + setting.block]
            })
            .sum()
    }
}

impl fmt::Display for LowLevelSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [first, second] = &self.settings;
        write!(
            f,
            "block 1: {}, low-level: {:?}, block 2: {}, low-level: {:?}",
            first.block, first.values, second.block, second.values
        )
    }
}

/// A suggestion at either granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Suggestion {
    HighLevel(HighLevelSuggestion),
    LowLevel(LowLevelSuggestion),
}

impl Suggestion {
    pub fn is_matching_combination(&self, combination: &Combination) -> bool {
        match self {
            Suggestion::HighLevel(s) => s.is_matching_combination(combination),
            Suggestion::LowLevel(s) => s.is_matching_combination(combination),
        }
    }

    pub fn suggestion_values(&self) -> SuggestionValues {
        match self {
            Suggestion::HighLevel(s) => s.suggestion_values(),
            Suggestion::LowLevel(s) => s.suggestion_values(),
        }
    }

    pub fn mean_reward(&self, coefficients: &[f64; NUM_COEFFICIENTS]) -> f64 {
        match self {
            Suggestion::HighLevel(s) => s.mean_reward(coefficients),
            Suggestion::LowLevel(s) => s.mean_reward(coefficients),
        }
    }

    /// Every combination this suggestion admits (16 for either granularity).
    pub fn all_matching_combinations(&self) -> Vec<Combination> {
        all_combinations()
            .into_iter()
            .filter(|combination| self.is_matching_combination(combination))
            .collect()
    }

    pub fn is_high_level(&self) -> bool {
        matches!(self, Suggestion::HighLevel(_))
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suggestion::HighLevel(s) => fmt::Display::fmt(s, f),
            Suggestion::LowLevel(s) => fmt::Display::fmt(s, f),
        }
    }
}

impl From<HighLevelSuggestion> for Suggestion {
    fn from(suggestion: HighLevelSuggestion) -> Self {
        Suggestion::HighLevel(suggestion)
    }
}

impl From<LowLevelSuggestion> for Suggestion {
    fn from(suggestion: LowLevelSuggestion) -> Self {
        Suggestion::LowLevel(suggestion)
    }
}

/// The 16 high-level suggestions, one per high-level combination.
pub fn all_high_level_suggestions() -> Vec<Suggestion> {
    (0..1 << NUM_BLOCKS)
        .map(|index| {
            let high = HighLevelCombination::from_unit_index(index);
            Suggestion::HighLevel(HighLevelSuggestion::new(high))
        })
        .collect()
}

/// The 16 low-level suggestions for blocks `block_nr1` and `block_nr2`.
pub fn all_low_level_suggestions(block_nr1: usize, block_nr2: usize) -> Result<Vec<Suggestion>> {
    check_block_pair(block_nr1, block_nr2)?;
    let settings = all_block_settings();
    let mut suggestions = Vec::with_capacity(settings.len() * settings.len());
    for values1 in settings {
        for values2 in settings {
            let suggestion = LowLevelSuggestion::new(values1, values2, block_nr1, block_nr2)?;
            suggestions.push(Suggestion::LowLevel(suggestion));
        }
    }
    Ok(suggestions)
}
