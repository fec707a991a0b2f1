//! The combination space: eight ±1 features grouped into four blocks of two.

use std::fmt;

use crate::error::{AdvisorError, Result};

/// Number of raw (low-level) features in a combination.
pub const NUM_FEATURES: usize = 8;
/// Number of blocks; each block contributes one high-level feature.
pub const NUM_BLOCKS: usize = 4;
/// Number of raw features per block.
pub const BLOCK_SIZE: usize = 2;
/// Total number of regression features (raw followed by high-level).
pub const NUM_COEFFICIENTS: usize = NUM_FEATURES + NUM_BLOCKS;
/// Size of the full combination space.
pub const NUM_COMBINATIONS: usize = 1 << NUM_FEATURES;

fn is_unit(value: i8) -> bool {
    value == 1 || value == -1
}

/// A full setting of all eight raw features.
///
/// Every value is `-1` or `+1`, checked once at construction. Block access
/// is crate-internal, so an unchecked block index cannot reach it:
///
/// ```compile_fail
/// let combination = combo_advisor::Combination::new([1; 8]).unwrap();
/// let _ = combination.block(4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination([i8; NUM_FEATURES]);

impl Combination {
    /// Creates a combination, rejecting any value other than -1 or +1.
    pub fn new(values: [i8; NUM_FEATURES]) -> Result<Self> {
        if let Some(position) = values.iter().position(|&v| !is_unit(v)) {
            return Err(AdvisorError::InvalidCombination {
                message: format!(
                    "value {} at position {position} is not -1 or +1",
                    values[position]
                ),
            });
        }
        Ok(Self(values))
    }

    /// Raw feature values.
    pub fn values(&self) -> &[i8; NUM_FEATURES] {
        &self.0
    }

    /// Raw values of block `block` (features `2 * block` and `2 * block + 1`).
    ///
    /// Callers pass an index already checked by [`check_block`].
    pub(crate) fn block(&self, block: usize) -> [i8; BLOCK_SIZE] {
        [self.0[BLOCK_SIZE * block], self.0[BLOCK_SIZE * block + 1]]
    }

    /// Block-level products of the raw features.
    pub fn high_level(&self) -> HighLevelCombination {
        let mut high = [0i8; NUM_BLOCKS];
        for (block, value) in high.iter_mut().enumerate() {
            let [a, b] = self.block(block);
            *value = a * b;
        }
        HighLevelCombination(high)
    }

    /// Regression features: the eight raw values followed by the four block products.
    pub fn features(&self) -> [f64; NUM_COEFFICIENTS] {
        let mut features = [0.0; NUM_COEFFICIENTS];
        for (i, &value) in self.0.iter().enumerate() {
            features[i] = f64::from(value);
        }
        for (i, &value) in self.high_level().values().iter().enumerate() {
            features[NUM_FEATURES + i] = f64::from(value);
        }
        features
    }
}

impl TryFrom<&[i8]> for Combination {
    type Error = AdvisorError;

    fn try_from(values: &[i8]) -> Result<Self> {
        let array: [i8; NUM_FEATURES] =
            values
                .try_into()
                .map_err(|_| AdvisorError::DimensionMismatch {
                    expected: NUM_FEATURES,
                    got: values.len(),
                })?;
        Self::new(array)
    }
}

impl TryFrom<Vec<i8>> for Combination {
    type Error = AdvisorError;

    fn try_from(values: Vec<i8>) -> Result<Self> {
        Self::try_from(values.as_slice())
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// The four block products of a combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HighLevelCombination([i8; NUM_BLOCKS]);

impl HighLevelCombination {
    /// Creates a high-level combination, rejecting any value other than -1 or +1.
    pub fn new(values: [i8; NUM_BLOCKS]) -> Result<Self> {
        if let Some(position) = values.iter().position(|&v| !is_unit(v)) {
            return Err(AdvisorError::InvalidCombination {
                message: format!(
                    "high-level value {} at block {position} is not -1 or +1",
                    values[position]
                ),
            });
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[i8; NUM_BLOCKS] {
        &self.0
    }

    /// The `index`-th high-level combination in product order.
    pub(crate) fn from_unit_index(index: usize) -> Self {
        Self(unit_values::<NUM_BLOCKS>(index))
    }
}

impl fmt::Display for HighLevelCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Decodes `index` (0..2^n) into n ±1 values, most significant bit first.
pub(crate) fn unit_values<const N: usize>(index: usize) -> [i8; N] {
    let mut values = [-1i8; N];
    for (i, value) in values.iter_mut().enumerate() {
        if (index >> (N - 1 - i)) & 1 == 1 {
            *value = 1;
        }
    }
    values
}

/// All 256 combinations, in product order over `[-1, +1]` (first feature varies slowest).
pub fn all_combinations() -> Vec<Combination> {
    (0..NUM_COMBINATIONS)
        .map(|index| Combination(unit_values::<NUM_FEATURES>(index)))
        .collect()
}

/// All four settings of a single block, in product order.
pub fn all_block_settings() -> [[i8; BLOCK_SIZE]; 4] {
    [[-1, -1], [-1, 1], [1, -1], [1, 1]]
}

pub(crate) fn check_block(block: usize) -> Result<()> {
    if block >= NUM_BLOCKS {
        return Err(AdvisorError::InvalidBlock {
            message: format!("block {block} is out of range 0..{NUM_BLOCKS}"),
        });
    }
    Ok(())
}

/// Validates a pair of distinct block indices.
pub(crate) fn check_block_pair(block_nr1: usize, block_nr2: usize) -> Result<()> {
    check_block(block_nr1)?;
    check_block(block_nr2)?;
    if block_nr1 == block_nr2 {
        return Err(AdvisorError::InvalidBlock {
            message: format!("block numbers must differ, both are {block_nr1}"),
        });
    }
    Ok(())
}
