//! Property tests for advisor and landscape invariants

use combo_advisor::prelude::*;
use combo_advisor::stable_softmax;
use proptest::prelude::*;

fn unit_value() -> impl Strategy<Value = i8> {
    prop_oneof![Just(-1i8), Just(1i8)]
}

fn block_pair() -> impl Strategy<Value = (usize, usize)> {
    (0usize..4, 0usize..4).prop_filter("blocks must differ", |(a, b)| a != b)
}

proptest! {
    #[test]
    fn softmax_is_a_distribution(
        values in prop::collection::vec(-1e6f64..1e6, 1..300),
        temperature in 0.1f64..10.0,
    ) {
        let probabilities = stable_softmax(&values, temperature);
        prop_assert_eq!(probabilities.len(), values.len());
        prop_assert!(probabilities.iter().all(|p| p.is_finite() && *p >= 0.0));
        let total: f64 = probabilities.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn combination_accepts_only_unit_values(values in prop::collection::vec(-2i8..=2, 0..10)) {
        let valid = values.len() == 8 && values.iter().all(|v| *v == 1 || *v == -1);
        prop_assert_eq!(Combination::try_from(values).is_ok(), valid);
    }

    #[test]
    fn each_combination_matches_one_suggestion_per_granularity(
        values in prop::array::uniform8(unit_value()),
        (block_nr1, block_nr2) in block_pair(),
    ) {
        let combination = Combination::new(values).unwrap();
        let high = all_high_level_suggestions();
        let low = all_low_level_suggestions(block_nr1, block_nr2).unwrap();

        let high_matches = high.iter().filter(|s| s.is_matching_combination(&combination)).count();
        let low_matches = low.iter().filter(|s| s.is_matching_combination(&combination)).count();
        prop_assert_eq!(high_matches, 1);
        prop_assert_eq!(low_matches, 1);

        let advisor = Advisor::new(block_nr1, block_nr2).unwrap();
        prop_assert!(advisor.matching_suggestion(Granularity::High, &combination).is_ok());
        prop_assert!(advisor.matching_suggestion(Granularity::Low, &combination).is_ok());
    }

    #[test]
    fn non_noisy_rewards_stay_in_range(
        coefficients_low in prop::array::uniform8(-1.0f64..1.0),
        coefficients_high in prop::array::uniform4(-1.0f64..1.0),
        (block_nr1, block_nr2) in block_pair(),
        min_reward in 20i64..70,
    ) {
        let landscape =
            Landscape::new(coefficients_low, coefficients_high, block_nr1, block_nr2, 0).unwrap();
        // Landscapes with no negative reward cannot be scaled.
        prop_assume!(landscape.unscaled_rewards().iter().any(|r| *r < 0.0));

        let scaled = landscape.init_scaled_rewards_with_min_reward(min_reward as f64).unwrap();
        for combination in landscape.combinations() {
            let reward = scaled.selection_with_non_noisy_reward(*combination).reward();
            prop_assert!(reward >= scaled.min_reward() && reward <= scaled.max_reward());
        }
        let high = all_high_level_suggestions();
        let low = all_low_level_suggestions(block_nr1, block_nr2).unwrap();
        for suggestion in high.iter().chain(low.iter()) {
            let percentage = scaled.suggestion_value_in_percentage(suggestion);
            prop_assert!((0.0..=100.0).contains(&percentage));
        }
    }
}
