//! Property tests for cost estimation.

use proptest::prelude::*;

use pal::domain::services::{ModelPricing, PricingTable};

fn model_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("gpt-4".to_string()),
        Just("gpt-4o-mini".to_string()),
        Just("claude-3-haiku".to_string()),
        "[a-z0-9-]{1,20}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a missing token count means no cost, never a zero cost.
    #[test]
    fn property_missing_tokens_give_no_cost(
        model in model_name(),
        tokens in proptest::option::of(0u32..1_000_000),
    ) {
        let table = PricingTable::default();
        prop_assert_eq!(table.estimate_cost(&model, None, tokens), None);
        prop_assert_eq!(table.estimate_cost(&model, tokens, None), None);
    }

    /// PROPERTY: cost is non-negative and grows with output tokens.
    #[test]
    fn property_cost_is_monotonic(
        input in 0u32..100_000,
        output in 0u32..100_000,
        extra in 1u32..10_000,
    ) {
        let pricing = ModelPricing::new(0.01, 0.03);
        let base = pricing.estimate_cost(input, output);
        prop_assert!(base >= 0.0);
        prop_assert!(pricing.estimate_cost(input, output + extra) > base);
    }

    /// PROPERTY: an entry only prices models that start with its name.
    #[test]
    fn property_unknown_prefix_is_unpriced(suffix in "[a-z]{1,12}") {
        let table = PricingTable::empty().with_model("acme-large", ModelPricing::new(1.0, 1.0));
        let known = format!("acme-large-{suffix}");
        prop_assert!(table.estimate_cost(&known, Some(1), Some(1)).is_some());
        prop_assert_eq!(table.estimate_cost(&format!("zz-{suffix}"), Some(1), Some(1)), None);
    }
}
