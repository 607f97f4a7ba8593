use e2e_scenario::prelude::*;
use e2e_scenario::{calculate_scenario_variations, ScenarioDescription};
use proptest::prelude::*;
use std::collections::HashSet;

fn choice(index: usize, count: usize) -> StepFactory {
    let labels: Vec<String> = (0..count).map(|v| format!("s{index}v{v}")).collect();
    fixed_step(ChoiceStep::labels(format!("step{index}"), labels))
}

fn rendered(descriptions: &[ScenarioDescription]) -> Vec<String> {
    descriptions.iter().map(ToString::to_string).collect()
}

proptest! {
    #[test]
    fn prop_count_is_product_of_variation_counts(counts in proptest::collection::vec(1..4usize, 1..5)) {
        let steps: Vec<_> = counts.iter().enumerate().map(|(i, k)| choice(i, *k)).collect();

        let found = calculate_scenario_variations(&steps).unwrap();

        prop_assert_eq!(found.len(), counts.iter().product::<usize>());
        prop_assert!(found.iter().all(|d| d.len() == steps.len()));

        let unique: HashSet<_> = rendered(&found).into_iter().collect();
        prop_assert_eq!(unique.len(), found.len());
    }

    #[test]
    fn prop_single_variation_steps_yield_one_description(n in 1..8usize) {
        let steps: Vec<_> = (0..n).map(|i| choice(i, 1)).collect();

        let found = calculate_scenario_variations(&steps).unwrap();

        prop_assert_eq!(found.len(), 1);
        prop_assert_eq!(found[0].len(), n);
    }

    #[test]
    fn prop_zero_variations_prune_every_branch_through_them(
        counts in proptest::collection::vec(1..4usize, 1..4),
        dead in 0..4usize,
    ) {
        let dead = dead % counts.len();
        let steps: Vec<_> = counts
            .iter()
            .enumerate()
            .map(|(i, k)| if i == dead { choice(i, 0) } else { choice(i, *k) })
            .collect();

        prop_assert!(calculate_scenario_variations(&steps).unwrap().is_empty());
    }

    #[test]
    fn prop_pruning_one_label_removes_only_its_branches(first in 2..5usize, second in 1..4usize) {
        // The second step offers nothing after the first step's first label.
        let blocked = "s0v0".to_string();
        let steps = vec![
            choice(0, first),
            step_factory(move |state: &ScenarioState| {
                let count = if state.custom::<String>("step0") == Some(&blocked) { 0 } else { second };
                let labels: Vec<String> = (0..count).map(|v| format!("s1v{v}")).collect();
                ChoiceStep::labels("step1", labels)
            }),
        ];

        let found = calculate_scenario_variations(&steps).unwrap();

        prop_assert_eq!(found.len(), (first - 1) * second);
        prop_assert!(rendered(&found).iter().all(|name| !name.starts_with("s0v0")));
    }
}

#[test]
fn test_sibling_custom_maps_are_independent() {
    let steps = vec![
        fixed_step(FnStep::new("fork").with_mock(|state| {
            let base = state.clone().with_custom("tag", "base");
            let mut mutated = base.clone();
            mutated.set_custom("tag", "mutated");
            mutated.set_custom("extra", 1u8);
            vec![
                MockedVariation::new(ScenarioVariation::new("mutated"), mutated),
                MockedVariation::new(ScenarioVariation::new("base"), base),
            ]
            .into()
        })),
        fixed_step(FnStep::new("observe").with_mock(|state| {
            let label = match (state.name(), state.custom::<&str>("tag"), state.has_custom("extra")) {
                ("mutated", Some(&"mutated"), true) | ("base", Some(&"base"), false) => "consistent",
                _ => "leaked",
            };
            Discovery::single(ScenarioVariation::new(label), state.clone())
        })),
    ];

    let found = calculate_scenario_variations(&steps).unwrap();

    pretty_assertions::assert_eq!(rendered(&found), ["mutated-consistent", "base-consistent"]);
}

#[test]
fn test_hidden_variations_do_not_name_scenarios() {
    let steps = vec![
        fixed_step(ChoiceStep::labels("color", ["Red"])),
        fixed_step(FnStep::new("setup")),
        fixed_step(ChoiceStep::labels("size", ["Small"])),
    ];

    let found = calculate_scenario_variations(&steps).unwrap();

    assert_eq!(rendered(&found), ["Red-Small"]);
    assert_eq!(found[0].len(), 3);
}
