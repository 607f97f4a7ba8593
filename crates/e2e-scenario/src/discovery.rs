//! Variation discovery
//!
//! Breadth-first walk over mocked states. Each queue item is a partial
//! description plus the state discovery believes it leads to. The step at
//! position `description.len()` is built from that state and asked for its
//! variations; each one extends the description and either completes it or
//! goes back on the queue with its own cloned state.
//!
//! The result is the cross product of every step's variation count, minus
//! pruned branches. Long pipelines with generous steps grow fast; use
//! [`RunnerConfig::max_scenarios`] to bound it.

use crate::config::RunnerConfig;
use crate::error::DiscoveryError;
use crate::panic_capture;
use crate::state::ScenarioState;
use crate::step::StepFactory;
use crate::variation::{Discovery, ScenarioDescription};
use std::collections::VecDeque;

struct Pending {
    description: ScenarioDescription,
    state: ScenarioState,
}

/// Enumerate every scenario `steps` can produce, with default configuration
///
/// # Errors
/// Returns [`DiscoveryError::StepPanicked`] if a factory or
/// `mock_variations` panics
pub fn calculate_scenario_variations(steps: &[StepFactory]) -> Result<Vec<ScenarioDescription>, DiscoveryError> {
    calculate_scenario_variations_with(steps, &RunnerConfig::default())
}

/// Enumerate every scenario `steps` can produce
///
/// Zero steps produce zero scenarios. Branches whose step reports no
/// variations, or reports [`Discovery::Impossible`], end silently.
///
/// # Errors
/// Returns [`DiscoveryError::StepPanicked`] if a factory or
/// `mock_variations` panics, or [`DiscoveryError::TooManyScenarios`] once
/// the configured cap is exceeded
pub fn calculate_scenario_variations_with(
    steps: &[StepFactory],
    config: &RunnerConfig,
) -> Result<Vec<ScenarioDescription>, DiscoveryError> {
    if steps.is_empty() {
        return Ok(Vec::new());
    }

    tracing::debug!(steps = steps.len(), "discovering scenario variations");

    let mut complete = Vec::new();
    let mut pruned = 0usize;
    let mut queue = VecDeque::from([Pending {
        description: ScenarioDescription::new(),
        state: ScenarioState::new(""),
    }]);

    while let Some(item) = queue.pop_front() {
        let index = item.description.len();
        let discovery = mock_step(&steps[index], index, &item.state)?;

        let variations = match discovery {
            Discovery::Impossible(reason) => {
                tracing::debug!(prefix = %item.state.name(), step = index, %reason, "branch pruned");
                pruned += 1;
                continue;
            }
            Discovery::Variations(variations) if variations.is_empty() => {
                tracing::debug!(prefix = %item.state.name(), step = index, "branch pruned: no variations");
                pruned += 1;
                continue;
            }
            Discovery::Variations(variations) => variations,
        };

        for mocked in variations {
            let description = item.description.with(mocked.variation);

            if description.len() == steps.len() {
                complete.push(description);
                if let Some(limit) = config.max_scenarios {
                    if complete.len() > limit {
                        return Err(DiscoveryError::TooManyScenarios { limit });
                    }
                }
            } else {
                let name = description.render(&config.separator);
                queue.push_back(Pending {
                    description,
                    state: mocked.state.with_name(name),
                });
            }
        }
    }

    tracing::info!(scenarios = complete.len(), pruned, "scenario discovery complete");
    Ok(complete)
}

fn mock_step(factory: &StepFactory, index: usize, state: &ScenarioState) -> Result<Discovery, DiscoveryError> {
    let step = panic_capture::catch(|| factory(state)).map_err(|panic| {
        tracing::error!(step = index, message = %panic.message, "step factory panicked during discovery");
        DiscoveryError::StepPanicked {
            index,
            step: format!("step #{index}"),
            message: panic.message,
        }
    })?;

    panic_capture::catch(|| step.mock_variations(state)).map_err(|panic| {
        tracing::error!(step = index, name = step.name(), message = %panic.message, "mock_variations panicked");
        DiscoveryError::StepPanicked {
            index,
            step: step.name().to_string(),
            message: panic.message,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{fixed_step, step_factory, ChoiceStep, FnStep};
    use crate::variation::{MockedVariation, ScenarioVariation};

    fn labels(descriptions: &[ScenarioDescription]) -> Vec<String> {
        descriptions.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn zero_steps_zero_scenarios() {
        assert!(calculate_scenario_variations(&[]).unwrap().is_empty());
    }

    #[test]
    fn cross_product_in_bfs_order() {
        let steps = [
            fixed_step(ChoiceStep::labels("color", ["Red", "Blue"])),
            fixed_step(ChoiceStep::labels("size", ["Small", "Large"])),
        ];

        let found = calculate_scenario_variations(&steps).unwrap();
        assert_eq!(labels(&found), ["Red-Small", "Red-Large", "Blue-Small", "Blue-Large"]);
    }

    #[test]
    fn factory_sees_mocked_state() {
        let steps = [
            fixed_step(ChoiceStep::labels("color", ["Red", "Blue"])),
            step_factory(|state: &ScenarioState| {
                let blue = state.custom::<String>("color").is_some_and(|c| c == "Blue");
                if blue {
                    ChoiceStep::labels("size", ["Small"])
                } else {
                    ChoiceStep::labels("size", ["Small", "Large"])
                }
            }),
        ];

        let found = calculate_scenario_variations(&steps).unwrap();
        assert_eq!(labels(&found), ["Red-Small", "Red-Large", "Blue-Small"]);
    }

    #[test]
    fn impossible_prunes_branch() {
        let steps = [
            fixed_step(ChoiceStep::labels("from", ["Local", "Blob"])),
            step_factory(|state: &ScenarioState| {
                let from_local = state.custom::<String>("from").is_some_and(|f| f == "Local");
                FnStep::new("to").with_mock(move |state| {
                    if from_local {
                        return Discovery::impossible("local to local");
                    }
                    Discovery::single(ScenarioVariation::new("Local"), state.clone())
                })
            }),
        ];

        let found = calculate_scenario_variations(&steps).unwrap();
        assert_eq!(labels(&found), ["Blob-Local"]);
    }

    #[test]
    fn queued_states_are_named_after_prefix() {
        let steps = [
            fixed_step(ChoiceStep::labels("color", ["Red"])),
            fixed_step(FnStep::new("check-name").with_mock(|state| {
                assert_eq!(state.name(), "Red");
                Discovery::single(ScenarioVariation::hidden("checked"), state.clone())
            })),
        ];

        let found = calculate_scenario_variations(&steps).unwrap();
        assert_eq!(labels(&found), ["Red"]);
        assert_eq!(found[0].len(), 2);
    }

    #[test]
    fn panicking_mock_is_attributed() {
        let steps = [
            fixed_step(ChoiceStep::labels("color", ["Red"])),
            fixed_step(FnStep::new("exploding").with_mock(|_| panic!("no variations today"))),
        ];

        let err = calculate_scenario_variations(&steps).unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::StepPanicked {
                index: 1,
                step: "exploding".to_string(),
                message: "no variations today".to_string(),
            }
        );
    }

    #[test]
    fn panicking_factory_is_attributed_by_position() {
        let steps: [StepFactory; 1] = [std::sync::Arc::new(|_: &ScenarioState| -> Box<dyn crate::ScenarioStep> {
            panic!("factory failed")
        })];

        let err = calculate_scenario_variations(&steps).unwrap_err();
        assert!(matches!(err, DiscoveryError::StepPanicked { index: 0, ref step, .. } if step == "step #0"));
    }

    #[test]
    fn cap_stops_discovery() {
        let steps = [
            fixed_step(ChoiceStep::labels("a", ["1", "2", "3"])),
            fixed_step(ChoiceStep::labels("b", ["1", "2", "3"])),
        ];
        let config = RunnerConfig::new().with_max_scenarios(4);

        let err = calculate_scenario_variations_with(&steps, &config).unwrap_err();
        assert_eq!(err, DiscoveryError::TooManyScenarios { limit: 4 });

        let config = RunnerConfig::new().with_max_scenarios(9);
        assert_eq!(calculate_scenario_variations_with(&steps, &config).unwrap().len(), 9);
    }

    #[test]
    fn sibling_states_are_isolated() {
        let steps = [
            fixed_step(FnStep::new("fork").with_mock(|state| {
                let base = state.clone().with_custom("shared", 0u32);
                let mut left = base.clone();
                left.set_custom("shared", 1u32);
                vec![
                    MockedVariation::new(ScenarioVariation::new("L"), left),
                    MockedVariation::new(ScenarioVariation::new("R"), base),
                ]
                .into()
            })),
            fixed_step(FnStep::new("check").with_mock(|state| {
                let expected = if state.name() == "L" { 1 } else { 0 };
                assert_eq!(state.custom::<u32>("shared"), Some(&expected));
                Discovery::single(ScenarioVariation::hidden("check"), state.clone())
            })),
        ];

        assert_eq!(calculate_scenario_variations(&steps).unwrap().len(), 2);
    }
}
