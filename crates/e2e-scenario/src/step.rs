//! Scenario steps and step factories
//!
//! A [`ScenarioStep`] has two capabilities:
//! - **Discovery**: report which variations it could take from a state and
//!   what each would produce, without side effects
//! - **Execution**: perform one previously reported variation for real
//!
//! Pipelines are written as [`StepFactory`] lists. The factory is invoked
//! with the state accumulated so far, once per discovery branch and once per
//! scenario during the real pass, so step construction must be cheap.

use crate::asserter::Asserter;
use crate::error::StepError;
use crate::state::ScenarioState;
use crate::variation::{Discovery, MockedVariation, ScenarioVariation};
use std::any::Any;
use std::sync::Arc;

/// Result of running one step
pub type StepResult = Result<ScenarioState, StepError>;

/// A pipeline stage with a discovery pass and a real pass
pub trait ScenarioStep {
    /// Name used when attributing failures to this step
    fn name(&self) -> &str;

    /// Every variation this step could produce from `state`, each with the
    /// state that taking it would yield
    ///
    /// Must not touch anything outside the returned states. Returning no
    /// variations, or [`Discovery::Impossible`], prunes the branch.
    fn mock_variations(&self, state: &ScenarioState) -> Discovery;

    /// Perform `variation` for real and return the next state
    ///
    /// # Errors
    /// Returns [`StepError::Fatal`] or [`StepError::Skipped`] to stop the
    /// scenario; soft failures go through the asserter instead
    fn run(&self, asserter: &mut dyn Asserter, state: ScenarioState, variation: &ScenarioVariation) -> StepResult;
}

/// Builds a step bound to the state accumulated so far
pub type StepFactory = Arc<dyn Fn(&ScenarioState) -> Box<dyn ScenarioStep> + Send + Sync>;

/// Wrap a closure as a [`StepFactory`]
pub fn step_factory<F, S>(build: F) -> StepFactory
where
    F: Fn(&ScenarioState) -> S + Send + Sync + 'static,
    S: ScenarioStep + 'static,
{
    Arc::new(move |state: &ScenarioState| Box::new(build(state)) as Box<dyn ScenarioStep>)
}

/// Factory for a step that does not depend on prior state
pub fn fixed_step<S>(step: S) -> StepFactory
where
    S: ScenarioStep + Clone + Send + Sync + 'static,
{
    step_factory(move |_| step.clone())
}

type MockFn = Arc<dyn Fn(&ScenarioState) -> Discovery + Send + Sync>;
type RunFn = Arc<dyn Fn(&mut dyn Asserter, ScenarioState, &ScenarioVariation) -> StepResult + Send + Sync>;

/// Closure-backed step
///
/// Without a mock closure the step offers one hidden variation; without a
/// run closure it passes the state through unchanged.
///
/// # Example
///
/// ```rust
/// use e2e_scenario::{FnStep, MockedVariation, ScenarioVariation};
///
/// let step = FnStep::new("color").with_mock(|state| {
///     ["Red", "Blue"]
///         .into_iter()
///         .map(|color| {
///             let next = state.clone().with_custom("color", color);
///             MockedVariation::new(ScenarioVariation::new(color), next)
///         })
///         .collect::<Vec<_>>()
///         .into()
/// });
/// # let _ = step;
/// ```
#[derive(Clone)]
pub struct FnStep {
    name: String,
    mock: Option<MockFn>,
    run: Option<RunFn>,
}

impl FnStep {
    /// Create a pass-through step
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mock: None,
            run: None,
        }
    }

    /// With a discovery closure
    #[must_use]
    pub fn with_mock<F>(mut self, mock: F) -> Self
    where
        F: Fn(&ScenarioState) -> Discovery + Send + Sync + 'static,
    {
        self.mock = Some(Arc::new(mock));
        self
    }

    /// With an execution closure
    #[must_use]
    pub fn with_run<F>(mut self, run: F) -> Self
    where
        F: Fn(&mut dyn Asserter, ScenarioState, &ScenarioVariation) -> StepResult + Send + Sync + 'static,
    {
        self.run = Some(Arc::new(run));
        self
    }
}

impl ScenarioStep for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn mock_variations(&self, state: &ScenarioState) -> Discovery {
        match &self.mock {
            Some(mock) => mock(state),
            None => Discovery::single(ScenarioVariation::hidden(self.name.clone()), state.clone()),
        }
    }

    fn run(&self, asserter: &mut dyn Asserter, state: ScenarioState, variation: &ScenarioVariation) -> StepResult {
        match &self.run {
            Some(run) => run(asserter, state, variation),
            None => Ok(state),
        }
    }
}

impl std::fmt::Debug for FnStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("mock", &self.mock.is_some())
            .field("run", &self.run.is_some())
            .finish()
    }
}

/// Step choosing one of several named values and storing it as custom state
///
/// Discovery and execution both write the chosen value under `key`, so later
/// steps see the same value in either pass.
#[derive(Debug, Clone)]
pub struct ChoiceStep<V> {
    key: String,
    options: Vec<(String, V)>,
    display: bool,
}

impl<V: Any + Clone + Send + Sync> ChoiceStep<V> {
    /// Choose among `options`, storing the pick under `key`
    pub fn new<N, I>(key: impl Into<String>, options: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, V)>,
    {
        Self {
            key: key.into(),
            options: options.into_iter().map(|(n, v)| (n.into(), v)).collect(),
            display: true,
        }
    }

    /// Keep the chosen label out of sub-test names
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.display = false;
        self
    }

    fn variation(&self, label: &str) -> ScenarioVariation {
        if self.display {
            ScenarioVariation::new(label)
        } else {
            ScenarioVariation::hidden(label)
        }
    }
}

impl ChoiceStep<String> {
    /// Choose among plain labels, storing the label itself
    pub fn labels<I, N>(key: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self::new(
            key,
            labels.into_iter().map(|label| {
                let label = label.into();
                (label.clone(), label)
            }),
        )
    }
}

impl<V: Any + Clone + Send + Sync> ScenarioStep for ChoiceStep<V> {
    fn name(&self) -> &str {
        &self.key
    }

    fn mock_variations(&self, state: &ScenarioState) -> Discovery {
        self.options
            .iter()
            .map(|(label, value)| {
                let next = state.clone().with_custom(self.key.clone(), value.clone());
                MockedVariation::new(self.variation(label), next)
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn run(&self, asserter: &mut dyn Asserter, mut state: ScenarioState, variation: &ScenarioVariation) -> StepResult {
        let Some((_, value)) = self.options.iter().find(|(label, _)| label == variation.name()) else {
            return Err(asserter.error(&format!("{} has no option named {}", self.key, variation.name())));
        };

        state.set_custom(self.key.clone(), value.clone());
        Ok(state)
    }
}
