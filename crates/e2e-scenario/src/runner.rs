//! Scenario pipeline execution
//!
//! Discovery runs first; each resulting description then becomes an
//! independently named sub-test. Within a sub-test the steps run strictly in
//! order, each rebuilt from its factory against the real state accumulated so
//! far. Sub-tests may run concurrently on a rayon pool since their states are
//! never shared.

use crate::asserter::{Asserter, ScenarioAsserter};
use crate::config::{PipelineOptions, RunnerConfig};
use crate::discovery::calculate_scenario_variations_with;
use crate::error::{ConfigError, DiscoveryError, ScenarioError, StepError};
use crate::panic_capture;
use crate::report::{PipelineReport, ScenarioOutcome, ScenarioResult};
use crate::state::ScenarioState;
use crate::step::StepFactory;
use crate::variation::ScenarioDescription;
use rayon::prelude::*;
use std::collections::HashSet;
use std::time::Instant;

/// Parent test a pipeline runs under
#[derive(Debug, Clone)]
pub struct TestContext {
    name: String,
    config: RunnerConfig,
}

impl TestContext {
    /// Context with default configuration
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: RunnerConfig::default(),
        }
    }

    /// Context configured from `E2E_*` environment variables
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] on an unparsable variable
    pub fn from_env(name: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::new(name).with_config(RunnerConfig::from_env()?))
    }

    /// With explicit configuration
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Parent test name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runner configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

/// Discover every scenario of `steps` and run each as a sub-test of `ctx`
///
/// Scenario failures are collected into the returned report; call
/// [`PipelineReport::assert_all_passed`] to fail the parent test.
///
/// # Errors
/// Returns a [`DiscoveryError`] if discovery fails, in which case no
/// scenario has run
pub fn run_scenario_pipeline(
    ctx: &TestContext,
    steps: &[StepFactory],
    options: PipelineOptions,
) -> Result<PipelineReport, DiscoveryError> {
    let config = ctx.config();
    let descriptions = calculate_scenario_variations_with(steps, config)?;
    warn_on_duplicate_names(ctx, &descriptions);

    let parallel = should_parallelize(config, options);
    tracing::info!(
        test = %ctx.name(),
        scenarios = descriptions.len(),
        parallel,
        "running scenario pipeline"
    );

    let results = if parallel {
        run_parallel(ctx, steps, &descriptions)
    } else {
        descriptions
            .iter()
            .enumerate()
            .map(|(index, description)| run_scenario(ctx, steps, description, index))
            .collect::<Vec<_>>()
    };

    let report = PipelineReport::new(ctx.name(), results);
    tracing::info!(
        test = %ctx.name(),
        scenarios = report.len(),
        failed = report.failures().len(),
        "scenario pipeline finished"
    );
    Ok(report)
}

/// Run `steps` under a context configured from `E2E_*` environment variables
///
/// # Errors
/// Returns [`ScenarioError::Config`] on an unparsable variable, or
/// [`ScenarioError::Discovery`] if discovery fails
pub fn run_pipeline_from_env(
    test_name: &str,
    steps: &[StepFactory],
    options: PipelineOptions,
) -> Result<PipelineReport, ScenarioError> {
    let ctx = TestContext::from_env(test_name)?;
    Ok(run_scenario_pipeline(&ctx, steps, options)?)
}

fn should_parallelize(config: &RunnerConfig, options: PipelineOptions) -> bool {
    let requested = options.parallelized.unwrap_or(config.parallelized);
    if requested && config.detect_debugger && debugger_attached() {
        tracing::info!("debugger attached, running scenarios serially");
        return false;
    }
    requested
}

fn run_parallel(ctx: &TestContext, steps: &[StepFactory], descriptions: &[ScenarioDescription]) -> Vec<ScenarioResult> {
    let run_all = || {
        descriptions
            .par_iter()
            .enumerate()
            .map(|(index, description)| run_scenario(ctx, steps, description, index))
            .collect::<Vec<_>>()
    };

    let Some(threads) = ctx.config().worker_threads else {
        return run_all();
    };

    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(run_all),
        Err(err) => {
            tracing::warn!(threads, error = %err, "failed to build scenario pool, using the global pool");
            run_all()
        }
    }
}

fn warn_on_duplicate_names(ctx: &TestContext, descriptions: &[ScenarioDescription]) {
    let separator = &ctx.config().separator;
    let mut seen = HashSet::new();
    for description in descriptions {
        let label = description.render(separator);
        if !seen.insert(label.clone()) {
            tracing::warn!(test = %ctx.name(), %label, "two scenarios render to the same sub-test name");
        }
    }
}

/// Sub-test name for a description
///
/// Descriptions whose labels are all hidden fall back to their position.
#[must_use]
pub fn scenario_name(ctx: &TestContext, description: &ScenarioDescription, index: usize) -> String {
    let label = description.render(&ctx.config().separator);
    if label.is_empty() {
        format!("{}/scenario-{index}", ctx.name())
    } else {
        format!("{}/{label}", ctx.name())
    }
}

fn run_scenario(ctx: &TestContext, steps: &[StepFactory], description: &ScenarioDescription, index: usize) -> ScenarioResult {
    let name = scenario_name(ctx, description, index);
    let started = Instant::now();
    tracing::info!(scenario = %name, "scenario started");

    let mut asserter = ScenarioAsserter::new(name.clone());
    let separator = ctx.config().separator.as_str();

    let panicked = match panic_capture::catch(|| execute_steps(steps, description, &mut asserter, separator)) {
        Ok(Ok(())) => None,
        Ok(Err(StepError::Skipped(reason))) => {
            if asserter.skip_reason().is_none() {
                asserter.mark_skipped(reason);
            }
            None
        }
        Ok(Err(err)) => {
            if !asserter.failed() {
                asserter.fail(err.to_string());
            }
            None
        }
        Err(panic) => {
            tracing::error!(scenario = %name, message = %panic.message, "scenario panicked");
            Some(panic)
        }
    };

    asserter.run_cleanups();
    let cleanup = asserter.delete_tracked_resources();
    if cleanup.deleted > 0 {
        tracing::debug!(scenario = %name, deleted = cleanup.deleted, "deleted tracked resources");
    }

    let outcome = match panicked {
        Some(panic) => ScenarioOutcome::Panicked {
            message: panic.message,
            backtrace: panic.backtrace,
        },
        None => match (asserter.failure(), asserter.skip_reason()) {
            (Some(reason), _) => ScenarioOutcome::Failed(reason.to_string()),
            (None, Some(reason)) => ScenarioOutcome::Skipped(reason.to_string()),
            (None, None) => ScenarioOutcome::Passed,
        },
    };

    let duration = started.elapsed();
    if outcome.is_failure() {
        tracing::warn!(scenario = %name, ?duration, "scenario failed");
    } else {
        tracing::info!(scenario = %name, ?duration, outcome = outcome.label(), "scenario finished");
    }

    ScenarioResult {
        name,
        description: description.clone(),
        outcome,
        logs: asserter.into_logs(),
        duration,
    }
}

fn execute_steps(
    steps: &[StepFactory],
    description: &ScenarioDescription,
    asserter: &mut ScenarioAsserter,
    separator: &str,
) -> Result<(), StepError> {
    let mut state = ScenarioState::new("");

    for (index, (factory, variation)) in steps.iter().zip(description.iter()).enumerate() {
        if asserter.failed() {
            tracing::debug!(scenario = %asserter.test_name(), step = index, "stopping after failure");
            break;
        }

        state.set_name(description.render_prefix(index, separator));
        let step = factory(&state);
        tracing::trace!(scenario = %asserter.test_name(), step = step.name(), variation = variation.name(), "running step");
        state = step.run(asserter, state, variation)?;
    }

    Ok(())
}

/// True if a tracer such as a debugger is attached to this process
#[cfg(target_os = "linux")]
#[must_use]
pub fn debugger_attached() -> bool {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status
                .lines()
                .find_map(|line| line.strip_prefix("TracerPid:").map(|pid| pid.trim() != "0"))
        })
        .unwrap_or(false)
}

/// True if a tracer such as a debugger is attached to this process
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn debugger_attached() -> bool {
    false
}
