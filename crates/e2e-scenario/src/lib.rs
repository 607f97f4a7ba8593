//! E2E Scenario - variation discovery and pipeline execution
//!
//! Turns a short list of steps into every meaningful combination of their
//! choices and runs each combination as its own sub-test:
//! - Steps report their possible variations against a mocked state
//! - Discovery walks those reports breadth-first into complete descriptions
//! - The runner executes each description for real, optionally in parallel
//! - Created resources are tracked and torn down after each sub-test
//!
//! # Example
//!
//! ```rust
//! use e2e_scenario::prelude::*;
//!
//! let steps = [
//!     fixed_step(ChoiceStep::labels("color", ["Red", "Blue"])),
//!     fixed_step(ChoiceStep::labels("size", ["Small", "Large"])),
//! ];
//!
//! let ctx = TestContext::new("paint");
//! let report = run_scenario_pipeline(&ctx, &steps, PipelineOptions::default()).unwrap();
//!
//! assert_eq!(report.len(), 4);
//! report.assert_all_passed();
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod asserter;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod registry;
pub mod report;
pub mod runner;
pub mod state;
pub mod step;
pub mod tracker;
pub mod variation;

mod panic_capture;

pub use asserter::{Asserter, AsserterExt, Assertion, CleanupFn, Equal, IsTrue, Not, ScenarioAsserter};
pub use config::{PipelineOptions, RunnerConfig, DEFAULT_SEPARATOR};
pub use discovery::{calculate_scenario_variations, calculate_scenario_variations_with};
pub use error::{ConfigError, DiscoveryError, RegistryError, ResourceError, ScenarioError, StepError};
pub use logging::{init_logging, init_test_logging};
pub use registry::{Account, AccountKind, AccountRegistry, AccountRegistryBuilder};
pub use report::{PipelineReport, ScenarioOutcome, ScenarioResult};
pub use runner::{debugger_attached, run_pipeline_from_env, run_scenario_pipeline, scenario_name, TestContext};
pub use state::{Deletable, Resource, ResourceHandle, ScenarioState};
pub use step::{fixed_step, step_factory, ChoiceStep, FnStep, ScenarioStep, StepFactory, StepResult};
pub use tracker::{CleanupSummary, ResourceTracker};
pub use variation::{Discovery, MockedVariation, ScenarioDescription, ScenarioVariation};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing scenario pipelines
    pub use crate::{
        fixed_step, run_scenario_pipeline, step_factory, Asserter, AsserterExt, ChoiceStep, Discovery, Equal,
        FnStep, IsTrue, MockedVariation, Not, PipelineOptions, ScenarioState, ScenarioStep, ScenarioVariation,
        StepError, StepFactory, StepResult, TestContext,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
