//! Testing utilities for the scenario workspace
//!
//! Shared fixture steps, named pipelines, a recording asserter and an
//! in-memory storage backend.

#![allow(missing_docs)]

pub mod mock_storage;

use e2e_scenario::{
    fixed_step, step_factory, Account, AccountKind, AccountRegistry, Assertion, Asserter, ChoiceStep, CleanupFn,
    RegistryError, ResourceHandle, RunnerConfig, StepError, StepFactory, TestContext,
};
use uuid::Uuid;

pub const COLOR_KEY: &str = "color";
pub const SIZE_KEY: &str = "size";

pub const STANDARD_ACCOUNT: &str = "standard";
pub const HNS_ACCOUNT: &str = "hns";
pub const PREMIUM_BLOB_ACCOUNT: &str = "premium-blob";

/// Accounts the built-in pipelines draw from
pub fn fixture_registry() -> Result<AccountRegistry, RegistryError> {
    AccountRegistry::builder()
        .account(Account::new(STANDARD_ACCOUNT, AccountKind::Standard).with_property("endpoint", "mem://standard"))
        .account(Account::new(HNS_ACCOUNT, AccountKind::HierarchicalNamespace).with_property("endpoint", "mem://hns"))
        .account(Account::new(PREMIUM_BLOB_ACCOUNT, AccountKind::PremiumBlockBlob))
        .build()
}

/// Install [`fixture_registry`] unless a registry is already installed
///
/// # Errors
/// Returns the error from building the fixture registry
pub fn install_fixture_accounts() -> Result<&'static AccountRegistry, RegistryError> {
    AccountRegistry::global_or_install(fixture_registry)
}

/// Names accepted by [`pipeline`]
pub const PIPELINES: &[&str] = &["paint", "paint-blue-small", "copy"];

pub fn color_step() -> StepFactory {
    fixed_step(ChoiceStep::labels(COLOR_KEY, ["Red", "Blue"]))
}

pub fn size_step() -> StepFactory {
    fixed_step(ChoiceStep::labels(SIZE_KEY, ["Small", "Large"]))
}

/// Size step offering only `Small` once `Blue` was chosen
pub fn size_step_blue_small_only() -> StepFactory {
    step_factory(|state| {
        let blue = state.custom::<String>(COLOR_KEY).is_some_and(|c| c == "Blue");
        if blue {
            ChoiceStep::labels(SIZE_KEY, ["Small"])
        } else {
            ChoiceStep::labels(SIZE_KEY, ["Small", "Large"])
        }
    })
}

/// Color x Size: four scenarios
pub fn paint_pipeline() -> Vec<StepFactory> {
    vec![color_step(), size_step()]
}

/// Color x Size without Blue-Large: three scenarios
pub fn blue_small_pipeline() -> Vec<StepFactory> {
    vec![color_step(), size_step_blue_small_only()]
}

/// Built-in pipeline by name
pub fn pipeline(name: &str) -> Option<Vec<StepFactory>> {
    match name {
        "paint" => Some(paint_pipeline()),
        "paint-blue-small" => Some(blue_small_pipeline()),
        "copy" => Some(mock_storage::copy_pipeline()),
        _ => None,
    }
}

/// Context that runs serially and ignores debuggers, for deterministic tests
///
/// Also installs the fixture accounts.
pub fn setup_test_context(name: &str) -> TestContext {
    if let Err(err) = install_fixture_accounts() {
        tracing::warn!(error = %err, "fixture accounts unavailable");
    }
    TestContext::new(name).with_config(RunnerConfig::new().with_parallelized(false).with_detect_debugger(false))
}

/// One call observed by a [`RecordingAsserter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Log(String),
    Passed(String),
    Failed(String),
    Error(String),
    Skip(String),
}

/// Asserter that records every call, for exercising a step outside a pipeline
pub struct RecordingAsserter {
    name: String,
    uuid: Uuid,
    pub records: Vec<Recorded>,
    pub cleanups: Vec<CleanupFn>,
    pub tracked: Vec<ResourceHandle>,
}

impl RecordingAsserter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            uuid: Uuid::new_v4(),
            records: Vec::new(),
            cleanups: Vec::new(),
            tracked: Vec::new(),
        }
    }

    pub fn failures(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match r {
                Recorded::Failed(msg) | Recorded::Error(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Asserter for RecordingAsserter {
    fn test_name(&self) -> &str {
        &self.name
    }

    fn log(&mut self, message: &str) {
        self.records.push(Recorded::Log(message.to_string()));
    }

    fn assert(&mut self, comment: &str, assertion: &dyn Assertion) {
        match assertion.check() {
            Ok(()) => self.records.push(Recorded::Passed(comment.to_string())),
            Err(detail) => self.records.push(Recorded::Failed(format!("{comment}: {detail}"))),
        }
    }

    fn assert_now(&mut self, comment: &str, assertion: &dyn Assertion) -> Result<(), StepError> {
        self.assert(comment, assertion);
        if self.failed() {
            return Err(StepError::fatal(comment));
        }
        Ok(())
    }

    fn error(&mut self, reason: &str) -> StepError {
        self.records.push(Recorded::Error(reason.to_string()));
        StepError::fatal(reason)
    }

    fn skip(&mut self, reason: &str) -> StepError {
        self.records.push(Recorded::Skip(reason.to_string()));
        StepError::Skipped(reason.to_string())
    }

    fn failed(&self) -> bool {
        !self.failures().is_empty()
    }

    fn cleanup(&mut self, cleanup: CleanupFn) {
        self.cleanups.push(cleanup);
    }

    fn track_resource(&mut self, resource: ResourceHandle) {
        self.tracked.push(resource);
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }
}
