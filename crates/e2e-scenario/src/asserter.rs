//! Assertions and the per-scenario asserter
//!
//! Steps report problems through an [`Asserter`]. Soft failures
//! ([`Asserter::assert`]) mark the scenario failed and let the step continue;
//! hard failures return a [`StepError`] the step propagates with `?`.

use crate::error::StepError;
use crate::state::ResourceHandle;
use crate::tracker::{CleanupSummary, ResourceTracker};
use std::fmt;
use uuid::Uuid;

/// A check evaluated by an [`Asserter`]
pub trait Assertion {
    /// Short assertion name used in failure messages
    fn name(&self) -> &'static str;

    /// `Ok` if the assertion holds, otherwise a human-readable explanation
    ///
    /// # Errors
    /// Returns the explanation of the failure
    fn check(&self) -> Result<(), String>;
}

/// Two values compare equal
#[derive(Debug, Clone)]
pub struct Equal<T> {
    left: T,
    right: T,
}

impl<T> Equal<T> {
    /// Compare `left` against `right`
    #[inline]
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }
}

impl<T: PartialEq + fmt::Debug> Assertion for Equal<T> {
    fn name(&self) -> &'static str {
        "Equal"
    }

    fn check(&self) -> Result<(), String> {
        if self.left == self.right {
            Ok(())
        } else {
            Err(format!("{:?} != {:?}", self.left, self.right))
        }
    }
}

/// Inverts another assertion
#[derive(Debug, Clone)]
pub struct Not<A>(pub A);

impl<A: Assertion> Assertion for Not<A> {
    fn name(&self) -> &'static str {
        "Not"
    }

    fn check(&self) -> Result<(), String> {
        match self.0.check() {
            Ok(()) => Err(format!("{} unexpectedly held", self.0.name())),
            Err(_) => Ok(()),
        }
    }
}

/// A boolean condition holds
#[derive(Debug, Clone, Copy)]
pub struct IsTrue(pub bool);

impl Assertion for IsTrue {
    fn name(&self) -> &'static str {
        "IsTrue"
    }

    fn check(&self) -> Result<(), String> {
        if self.0 {
            Ok(())
        } else {
            Err("condition was false".to_string())
        }
    }
}

/// Cleanup closure run after the scenario completes
pub type CleanupFn = Box<dyn FnOnce(&mut dyn Asserter)>;

/// Reporting surface handed to [`ScenarioStep::run`](crate::ScenarioStep::run)
pub trait Asserter {
    /// Full sub-test name
    fn test_name(&self) -> &str;

    /// Record a log line against the scenario
    fn log(&mut self, message: &str);

    /// Evaluate an assertion; on failure mark the scenario failed and continue
    fn assert(&mut self, comment: &str, assertion: &dyn Assertion);

    /// Evaluate an assertion; on failure mark the scenario failed and stop
    ///
    /// # Errors
    /// Returns [`StepError::Fatal`] when the assertion does not hold
    fn assert_now(&mut self, comment: &str, assertion: &dyn Assertion) -> Result<(), StepError>;

    /// Mark the scenario failed; return the error to stop the step
    fn error(&mut self, reason: &str) -> StepError;

    /// Skip the scenario; return the error to stop the step
    fn skip(&mut self, reason: &str) -> StepError;

    /// True once anything has failed
    fn failed(&self) -> bool;

    /// Register a closure to run after the scenario, in reverse order
    fn cleanup(&mut self, cleanup: CleanupFn);

    /// Record a created resource for teardown
    fn track_resource(&mut self, resource: ResourceHandle);

    /// Identifier unique to this scenario run
    fn uuid(&self) -> Uuid;
}

/// Convenience helpers available on every [`Asserter`]
pub trait AsserterExt: Asserter {
    /// Unwrap `result`, failing the scenario with `comment` on error
    ///
    /// # Errors
    /// Returns [`StepError::Fatal`] carrying the comment and error text
    fn no_error<T, E: fmt::Display>(&mut self, comment: &str, result: Result<T, E>) -> Result<T, StepError> {
        result.map_err(|err| self.error(&format!("error was not nil ({comment}): {err}")))
    }
}

impl<A: Asserter + ?Sized> AsserterExt for A {}

/// Concrete asserter owned by one running scenario
pub struct ScenarioAsserter {
    test_name: String,
    uuid: Uuid,
    failure: Option<String>,
    skip_reason: Option<String>,
    logs: Vec<String>,
    cleanups: Vec<CleanupFn>,
    tracker: ResourceTracker,
}

impl ScenarioAsserter {
    /// Create an asserter for the named sub-test
    #[must_use]
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            uuid: Uuid::new_v4(),
            failure: None,
            skip_reason: None,
            logs: Vec::new(),
            cleanups: Vec::new(),
            tracker: ResourceTracker::new(),
        }
    }

    fn mark_failed(&mut self, reason: String) {
        tracing::warn!(scenario = %self.test_name, %reason, "scenario failure");
        self.logs.push(reason.clone());
        self.failure.get_or_insert(reason);
    }

    /// First failure reason recorded
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Skip reason, if the scenario was skipped
    #[inline]
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    /// Record a failure that did not come through an assertion
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.mark_failed(reason.into());
    }

    /// Record a skip that did not come through [`Asserter::skip`]
    ///
    /// The first skip reason wins.
    pub fn mark_skipped(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.logs.push(format!("skipped: {reason}"));
        self.skip_reason.get_or_insert(reason);
    }

    /// Collected log lines
    #[inline]
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Tracked resources
    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Run registered cleanups, most recent first
    ///
    /// Cleanups registered by a running cleanup join the stack and run next.
    /// A panicking cleanup is logged and marks the scenario failed; the
    /// remaining cleanups still run.
    pub fn run_cleanups(&mut self) {
        while let Some(cleanup) = self.cleanups.pop() {
            if let Err(panic) = crate::panic_capture::catch(|| cleanup(&mut *self)) {
                self.mark_failed(format!("cleanup step panicked: {}\n{}", panic.message, panic.backtrace));
            }
        }
    }

    /// Delete tracked resources, recording failures against the scenario
    pub fn delete_tracked_resources(&mut self) -> CleanupSummary {
        let summary = self.tracker.delete_all();
        for err in &summary.errors {
            self.mark_failed(format!("failed to delete created resource: {err}"));
        }
        summary
    }

    /// Consume the asserter, keeping its logs
    #[must_use]
    pub fn into_logs(self) -> Vec<String> {
        self.logs
    }
}

impl Asserter for ScenarioAsserter {
    fn test_name(&self) -> &str {
        &self.test_name
    }

    fn log(&mut self, message: &str) {
        tracing::debug!(scenario = %self.test_name, "{message}");
        self.logs.push(message.to_string());
    }

    fn assert(&mut self, comment: &str, assertion: &dyn Assertion) {
        if let Err(detail) = assertion.check() {
            self.mark_failed(format!("assertion {} failed: {detail} ({comment})", assertion.name()));
        }
    }

    fn assert_now(&mut self, comment: &str, assertion: &dyn Assertion) -> Result<(), StepError> {
        match assertion.check() {
            Ok(()) => Ok(()),
            Err(detail) => {
                let reason = format!("assertion {} failed: {detail} ({comment})", assertion.name());
                self.mark_failed(reason.clone());
                Err(StepError::Fatal(reason))
            }
        }
    }

    fn error(&mut self, reason: &str) -> StepError {
        self.mark_failed(format!("error: {reason}"));
        StepError::Fatal(reason.to_string())
    }

    fn skip(&mut self, reason: &str) -> StepError {
        self.mark_skipped(reason);
        StepError::Skipped(reason.to_string())
    }

    fn failed(&self) -> bool {
        self.failure.is_some()
    }

    fn cleanup(&mut self, cleanup: CleanupFn) {
        self.cleanups.push(cleanup);
    }

    fn track_resource(&mut self, resource: ResourceHandle) {
        self.tracker.track(resource);
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl fmt::Debug for ScenarioAsserter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioAsserter")
            .field("test_name", &self.test_name)
            .field("uuid", &self.uuid)
            .field("failure", &self.failure)
            .field("cleanups", &self.cleanups.len())
            .field("tracked", &self.tracker.len())
            .finish_non_exhaustive()
    }
}
