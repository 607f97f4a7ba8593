//! Sub-test outcomes and pipeline reports

use crate::variation::ScenarioDescription;
use std::fmt;
use std::time::Duration;

/// How one scenario ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    /// Every step ran and nothing failed
    Passed,
    /// An assertion or step error failed the scenario
    Failed(String),
    /// A step skipped the scenario
    Skipped(String),
    /// A step panicked; recovered at the scenario boundary
    Panicked {
        /// Panic payload
        message: String,
        /// Stack at the panic site
        backtrace: String,
    },
}

impl ScenarioOutcome {
    /// True for [`ScenarioOutcome::Passed`]
    #[inline]
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// True for failed or panicked scenarios
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Panicked { .. })
    }

    /// Short status label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed(_) => "FAIL",
            Self::Skipped(_) => "SKIP",
            Self::Panicked { .. } => "PANIC",
        }
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Panicked { message, backtrace } => write!(f, "panicked: {message}\n{backtrace}"),
        }
    }
}

/// Result of one sub-test
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Full sub-test name, `<test>/<labels>`
    pub name: String,
    /// Variations the scenario ran
    pub description: ScenarioDescription,
    /// How it ended
    pub outcome: ScenarioOutcome,
    /// Lines logged through the asserter
    pub logs: Vec<String>,
    /// Wall time including cleanup
    pub duration: Duration,
}

/// Results of every scenario in a pipeline, in discovery order
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    test_name: String,
    results: Vec<ScenarioResult>,
}

impl PipelineReport {
    /// Create a report
    #[must_use]
    pub fn new(test_name: impl Into<String>, results: Vec<ScenarioResult>) -> Self {
        Self {
            test_name: test_name.into(),
            results,
        }
    }

    /// Parent test name
    #[inline]
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// All results
    #[inline]
    #[must_use]
    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    /// Number of scenarios run
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True if no scenario ran
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result by full sub-test name
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Sub-test names in discovery order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.name.as_str()).collect()
    }

    /// True when no scenario failed or panicked
    #[must_use]
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| !r.outcome.is_failure())
    }

    /// Failed and panicked scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| r.outcome.is_failure()).collect()
    }

    /// Number of skipped scenarios
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ScenarioOutcome::Skipped(_)))
            .count()
    }

    /// One line per scenario plus a totals line
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for result in &self.results {
            out.push_str(&format!(
                "{:<5} {} ({:.2?})\n",
                result.outcome.label(),
                result.name,
                result.duration
            ));
        }
        out.push_str(&format!(
            "{}: {} scenarios, {} failed, {} skipped",
            self.test_name,
            self.results.len(),
            self.failures().len(),
            self.skipped()
        ));
        out
    }

    /// Panic with every failure if any scenario failed
    ///
    /// # Panics
    /// When at least one scenario failed or panicked
    #[track_caller]
    pub fn assert_all_passed(&self) {
        if self.passed() {
            return;
        }

        let details = self
            .failures()
            .iter()
            .map(|r| format!("--- {}\n{}", r.name, r.outcome))
            .collect::<Vec<_>>()
            .join("\n");
        panic!("{}\n{details}", self.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, outcome: ScenarioOutcome) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            description: ScenarioDescription::new(),
            outcome,
            logs: Vec::new(),
            duration: Duration::from_millis(1),
        }
    }

    fn report() -> PipelineReport {
        PipelineReport::new(
            "suite",
            vec![
                result("suite/Red", ScenarioOutcome::Passed),
                result("suite/Blue", ScenarioOutcome::Failed("mismatch".to_string())),
                result("suite/Green", ScenarioOutcome::Skipped("no account".to_string())),
            ],
        )
    }

    #[test]
    fn skips_are_not_failures() {
        let report = PipelineReport::new(
            "suite",
            vec![
                result("suite/a", ScenarioOutcome::Passed),
                result("suite/b", ScenarioOutcome::Skipped("later".to_string())),
            ],
        );
        assert!(report.passed());
        assert_eq!(report.skipped(), 1);
        report.assert_all_passed();
    }

    #[test]
    fn failures_are_collected() {
        let report = report();
        assert!(!report.passed());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.names(), ["suite/Red", "suite/Blue", "suite/Green"]);
        assert!(report.summary().contains("FAIL  suite/Blue"));
        assert!(report.result("suite/Green").is_some());
    }

    #[test]
    #[should_panic(expected = "mismatch")]
    fn assert_all_passed_panics_with_details() {
        report().assert_all_passed();
    }
}
