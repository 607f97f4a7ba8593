//! Runner configuration
//!
//! [`RunnerConfig`] controls how discovered scenarios are executed. It can be
//! built in code, read from `E2E_*` environment variables, or parsed from TOML.

use crate::error::ConfigError;
use serde::Deserialize;

/// Separator placed between displayed variation labels in sub-test names
pub const DEFAULT_SEPARATOR: &str = "-";

/// Environment variable toggling parallel scenario execution
pub const ENV_PARALLEL: &str = "E2E_PARALLEL";
/// Environment variable capping the number of discovered scenarios
pub const ENV_MAX_SCENARIOS: &str = "E2E_MAX_SCENARIOS";
/// Environment variable sizing the scenario worker pool
pub const ENV_WORKER_THREADS: &str = "E2E_WORKER_THREADS";

/// Scenario runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Run discovered scenarios concurrently
    pub parallelized: bool,
    /// Separator between displayed variation labels
    pub separator: String,
    /// Abort discovery once more scenarios than this are found
    ///
    /// Every step multiplies the scenario count by the number of variations
    /// it offers, so a generous pipeline can explode quickly.
    pub max_scenarios: Option<usize>,
    /// Fall back to serial execution when a debugger is attached
    pub detect_debugger: bool,
    /// Size of the worker pool used for parallel runs (rayon default if unset)
    pub worker_threads: Option<usize>,
}

impl RunnerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With parallel execution toggled
    #[inline]
    #[must_use]
    pub fn with_parallelized(mut self, parallelized: bool) -> Self {
        self.parallelized = parallelized;
        self
    }

    /// With a custom label separator
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// With a discovery cap
    #[inline]
    #[must_use]
    pub fn with_max_scenarios(mut self, max: usize) -> Self {
        self.max_scenarios = Some(max);
        self
    }

    /// With debugger detection toggled
    #[inline]
    #[must_use]
    pub fn with_detect_debugger(mut self, detect: bool) -> Self {
        self.detect_debugger = detect;
        self
    }

    /// With a fixed worker pool size
    #[inline]
    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Defaults overridden by `E2E_PARALLEL`, `E2E_MAX_SCENARIOS` and
    /// `E2E_WORKER_THREADS`
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but unparsable
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RunnerConfig::from_env`] with a custom variable source
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but unparsable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_PARALLEL) {
            config.parallelized = parse_bool(ENV_PARALLEL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_SCENARIOS) {
            config.max_scenarios = Some(parse_usize(ENV_MAX_SCENARIOS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_WORKER_THREADS) {
            config.worker_threads = Some(parse_usize(ENV_WORKER_THREADS, &raw)?);
        }

        Ok(config)
    }

    /// Parse configuration from a TOML document; missing keys keep defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed TOML
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallelized: true,
            separator: DEFAULT_SEPARATOR.to_string(),
            max_scenarios: None,
            detect_debugger: true,
            worker_threads: None,
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn invalid(key: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    }
}

/// Per-call overrides for [`run_scenario_pipeline`](crate::run_scenario_pipeline)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Run scenarios concurrently; `None` defers to [`RunnerConfig::parallelized`]
    pub parallelized: Option<bool>,
}

impl PipelineOptions {
    /// Force serial execution
    #[inline]
    #[must_use]
    pub fn serial() -> Self {
        Self {
            parallelized: Some(false),
        }
    }

    /// Force parallel execution
    #[inline]
    #[must_use]
    pub fn parallel() -> Self {
        Self {
            parallelized: Some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_parallel() {
        let config = RunnerConfig::default();
        assert!(config.parallelized);
        assert!(config.detect_debugger);
        assert_eq!(config.separator, DEFAULT_SEPARATOR);
        assert_eq!(config.max_scenarios, None);
    }

    #[test]
    fn builder_overrides() {
        let config = RunnerConfig::new()
            .with_parallelized(false)
            .with_separator("/")
            .with_max_scenarios(16)
            .with_worker_threads(2);

        assert!(!config.parallelized);
        assert_eq!(config.separator, "/");
        assert_eq!(config.max_scenarios, Some(16));
        assert_eq!(config.worker_threads, Some(2));
    }

    #[test]
    fn lookup_reads_variables() {
        let config = RunnerConfig::from_lookup(lookup(&[
            (ENV_PARALLEL, "off"),
            (ENV_MAX_SCENARIOS, "64"),
            (ENV_WORKER_THREADS, " 4 "),
        ]))
        .unwrap();

        assert!(!config.parallelized);
        assert_eq!(config.max_scenarios, Some(64));
        assert_eq!(config.worker_threads, Some(4));
    }

    #[test]
    fn lookup_rejects_garbage() {
        let result = RunnerConfig::from_lookup(lookup(&[(ENV_PARALLEL, "sometimes")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = RunnerConfig::from_lookup(lookup(&[(ENV_MAX_SCENARIOS, "-1")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn toml_keeps_defaults_for_missing_keys() {
        let config = RunnerConfig::from_toml_str("parallelized = false\nmax_scenarios = 10\n").unwrap();

        assert!(!config.parallelized);
        assert_eq!(config.max_scenarios, Some(10));
        assert_eq!(config.separator, DEFAULT_SEPARATOR);
        assert!(config.detect_debugger);
    }

    #[test]
    fn toml_parse_error() {
        let result = RunnerConfig::from_toml_str("parallelized = maybe");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn pipeline_options_constructors() {
        assert_eq!(PipelineOptions::default().parallelized, None);
        assert_eq!(PipelineOptions::serial().parallelized, Some(false));
        assert_eq!(PipelineOptions::parallel().parallelized, Some(true));
    }
}
