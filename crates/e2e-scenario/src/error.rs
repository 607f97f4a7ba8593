//! Error types for the scenario engine
//!
//! Covers:
//! - Discovery failures (a step's variation reporting misbehaved)
//! - Step failures during the real pass
//! - Resource, registry and configuration errors

/// Umbrella error for engine entry points
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Variation discovery failed before any scenario ran
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Account registry misuse
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl ScenarioError {
    /// True when the error came from a step's variation reporting rather than
    /// from the system under test
    #[inline]
    #[must_use]
    pub fn is_discovery_failure(&self) -> bool {
        matches!(self, Self::Discovery(_))
    }
}

/// Errors raised while enumerating scenario variations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// A step factory or `mock_variations` panicked
    #[error("step {index} ({step}) panicked while reporting variations: {message}")]
    StepPanicked {
        /// Position of the step in the pipeline
        index: usize,
        /// Step name, or a positional label if the factory itself panicked
        step: String,
        /// Panic payload
        message: String,
    },

    /// More complete scenarios were discovered than the configured cap
    #[error("discovered more than {limit} scenarios")]
    TooManyScenarios {
        /// Configured cap
        limit: usize,
    },
}

/// Errors a step may return from `run`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// Unrecoverable failure; the scenario stops and is reported failed
    #[error("fatal: {0}")]
    Fatal(String),

    /// The scenario stops and is reported skipped
    #[error("skipped: {0}")]
    Skipped(String),

    /// A resource operation failed
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),
}

impl StepError {
    /// Create a fatal error
    #[inline]
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal(reason.into())
    }

    /// Check if this error represents a skip rather than a failure
    #[inline]
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Errors from resource handles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// Resource does not exist
    #[error("resource not found: {path}")]
    NotFound {
        /// Canonical path
        path: String,
    },

    /// Resource already exists
    #[error("resource already exists: {path}")]
    AlreadyExists {
        /// Canonical path
        path: String,
    },

    /// Operation not supported by this resource kind
    #[error("{operation} is not supported for {path}")]
    Unsupported {
        /// Attempted operation
        operation: String,
        /// Canonical path
        path: String,
    },

    /// Backend reported an error
    #[error("backend error: {0}")]
    Backend(String),
}

/// Account registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The global registry was already installed
    #[error("account registry already initialized")]
    AlreadyInitialized,

    /// No global registry has been installed
    #[error("account registry has not been initialized")]
    NotInitialized,

    /// No account registered under this name
    #[error("{0} is not an available account in the registry")]
    UnknownAccount(String),

    /// An account with this name was already registered
    #[error("account {0} registered twice")]
    DuplicateAccount(String),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting could not be parsed
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Setting name
        key: String,
        /// Raw value
        value: String,
    },

    /// TOML document could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
