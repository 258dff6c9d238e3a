//! Error types for KFX DSL
//!
//! Only configuration problems are reported here. Malformed resource
//! quantities, pull policies or secret references are passed through to the
//! orchestrator unchecked.

/// Main DSL error type
#[derive(Debug, thiserror::Error)]
pub enum DslError {
    /// A required artifact-location environment variable is not set
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An artifact location config document could not be parsed
    #[error("invalid artifact location config: {0}")]
    InvalidConfig(String),
}

impl DslError {
    /// Create missing env var error
    #[inline]
    pub fn missing_env_var(name: impl Into<String>) -> Self {
        Self::MissingEnvVar(name.into())
    }
}

/// Result alias for DSL operations
pub type Result<T, E = DslError> = std::result::Result<T, E>;
