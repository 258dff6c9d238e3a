//! Error types for KFX visualization documents

use std::path::PathBuf;

/// Main visualization error type
#[derive(Debug, thiserror::Error)]
pub enum VisError {
    /// A required field is absent
    #[error("{kind}: missing required field `{field}`")]
    MissingField {
        /// Visualization or document kind
        kind: String,
        /// Wire name of the field
        field: String,
    },

    /// Unrecognized visualization `type`
    #[error("unknown visualization type: {0}")]
    UnknownType(String),

    /// A value outside its enumeration
    #[error("invalid value for `{field}`: {value}")]
    InvalidEnum {
        /// Wire name of the field
        field: String,
        /// Rejected value
        value: String,
    },

    /// Metric name not of the form `^[a-z]([-a-z0-9]{0,62}[a-z0-9])?$`
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),

    /// NaN or infinite metric value
    #[error("metric {name} has a non-finite value")]
    NonFiniteMetric {
        /// Metric name
        name: String,
    },

    /// Any other structural mismatch of a raw document
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// JSON encoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing a document to a sink failed
    #[error("failed to write document: {0}")]
    Sink(#[source] std::io::Error),

    /// Writing a document failed
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl VisError {
    /// Create missing field error
    #[inline]
    pub fn missing_field(kind: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            kind: kind.into(),
            field: field.into(),
        }
    }

    /// Create invalid enum error
    #[inline]
    pub fn invalid_enum(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidEnum {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Validation failures, as opposed to encoding or I/O failures
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Serialization(_) | Self::Sink(_) | Self::Io { .. })
    }
}

/// Result alias for visualization operations
pub type Result<T, E = VisError> = std::result::Result<T, E>;
