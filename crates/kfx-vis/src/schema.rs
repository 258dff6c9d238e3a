//! JSON Schema export
//!
//! Schemas are derived from the same types that serialize the documents, so
//! they cannot drift from the wire format.

use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::metrics::Metrics;
use crate::models::UiMetadata;

/// JSON Schema of the UI metadata document
#[must_use]
pub fn ui_metadata_schema() -> RootSchema {
    schema_for!(UiMetadata)
}

/// JSON Schema of the metrics document
#[must_use]
pub fn metrics_schema() -> RootSchema {
    schema_for!(Metrics)
}
