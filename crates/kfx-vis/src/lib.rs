//! KFX Visualization
//!
//! Typed documents read by the Kubeflow Pipelines UI: the UI metadata
//! document that drives output visualizations and the metrics document.
//!
//! # Core Concepts
//!
//! - [`Visualization`]: one output of the UI metadata document, tagged by its
//!   `type` (`confusion_matrix`, `markdown`, `roc`, `table`, `tensorboard`,
//!   `web-app`)
//! - [`UiMetadata`] / [`Metrics`]: the two documents
//! - [`KfpDocument`]: JSON encoding and output to the well-known paths
//!
//! Unset fields are never written, and fields use their wire names
//! (`format`, `schema`, `numberValue`).
//!
//! # Example
//!
//! ```rust
//! use kfx_dsl::ArtifactEnv;
//! use kfx_vis::{confusion_matrix, kfp_ui_metadata, markdown, KfpDocument, OutputEntry, Storage};
//!
//! let env = ArtifactEnv::new("minio", "mlpipeline", "artifacts", "train");
//! let doc = kfp_ui_metadata([
//!     OutputEntry::from(confusion_matrix(env.artifact("confusion_matrix_file"), ["cat", "dog"])),
//!     markdown("# Results").with_storage(Storage::Inline).into(),
//!     serde_json::json!({"type": "tensorboard", "source": "gs://logs/*"}).into(),
//! ])?;
//!
//! assert_eq!(doc.outputs[0].source(), "minio://mlpipeline/artifacts/train-confusion_matrix.tgz");
//! let json = doc.to_json()?;
//! assert!(json.starts_with(r#"{"version":1,"outputs":[{"type":"confusion_matrix""#));
//! # Ok::<(), kfx_vis::VisError>(())
//! ```

#![warn(unreachable_pub)]

mod enums;
mod error;
mod helpers;
mod metrics;
mod models;
mod schema;

pub use enums::{parse_enum, ArtifactDataFormat, DataType, MetricFormat, Storage, VisType};
pub use error::{Result, VisError};
pub use helpers::{
    confusion_matrix, kfp_metric, kfp_metrics, kfp_ui_metadata, kfp_ui_metadata_with_version,
    markdown, roc, table, tensorboard, to_json, to_json_pretty, to_value, web_app,
    write_local_file, write_to, KfpDocument, MetricEntry, OutputEntry, KFP_METRICS_PATH, KFP_UI_METADATA_PATH,
};
pub use metrics::{is_valid_metric_name, Metric, Metrics, METRIC_NAME_PATTERN};
pub use models::{
    ColumnSchema, ConfusionMatrix, Markdown, Roc, SchemaVersion, Table, Tensorboard, UiMetadata,
    Visualization, WebApp,
};
pub use schema::{metrics_schema, ui_metadata_schema};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
