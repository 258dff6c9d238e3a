//! KFX DSL
//!
//! Compile-time task transforms and run-time artifact locations for
//! Kubeflow Pipelines tasks.
//!
//! # Core Concepts
//!
//! - [`PipelineTask`]: the task handle transforms operate on (primary
//!   container, sidecars, pod annotations and labels)
//! - [`TaskTransform`]: ordered, reusable list of task mutations
//! - [`ArtifactLocationConfig`]: artifact repository settings; its
//!   [`set_envs`](ArtifactLocationConfig::set_envs) transform injects the
//!   artifact location into a task
//! - [`ArtifactEnv`] / [`ArtifactReference`]: the run-time side, turning an
//!   artifact name into its object key and URI
//!
//! # Example
//!
//! ```rust
//! use kfx_dsl::{ArtifactEnv, ArtifactLocationConfig, ContainerOp};
//!
//! // pipeline definition
//! let config = ArtifactLocationConfig::new("minio", "mlpipeline").with_key_prefix("artifacts/");
//! let mut op = ContainerOp::new("train", "python:3.11");
//! config.set_envs().apply(&mut op);
//!
//! // inside the task
//! let env = ArtifactEnv::from_container(&op.container)?;
//! let model = env.artifact("model_file");
//! assert_eq!(
//!     model.uri(),
//!     "minio://mlpipeline/artifacts/{{workflow.name}}/{{pod.name}}/train-model.tgz"
//! );
//! # Ok::<(), kfx_dsl::DslError>(())
//! ```

#![warn(unreachable_pub)]

mod artifact_location;
mod error;
mod naming;
mod task;
mod transform;
mod workflow_env;

pub use artifact_location::{
    normalize_artifact_name, ArtifactEnv, ArtifactLocationConfig, ArtifactReference,
    ARTIFACT_BUCKET_ENV, ARTIFACT_KEY_PREFIX_ENV, ARTIFACT_PREFIX_ENV, ARTIFACT_STORAGE_ENV,
    DEFAULT_ARTIFACT_EXTENSION, DEFAULT_KEY_FORMAT, RESERVED_ARTIFACT_NAMES,
};
pub use error::{DslError, Result};
pub use naming::{join_key, sanitize_k8s_name, GlobPattern};
pub use task::{
    limits_of, requests_of, ContainerExt, ContainerOp, IntoQuantity, PipelineTask,
    ResourceSettings, ResourceSpec, CPU, DEFAULT_GPU_VENDOR, MEMORY,
};
pub use transform::{TaskTransform, TransformFn};
pub use workflow_env::{set_pod_metadata_envs, set_workflow_env, PodMetadataEnvNames, WorkflowVars};

/// Re-export of the Kubernetes types that appear in the public API
pub mod k8s {
    pub use k8s_openapi::api::core::v1::{
        Container, EnvFromSource, EnvVar, EnvVarSource, ResourceRequirements,
    };
    pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
