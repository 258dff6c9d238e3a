//! Testing utilities for KFX workspace
//!
//! Shared fixtures for the integration tests of `kfx-dsl` and `kfx-vis`.

#![allow(missing_docs)]

use std::collections::HashMap;

use kfx_dsl::{
    ArtifactEnv, ContainerOp, ARTIFACT_BUCKET_ENV, ARTIFACT_KEY_PREFIX_ENV, ARTIFACT_PREFIX_ENV,
    ARTIFACT_STORAGE_ENV,
};

/// Task `hello` running `bash`, with sidecars `foo` and `bar`
pub fn sample_task() -> ContainerOp {
    ContainerOp::new("hello", "bash")
        .with_sidecar("foo", "bash")
        .with_sidecar("bar", "bash")
}

/// Artifact env of a task named `test-task` writing to `gcs://your_bucket`
pub fn sample_artifact_env() -> ArtifactEnv {
    ArtifactEnv::new("gcs", "your_bucket", "pipelines/artifact", "test-task")
}

/// The variables of [`sample_artifact_env`] as env var pairs
pub fn sample_artifact_env_vars() -> Vec<(&'static str, &'static str)> {
    vec![
        (ARTIFACT_STORAGE_ENV, "gcs"),
        (ARTIFACT_BUCKET_ENV, "your_bucket"),
        (ARTIFACT_KEY_PREFIX_ENV, "pipelines/artifact"),
        (ARTIFACT_PREFIX_ENV, "test-task"),
    ]
}

/// Lookup closure over a fixed set of variables
pub fn env_lookup<'a, I>(pairs: I) -> impl Fn(&str) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let vars: HashMap<String, String> = pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}
