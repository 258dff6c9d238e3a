//! Artifact locations
//!
//! At pipeline-compile time [`ArtifactLocationConfig::set_envs`] injects four
//! environment variables into a task. At run time [`ArtifactEnv`] reads them
//! back and [`ArtifactReference`] turns an artifact name into the object key
//! and URI the workflow engine will upload it to.

use std::fmt;

use k8s_openapi::api::core::v1::Container;
use serde::{Deserialize, Serialize};

use crate::error::{DslError, Result};
use crate::naming::{join_key, sanitize_k8s_name};
use crate::task::ContainerExt;
use crate::transform::{literal_env, TaskTransform};

/// Workflow template appended to the key prefix when no key format is set
pub const DEFAULT_KEY_FORMAT: &str = "{{workflow.name}}/{{pod.name}}";

/// Extension of archived artifacts
pub const DEFAULT_ARTIFACT_EXTENSION: &str = ".tgz";

/// Storage scheme env var
pub const ARTIFACT_STORAGE_ENV: &str = "WORKFLOW_ARTIFACT_STORAGE";
/// Bucket env var
pub const ARTIFACT_BUCKET_ENV: &str = "WORKFLOW_ARTIFACT_BUCKET";
/// Key prefix env var
pub const ARTIFACT_KEY_PREFIX_ENV: &str = "WORKFLOW_ARTIFACT_KEY_PREFIX";
/// Per-task prefix env var
pub const ARTIFACT_PREFIX_ENV: &str = "WORKFLOW_ARTIFACT_PREFIX";

/// Artifact names that are always sanitized
pub const RESERVED_ARTIFACT_NAMES: [&str; 2] = ["mlpipeline-ui-metadata", "mlpipeline-metrics"];

/// Artifact repository settings, as found in the workflow controller configmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocationConfig {
    /// Storage scheme, e.g. `s3`, `minio`, `gcs`
    pub scheme: String,
    /// Bucket name
    pub bucket: String,
    /// Key prefix; ignored when `key_format` is set
    #[serde(default)]
    pub key_prefix: String,
    /// Full key format
    #[serde(default)]
    pub key_format: String,
}

impl ArtifactLocationConfig {
    /// Config with empty key prefix and key format
    #[inline]
    #[must_use]
    pub fn new(scheme: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            key_prefix: String::new(),
            key_format: String::new(),
        }
    }

    /// Set the key prefix
    #[inline]
    #[must_use]
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Set the key format
    #[inline]
    #[must_use]
    pub fn with_key_format(mut self, key_format: impl Into<String>) -> Self {
        self.key_format = key_format.into();
        self
    }

    /// Parse a JSON config document
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| DslError::InvalidConfig(e.to_string()))
    }

    /// Parse a YAML config document
    pub fn from_yaml(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| DslError::InvalidConfig(e.to_string()))
    }

    /// Key prefix every artifact of a task is stored under
    ///
    /// The result is a workflow template; it is never evaluated here.
    ///
    /// ```
    /// use kfx_dsl::ArtifactLocationConfig;
    ///
    /// let config = ArtifactLocationConfig::new("minio", "mlpipeline").with_key_prefix("artifacts/");
    /// assert_eq!(config.resolve_key_prefix(), "artifacts/{{workflow.name}}/{{pod.name}}");
    /// ```
    #[must_use]
    pub fn resolve_key_prefix(&self) -> String {
        if self.key_format.is_empty() {
            join_key(&self.key_prefix, DEFAULT_KEY_FORMAT)
        } else {
            self.key_format.clone()
        }
    }

    /// Task transform appending the four artifact location env vars
    ///
    /// The per-task prefix is the sanitized task name.
    #[must_use]
    pub fn set_envs(&self) -> TaskTransform {
        let storage = self.scheme.clone();
        let bucket = self.bucket.clone();
        let key_prefix = self.resolve_key_prefix();
        TaskTransform::new().push(move |task| {
            let prefix = sanitize_k8s_name(task.name(), false);
            let container = task.container_mut();
            for (name, value) in [
                (ARTIFACT_STORAGE_ENV, storage.as_str()),
                (ARTIFACT_BUCKET_ENV, bucket.as_str()),
                (ARTIFACT_KEY_PREFIX_ENV, key_prefix.as_str()),
                (ARTIFACT_PREFIX_ENV, prefix.as_str()),
            ] {
                container.add_env_variable(literal_env(name, value));
            }
        })
    }

    /// Same as [`set_envs`](Self::set_envs), also replacing the task image
    ///
    /// Use this when the task must run an image that ships the run-time half
    /// of this library.
    #[must_use]
    pub fn set_envs_with_image(&self, image: impl Into<String>) -> TaskTransform {
        TaskTransform::new().set_image(image).then(self.set_envs())
    }
}

/// The artifact location as seen from inside a running task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEnv {
    /// Storage scheme
    pub storage: String,
    /// Bucket name
    pub bucket: String,
    /// Resolved key prefix
    pub key_prefix: String,
    /// Sanitized task name
    pub prefix: String,
}

impl ArtifactEnv {
    /// Build from explicit values
    #[must_use]
    pub fn new(
        storage: impl Into<String>,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            storage: storage.into(),
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
            prefix: prefix.into(),
        }
    }

    /// Read the four variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the four variables through `lookup`
    ///
    /// # Errors
    /// [`DslError::MissingEnvVar`] naming the first absent variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).ok_or_else(|| DslError::missing_env_var(name));
        Ok(Self {
            storage: read(ARTIFACT_STORAGE_ENV)?,
            bucket: read(ARTIFACT_BUCKET_ENV)?,
            key_prefix: read(ARTIFACT_KEY_PREFIX_ENV)?,
            prefix: read(ARTIFACT_PREFIX_ENV)?,
        })
    }

    /// Read the literal env vars injected into a container spec
    ///
    /// When a name appears more than once the last entry wins.
    pub fn from_container(container: &Container) -> Result<Self> {
        let env = container.env.as_deref().unwrap_or_default();
        Self::from_lookup(|name| {
            env.iter()
                .rev()
                .find(|var| var.name == name)
                .and_then(|var| var.value.clone())
        })
    }

    /// Reference an artifact with the default extension, unsanitized
    #[must_use]
    pub fn artifact(&self, name: &str) -> ArtifactReference {
        ArtifactReference::with_options(self, name, DEFAULT_ARTIFACT_EXTENSION, false)
    }
}

/// Normalize an artifact name
///
/// A single trailing `_path` or `_file` is dropped. With `sanitize` the
/// result is always k8s-sanitized; otherwise only reserved names are.
#[must_use]
pub fn normalize_artifact_name(name: &str, sanitize: bool) -> String {
    let stripped = name
        .strip_suffix("_path")
        .or_else(|| name.strip_suffix("_file"))
        .unwrap_or(name);

    let sanitized = sanitize_k8s_name(stripped, false);
    if sanitize || RESERVED_ARTIFACT_NAMES.contains(&sanitized.as_str()) {
        sanitized
    } else {
        stripped.to_string()
    }
}

/// Location of an artifact produced by the current task
///
/// Displays as its URI, so it can be passed wherever a visualization source
/// is expected.
///
/// ```
/// use kfx_dsl::{ArtifactEnv, ArtifactReference};
///
/// let env = ArtifactEnv::new("gcs", "your_bucket", "pipelines/artifact", "test-task");
/// let artifact = ArtifactReference::new(&env, "some_artifact_file");
/// assert_eq!(artifact.uri(), "gcs://your_bucket/pipelines/artifact/test-task-some_artifact.tgz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    name: String,
    extension: String,
    key: String,
    uri: String,
}

impl ArtifactReference {
    /// Reference with the default extension and no forced sanitization
    #[must_use]
    pub fn new(env: &ArtifactEnv, name: &str) -> Self {
        Self::with_options(env, name, DEFAULT_ARTIFACT_EXTENSION, false)
    }

    /// Reference with an explicit extension and sanitization flag
    #[must_use]
    pub fn with_options(env: &ArtifactEnv, name: &str, extension: &str, sanitize: bool) -> Self {
        let name = normalize_artifact_name(name, sanitize);
        let key = join_key(&env.key_prefix, &format!("{}-{}{}", env.prefix, name, extension));
        let uri = format!("{}://{}", env.storage, join_key(&env.bucket, &key));
        tracing::debug!("Resolved artifact {} to {}", name, uri);
        Self {
            name,
            extension: extension.to_string(),
            key,
            uri,
        }
    }

    /// Reference resolved against the process environment
    pub fn from_env(name: &str) -> Result<Self> {
        Ok(Self::new(&ArtifactEnv::from_env()?, name))
    }

    /// Normalized artifact name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File extension
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Object key inside the bucket
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `{storage}://{bucket}/{key}`
    #[inline]
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl From<ArtifactReference> for String {
    fn from(reference: ArtifactReference) -> Self {
        reference.uri
    }
}

impl From<&ArtifactReference> for String {
    fn from(reference: &ArtifactReference) -> Self {
        reference.uri.clone()
    }
}
