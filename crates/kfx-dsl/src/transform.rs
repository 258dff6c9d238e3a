//! Task transforms
//!
//! [`TaskTransform`] collects an ordered list of mutations and applies them to
//! a [`PipelineTask`] in registration order. Each setter appends exactly one
//! mutation; the builder holds no per-task state, so one builder can be
//! applied to any number of tasks.

use std::fmt;

use k8s_openapi::api::core::v1::{
    ConfigMapEnvSource, EnvFromSource, EnvVar, EnvVarSource, SecretKeySelector,
};

use crate::naming::GlobPattern;
use crate::task::{ContainerExt, IntoQuantity, PipelineTask, ResourceSettings, ResourceSpec};

/// A single mutation over a task
pub type TransformFn = Box<dyn Fn(&mut dyn PipelineTask) + Send + Sync>;

/// Ordered, reusable list of task mutations
///
/// # Example
/// ```
/// use kfx_dsl::{ContainerOp, ResourceSettings, TaskTransform};
///
/// let transform = TaskTransform::new()
///     .set_resources(ResourceSettings::new().cpu("500m").memory(("1G", "4G")))
///     .set_image_pull_policy("Always")
///     .add_env_vars([("ENV", "production")])
///     .add_env_var_from_secret("AWS_ACCESS_KEY", "aws", "access_key")
///     .set_annotations([("iam.amazonaws.com/role", "some-arn")]);
///
/// let mut op = ContainerOp::new("echo", "bash");
/// transform.apply(&mut op);
/// assert_eq!(op.container.image_pull_policy.as_deref(), Some("Always"));
/// ```
#[derive(Default)]
pub struct TaskTransform {
    transforms: Vec<TransformFn>,
}

impl fmt::Debug for TaskTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskTransform")
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

impl TaskTransform {
    /// Empty transform list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a list of custom mutations
    #[inline]
    #[must_use]
    pub fn with_transforms(transforms: Vec<TransformFn>) -> Self {
        Self { transforms }
    }

    /// Append a custom mutation
    #[must_use]
    pub fn push<F>(mut self, transform: F) -> Self
    where
        F: Fn(&mut dyn PipelineTask) + Send + Sync + 'static,
    {
        self.transforms.push(Box::new(transform));
        tracing::debug!("Registered task transform #{}", self.transforms.len());
        self
    }

    /// Append every mutation of `other` after the ones already registered
    #[must_use]
    pub fn then(mut self, other: TaskTransform) -> Self {
        self.transforms.extend(other.transforms);
        self
    }

    /// Number of registered mutations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// True when no mutation is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Apply all mutations in registration order and hand the task back
    pub fn apply<'a, T: PipelineTask>(&self, task: &'a mut T) -> &'a mut T {
        self.apply_dyn(task);
        task
    }

    /// Apply all mutations to a type-erased task
    pub fn apply_dyn(&self, task: &mut dyn PipelineTask) {
        tracing::debug!("Applying {} transforms to task {}", self.transforms.len(), task.name());
        for transform in &self.transforms {
            transform(task);
        }
    }

    /// Turn the whole list into one mutation, e.g. for a pipeline-wide hook
    #[must_use]
    pub fn into_fn(self) -> TransformFn {
        Box::new(move |task: &mut dyn PipelineTask| self.apply_dyn(task))
    }

    /// Set pod annotations, one key at a time
    #[must_use]
    pub fn set_annotations<I, K, V>(self, annotations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let annotations = collect_pairs(annotations);
        self.push(move |task| {
            for (name, value) in &annotations {
                task.add_pod_annotation(name.clone(), value.clone());
            }
        })
    }

    /// Set pod labels, one key at a time
    #[must_use]
    pub fn set_labels<I, K, V>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let labels = collect_pairs(labels);
        self.push(move |task| {
            for (name, value) in &labels {
                task.add_pod_label(name.clone(), value.clone());
            }
        })
    }

    /// Append literal env vars to the primary container
    #[must_use]
    pub fn add_env_vars<I, K, V>(self, env_vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env_vars = collect_pairs(env_vars);
        self.push(move |task| {
            for (name, value) in &env_vars {
                task.container_mut().add_env_variable(literal_env(name, value));
            }
        })
    }

    /// Append one literal env var to the primary container
    #[must_use]
    pub fn add_env_var(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.push(move |task| task.container_mut().add_env_variable(literal_env(&name, &value)))
    }

    /// Append an env var read from a key of a secret
    #[must_use]
    pub fn add_env_var_from_secret(
        self,
        name: impl Into<String>,
        secret_name: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        let secret_name: String = secret_name.into();
        let var = EnvVar {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    key: secret_key.into(),
                    name: secret_name.into(),
                    ..SecretKeySelector::default()
                }),
                ..EnvVarSource::default()
            }),
        };
        self.push(move |task| task.container_mut().add_env_variable(var.clone()))
    }

    /// Append an env-from source exposing every key of a configmap
    #[must_use]
    pub fn add_env_var_from_configmap(self, configmap_name: impl Into<String>) -> Self {
        let configmap_name: String = configmap_name.into();
        let source = EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: configmap_name.into(),
                ..ConfigMapEnvSource::default()
            }),
            ..EnvFromSource::default()
        };
        self.push(move |task| task.container_mut().add_env_from(source.clone()))
    }

    /// Set cpu request and limit on the primary container
    #[must_use]
    pub fn set_cpu_resources(self, spec: impl Into<ResourceSpec>) -> Self {
        self.set_resources(ResourceSettings::new().cpu(spec))
    }

    /// Set memory request and limit on the primary container
    #[must_use]
    pub fn set_memory_resources(self, spec: impl Into<ResourceSpec>) -> Self {
        self.set_resources(ResourceSettings::new().memory(spec))
    }

    /// Set the GPU limit of the primary container for `vendor`
    #[must_use]
    pub fn set_gpu_limit(self, value: impl IntoQuantity, vendor: impl Into<String>) -> Self {
        let (quantity, vendor) = (value.into_quantity(), vendor.into());
        self.push(move |task| task.container_mut().set_gpu_limit(quantity.clone(), &vendor))
    }

    /// Set cpu and/or memory on the primary container
    #[must_use]
    pub fn set_resources(self, settings: ResourceSettings) -> Self {
        self.push(move |task| settings.apply_to(task.container_mut()))
    }

    /// Set cpu and/or memory on every sidecar whose name matches `pattern`
    #[must_use]
    pub fn set_sidecar_resources(self, settings: ResourceSettings, pattern: &str) -> Self {
        let pattern = GlobPattern::new(pattern);
        self.push(move |task| {
            for_matching_sidecars(task, &pattern, |sidecar| settings.apply_to(sidecar));
        })
    }

    /// Set the image pull policy of the primary container
    ///
    /// One of `Always`, `Never`, `IfNotPresent`; other values pass through.
    #[must_use]
    pub fn set_image_pull_policy(self, policy: impl Into<String>) -> Self {
        let policy = policy.into();
        self.push(move |task| task.container_mut().set_image_pull_policy(&policy))
    }

    /// Set the image pull policy of every sidecar whose name matches `pattern`
    #[must_use]
    pub fn set_sidecar_image_pull_policy(self, policy: impl Into<String>, pattern: &str) -> Self {
        let (policy, pattern) = (policy.into(), GlobPattern::new(pattern));
        self.push(move |task| {
            for_matching_sidecars(task, &pattern, |sidecar| sidecar.set_image_pull_policy(&policy));
        })
    }

    /// Replace the primary container image
    #[must_use]
    pub fn set_image(self, image: impl Into<String>) -> Self {
        let image = image.into();
        self.push(move |task| task.container_mut().image = Some(image.clone()))
    }
}

fn for_matching_sidecars<F>(task: &mut dyn PipelineTask, pattern: &GlobPattern, mut apply: F)
where
    F: FnMut(&mut k8s_openapi::api::core::v1::Container),
{
    let mut matched = 0usize;
    for sidecar in task.sidecars_mut() {
        if pattern.matches(&sidecar.name) {
            apply(sidecar);
            matched += 1;
        }
    }
    if matched == 0 {
        tracing::warn!("No sidecar of task {} matched {:?}", task.name(), pattern.as_str());
    }
}

pub(crate) fn literal_env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        value_from: None,
    }
}

fn collect_pairs<I, K, V>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
