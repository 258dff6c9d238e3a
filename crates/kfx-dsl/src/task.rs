//! Task representation
//!
//! [`PipelineTask`] is the handle the transforms operate on: a named task with
//! a primary container, zero or more sidecars and pod-level metadata.
//! Containers use the Kubernetes object model from `k8s-openapi`, so env vars,
//! env-from sources and resource requirements keep their wire shapes.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use k8s_openapi::api::core::v1::{Container, EnvFromSource, EnvVar, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Serialize;

/// Resource key for cpu
pub const CPU: &str = "cpu";

/// Resource key for memory
pub const MEMORY: &str = "memory";

/// Default GPU vendor for [`ContainerExt::set_gpu_limit`]
pub const DEFAULT_GPU_VENDOR: &str = "nvidia";

/// A pipeline task that transforms can mutate
///
/// Implement this for whatever task model the caller compiles pipelines
/// from. [`ContainerOp`] is the in-crate implementation.
pub trait PipelineTask {
    /// Task name as given in the pipeline definition
    fn name(&self) -> &str;

    /// Primary container
    fn container(&self) -> &Container;

    /// Primary container (mutable)
    fn container_mut(&mut self) -> &mut Container;

    /// Sidecar containers
    fn sidecars(&self) -> &[Container];

    /// Sidecar containers (mutable)
    fn sidecars_mut(&mut self) -> &mut [Container];

    /// Set a pod annotation, overwriting an existing key
    fn add_pod_annotation(&mut self, name: String, value: String);

    /// Set a pod label, overwriting an existing key
    fn add_pod_label(&mut self, name: String, value: String);
}

/// Container-level setters mirroring the pipeline SDK container API
///
/// Values are written verbatim: quantities and pull policies are validated
/// by the orchestrator, not here.
pub trait ContainerExt {
    /// Append an env var (no de-duplication)
    fn add_env_variable(&mut self, var: EnvVar);

    /// Append an env-from source
    fn add_env_from(&mut self, source: EnvFromSource);

    /// Set a resource request
    fn set_resource_request(&mut self, resource: &str, quantity: Quantity);

    /// Set a resource limit
    fn set_resource_limit(&mut self, resource: &str, quantity: Quantity);

    /// Set the cpu request
    fn set_cpu_request(&mut self, quantity: Quantity) {
        self.set_resource_request(CPU, quantity);
    }

    /// Set the cpu limit
    fn set_cpu_limit(&mut self, quantity: Quantity) {
        self.set_resource_limit(CPU, quantity);
    }

    /// Set the memory request
    fn set_memory_request(&mut self, quantity: Quantity) {
        self.set_resource_request(MEMORY, quantity);
    }

    /// Set the memory limit
    fn set_memory_limit(&mut self, quantity: Quantity) {
        self.set_resource_limit(MEMORY, quantity);
    }

    /// Set the GPU limit as `<vendor>.com/gpu`
    fn set_gpu_limit(&mut self, quantity: Quantity, vendor: &str) {
        self.set_resource_limit(&format!("{vendor}.com/gpu"), quantity);
    }

    /// Set the image pull policy
    fn set_image_pull_policy(&mut self, policy: &str);
}

impl ContainerExt for Container {
    fn add_env_variable(&mut self, var: EnvVar) {
        self.env.get_or_insert_with(Vec::new).push(var);
    }

    fn add_env_from(&mut self, source: EnvFromSource) {
        self.env_from.get_or_insert_with(Vec::new).push(source);
    }

    fn set_resource_request(&mut self, resource: &str, quantity: Quantity) {
        resources_mut(self)
            .requests
            .get_or_insert_with(BTreeMap::new)
            .insert(resource.to_string(), quantity);
    }

    fn set_resource_limit(&mut self, resource: &str, quantity: Quantity) {
        resources_mut(self)
            .limits
            .get_or_insert_with(BTreeMap::new)
            .insert(resource.to_string(), quantity);
    }

    fn set_image_pull_policy(&mut self, policy: &str) {
        self.image_pull_policy = Some(policy.to_string());
    }
}

fn resources_mut(container: &mut Container) -> &mut ResourceRequirements {
    container
        .resources
        .get_or_insert_with(ResourceRequirements::default)
}

/// Conversion of scalar resource values into a [`Quantity`]
///
/// Numbers are rendered with their display form, so `2` becomes `"2"` and
/// `0.5` becomes `"0.5"`.
pub trait IntoQuantity {
    /// Convert into a quantity string
    fn into_quantity(self) -> Quantity;
}

impl IntoQuantity for Quantity {
    fn into_quantity(self) -> Quantity {
        self
    }
}

impl IntoQuantity for String {
    fn into_quantity(self) -> Quantity {
        Quantity(self)
    }
}

impl IntoQuantity for &str {
    fn into_quantity(self) -> Quantity {
        Quantity(self.to_string())
    }
}

macro_rules! numeric_quantity {
    ($($ty:ty),*) => {
        $(
            impl IntoQuantity for $ty {
                fn into_quantity(self) -> Quantity {
                    Quantity(self.to_string())
                }
            }

            impl From<$ty> for ResourceSpec {
                fn from(value: $ty) -> Self {
                    Self::Same(value.into_quantity())
                }
            }
        )*
    };
}

/// Request/limit pair for one resource
///
/// A scalar sets request and limit to the same value; a 2-tuple gives
/// `(request, limit)`.
///
/// ```
/// use kfx_dsl::ResourceSpec;
///
/// let same: ResourceSpec = "500m".into();
/// let range: ResourceSpec = (1, 2).into();
/// assert_eq!(same.request().0, "500m");
/// assert_eq!(range.limit().0, "2");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceSpec {
    /// Request equals limit
    Same(Quantity),
    /// Distinct request and limit
    Range {
        /// Requested amount
        request: Quantity,
        /// Upper bound
        limit: Quantity,
    },
}

impl ResourceSpec {
    /// Requested quantity
    #[must_use]
    pub fn request(&self) -> &Quantity {
        match self {
            Self::Same(quantity) => quantity,
            Self::Range { request, .. } => request,
        }
    }

    /// Limit quantity
    #[must_use]
    pub fn limit(&self) -> &Quantity {
        match self {
            Self::Same(quantity) => quantity,
            Self::Range { limit, .. } => limit,
        }
    }
}

numeric_quantity!(i32, i64, u32, u64, usize, f64);

impl From<Quantity> for ResourceSpec {
    fn from(value: Quantity) -> Self {
        Self::Same(value)
    }
}

impl From<String> for ResourceSpec {
    fn from(value: String) -> Self {
        Self::Same(value.into_quantity())
    }
}

impl From<&str> for ResourceSpec {
    fn from(value: &str) -> Self {
        Self::Same(value.into_quantity())
    }
}

impl<R: IntoQuantity, L: IntoQuantity> From<(R, L)> for ResourceSpec {
    fn from((request, limit): (R, L)) -> Self {
        Self::Range {
            request: request.into_quantity(),
            limit: limit.into_quantity(),
        }
    }
}

/// Optional cpu and memory settings applied together
///
/// Only the resources that are set are written; the rest of the container's
/// requirements stay untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSettings {
    cpu: Option<ResourceSpec>,
    memory: Option<ResourceSpec>,
}

impl ResourceSettings {
    /// Empty settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cpu request/limit
    #[inline]
    #[must_use]
    pub fn cpu(mut self, spec: impl Into<ResourceSpec>) -> Self {
        self.cpu = Some(spec.into());
        self
    }

    /// Set memory request/limit
    #[inline]
    #[must_use]
    pub fn memory(mut self, spec: impl Into<ResourceSpec>) -> Self {
        self.memory = Some(spec.into());
        self
    }

    /// True when neither cpu nor memory is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.memory.is_none()
    }

    /// Write the settings into a container
    pub fn apply_to(&self, container: &mut Container) {
        if let Some(cpu) = &self.cpu {
            container.set_cpu_request(cpu.request().clone());
            container.set_cpu_limit(cpu.limit().clone());
        }
        if let Some(memory) = &self.memory {
            container.set_memory_request(memory.request().clone());
            container.set_memory_limit(memory.limit().clone());
        }
    }
}

/// A containerized pipeline step with sidecars and pod metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOp {
    /// Task name
    pub name: String,
    /// Primary container
    pub container: Container,
    /// Sidecar containers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sidecars: Vec<Container>,
    /// Pod annotations in insertion order
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub pod_annotations: IndexMap<String, String>,
    /// Pod labels in insertion order
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub pod_labels: IndexMap<String, String>,
}

impl ContainerOp {
    /// Create a task whose primary container runs `image`
    ///
    /// The primary container is named `main`.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container: container("main", image),
            ..Self::default()
        }
    }

    /// Add a sidecar running `image`
    #[must_use]
    pub fn with_sidecar(mut self, name: impl Into<String>, image: impl Into<String>) -> Self {
        self.sidecars.push(container(name, image));
        self
    }

    /// Find a sidecar by exact name
    #[must_use]
    pub fn sidecar(&self, name: &str) -> Option<&Container> {
        self.sidecars.iter().find(|sidecar| sidecar.name == name)
    }
}

fn container(name: impl Into<String>, image: impl Into<String>) -> Container {
    Container {
        name: name.into(),
        image: Some(image.into()),
        ..Container::default()
    }
}

impl PipelineTask for ContainerOp {
    fn name(&self) -> &str {
        &self.name
    }

    fn container(&self) -> &Container {
        &self.container
    }

    fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    fn sidecars(&self) -> &[Container] {
        &self.sidecars
    }

    fn sidecars_mut(&mut self) -> &mut [Container] {
        &mut self.sidecars
    }

    fn add_pod_annotation(&mut self, name: String, value: String) {
        self.pod_annotations.insert(name, value);
    }

    fn add_pod_label(&mut self, name: String, value: String) {
        self.pod_labels.insert(name, value);
    }
}

/// Requests of a container as plain strings (empty when unset)
#[must_use]
pub fn requests_of(container: &Container) -> BTreeMap<String, String> {
    quantities(container.resources.as_ref().and_then(|r| r.requests.as_ref()))
}

/// Limits of a container as plain strings (empty when unset)
#[must_use]
pub fn limits_of(container: &Container) -> BTreeMap<String, String> {
    quantities(container.resources.as_ref().and_then(|r| r.limits.as_ref()))
}

fn quantities(map: Option<&BTreeMap<String, Quantity>>) -> BTreeMap<String, String> {
    map.map(|m| m.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_spec_scalar_and_tuple() {
        let scalar = ResourceSpec::from("500m");
        assert_eq!(scalar.request(), &Quantity("500m".into()));
        assert_eq!(scalar.limit(), &Quantity("500m".into()));

        let tuple = ResourceSpec::from((1, "2"));
        assert_eq!(tuple.request(), &Quantity("1".into()));
        assert_eq!(tuple.limit(), &Quantity("2".into()));

        let float = ResourceSpec::from(0.5);
        assert_eq!(float.request().0, "0.5");
    }

    #[test]
    fn settings_compare_by_value() {
        let a = ResourceSettings::new().cpu((1, 2)).memory("1G");
        let b = ResourceSettings::new().cpu((1, "2")).memory("1G");
        assert_eq!(a, b);
        assert_ne!(a, ResourceSettings::new().cpu(1));
        assert_ne!(ResourceSpec::from("1"), ResourceSpec::from((1, 2)));
    }

    #[test]
    fn settings_only_touch_given_resources() {
        let mut c = container("main", "bash");
        ResourceSettings::new().memory("1G").apply_to(&mut c);

        assert_eq!(requests_of(&c).get(MEMORY).map(String::as_str), Some("1G"));
        assert!(requests_of(&c).get(CPU).is_none());

        ResourceSettings::new().cpu(2).apply_to(&mut c);
        assert_eq!(limits_of(&c).get(CPU).map(String::as_str), Some("2"));
        assert_eq!(limits_of(&c).get(MEMORY).map(String::as_str), Some("1G"));
    }

    #[test]
    fn gpu_limit_uses_vendor_key() {
        let mut c = container("main", "bash");
        c.set_gpu_limit(Quantity("1".into()), DEFAULT_GPU_VENDOR);
        c.set_gpu_limit(Quantity("2".into()), "amd");

        let limits = limits_of(&c);
        assert_eq!(limits.get("nvidia.com/gpu").map(String::as_str), Some("1"));
        assert_eq!(limits.get("amd.com/gpu").map(String::as_str), Some("2"));
    }

    #[test]
    fn env_vars_are_appended_without_dedup() {
        let mut c = container("main", "bash");
        for value in ["a", "b"] {
            c.add_env_variable(EnvVar {
                name: "X".into(),
                value: Some(value.into()),
                value_from: None,
            });
        }
        let env = c.env.unwrap_or_default();
        assert_eq!(env.len(), 2);
        assert_eq!(env[1].value.as_deref(), Some("b"));
    }

    #[test]
    fn container_op_pod_metadata_overwrites_keys() {
        let mut op = ContainerOp::new("hello", "bash");
        op.add_pod_annotation("k".into(), "1".into());
        op.add_pod_annotation("k".into(), "2".into());
        assert_eq!(op.pod_annotations.len(), 1);
        assert_eq!(op.pod_annotations["k"], "2");
    }

    #[test]
    fn container_op_serializes_k8s_shapes() {
        let op = ContainerOp::new("hello", "bash").with_sidecar("foo", "bash");
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["name"], "hello");
        assert_eq!(value["container"]["image"], "bash");
        assert_eq!(value["sidecars"][0]["name"], "foo");
        assert!(value.get("podLabels").is_none());
    }
}
