//! Workflow and pod metadata env vars

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector};

use crate::artifact_location::DEFAULT_KEY_FORMAT;
use crate::task::ContainerExt;
use crate::transform::{literal_env, TaskTransform};

/// An env var whose value is a workflow template string
///
/// The template is substituted by the workflow engine when the pod is
/// created, e.g. `{{workflow.name}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowVars {
    /// Env var name
    pub name: String,
    /// Workflow template
    pub template: String,
}

impl WorkflowVars {
    /// Env var `name` carrying `template`
    #[must_use]
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }
}

impl Default for WorkflowVars {
    fn default() -> Self {
        Self::new("WORKFLOW_DEFAULT_KEY_FORMAT", DEFAULT_KEY_FORMAT)
    }
}

/// Transform appending a workflow template env var to the primary container
#[must_use]
pub fn set_workflow_env(vars: WorkflowVars) -> TaskTransform {
    TaskTransform::new().push(move |task| {
        task.container_mut()
            .add_env_variable(literal_env(&vars.name, &vars.template));
    })
}

/// Env var names used by [`set_pod_metadata_envs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodMetadataEnvNames {
    /// Receives `metadata.name`
    pub pod_name: String,
    /// Receives `metadata.namespace`
    pub namespace: String,
    /// Receives `spec.nodeName`
    pub node_name: String,
}

impl Default for PodMetadataEnvNames {
    fn default() -> Self {
        Self {
            pod_name: "POD_NAME".to_string(),
            namespace: "NAMESPACE".to_string(),
            node_name: "NODE_NAME".to_string(),
        }
    }
}

/// Transform exposing pod name, namespace and node name through the downward API
#[must_use]
pub fn set_pod_metadata_envs(names: PodMetadataEnvNames) -> TaskTransform {
    let vars: Vec<EnvVar> = [
        (names.pod_name, "metadata.name"),
        (names.namespace, "metadata.namespace"),
        (names.node_name, "spec.nodeName"),
    ]
    .into_iter()
    .map(|(name, field_path)| field_ref_env(name, field_path))
    .collect();

    TaskTransform::new().push(move |task| {
        let container = task.container_mut();
        for var in &vars {
            container.add_env_variable(var.clone());
        }
    })
}

fn field_ref_env(name: String, field_path: &str) -> EnvVar {
    EnvVar {
        name,
        value: None,
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..ObjectFieldSelector::default()
            }),
            ..EnvVarSource::default()
        }),
    }
}
