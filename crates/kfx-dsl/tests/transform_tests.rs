use std::collections::BTreeMap;

use kfx_dsl::{limits_of, requests_of, ResourceSettings, TaskTransform};
use kfx_test_utils::sample_task;
use pretty_assertions::assert_eq;
use serde_json::json;

fn quantities(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn test_image_pull_policy_on_matching_sidecars() {
    let transform = TaskTransform::new()
        .set_image_pull_policy("Always")
        .set_sidecar_image_pull_policy("Always", "f*");

    let mut op = sample_task();
    transform.apply(&mut op);

    assert_eq!(op.container.image_pull_policy.as_deref(), Some("Always"));
    let policies: Vec<Option<&str>> = op
        .sidecars
        .iter()
        .map(|s| s.image_pull_policy.as_deref())
        .collect();
    assert_eq!(policies, vec![Some("Always"), None]);
}

#[test]
fn test_set_resources_later_mutation_wins() {
    let mut op = sample_task();

    TaskTransform::new()
        .set_resources(ResourceSettings::new().cpu((1, 2)).memory(("1G", "2G")))
        .apply(&mut op);
    assert_eq!(requests_of(&op.container), quantities(&[("cpu", "1"), ("memory", "1G")]));
    assert_eq!(limits_of(&op.container), quantities(&[("cpu", "2"), ("memory", "2G")]));

    TaskTransform::new()
        .set_resources(ResourceSettings::new().cpu("500m").memory("4G"))
        .apply(&mut op);
    let expected = quantities(&[("cpu", "500m"), ("memory", "4G")]);
    assert_eq!(requests_of(&op.container), expected);
    assert_eq!(limits_of(&op.container), expected);
}

#[test]
fn test_set_sidecar_resources() {
    let mut op = sample_task();

    TaskTransform::new()
        .set_sidecar_resources(ResourceSettings::new().cpu("500m").memory("4G"), "*")
        .apply(&mut op);
    let everywhere = quantities(&[("cpu", "500m"), ("memory", "4G")]);
    for sidecar in &op.sidecars {
        assert_eq!(requests_of(sidecar), everywhere);
        assert_eq!(limits_of(sidecar), everywhere);
    }

    TaskTransform::new()
        .set_sidecar_resources(ResourceSettings::new().cpu((1, 2)).memory(("1G", "2G")), "f*")
        .set_sidecar_resources(ResourceSettings::new().cpu("200m").memory("3G"), "bar")
        .apply(&mut op);

    let requests: Vec<_> = op.sidecars.iter().map(requests_of).collect();
    let limits: Vec<_> = op.sidecars.iter().map(limits_of).collect();
    assert_eq!(
        requests,
        vec![
            quantities(&[("cpu", "1"), ("memory", "1G")]),
            quantities(&[("cpu", "200m"), ("memory", "3G")]),
        ]
    );
    assert_eq!(
        limits,
        vec![
            quantities(&[("cpu", "2"), ("memory", "2G")]),
            quantities(&[("cpu", "200m"), ("memory", "3G")]),
        ]
    );

    // primary container untouched
    assert!(op.container.resources.is_none());
}

#[test]
fn test_set_annotations_and_labels() {
    let mut op = sample_task();
    TaskTransform::new()
        .set_annotations([("foo", "bar")])
        .set_labels([("hello", "world")])
        .apply(&mut op);

    assert_eq!(op.pod_annotations.get("foo").map(String::as_str), Some("bar"));
    assert_eq!(op.pod_labels.get("hello").map(String::as_str), Some("world"));
    assert_eq!(op.pod_annotations.len(), 1);
    assert_eq!(op.pod_labels.len(), 1);
}

#[test]
fn test_add_envs_keep_kubernetes_shapes() {
    let mut op = sample_task();
    TaskTransform::new()
        .add_env_var("foo", "bar")
        .add_env_vars([("hello", "world")])
        .add_env_var_from_secret("creds", "k8s_secret", "access_key")
        .add_env_var_from_configmap("some_configmap")
        .apply(&mut op);

    let container = serde_json::to_value(&op.container).unwrap();
    assert_eq!(
        container["env"],
        json!([
            {"name": "foo", "value": "bar"},
            {"name": "hello", "value": "world"},
            {
                "name": "creds",
                "valueFrom": {"secretKeyRef": {"key": "access_key", "name": "k8s_secret"}}
            }
        ])
    );
    assert_eq!(
        container["envFrom"],
        json!([{"configMapRef": {"name": "some_configmap"}}])
    );
}

#[test]
fn test_duplicate_env_names_are_not_merged() {
    let mut op = sample_task();
    TaskTransform::new()
        .add_env_var("foo", "a")
        .add_env_var("foo", "b")
        .apply(&mut op);

    let values: Vec<_> = op
        .container
        .env
        .iter()
        .flatten()
        .map(|var| var.value.as_deref())
        .collect();
    assert_eq!(values, vec![Some("a"), Some("b")]);
}

#[test]
fn test_independent_transforms_compose_in_caller_order() {
    let cpu = TaskTransform::new().set_cpu_resources("1");
    let more_cpu = TaskTransform::new().set_cpu_resources("2");

    let mut first = sample_task();
    cpu.apply(&mut first);
    more_cpu.apply(&mut first);

    let mut second = sample_task();
    more_cpu.apply(&mut second);
    cpu.apply(&mut second);

    assert_eq!(requests_of(&first.container)["cpu"], "2");
    assert_eq!(requests_of(&second.container)["cpu"], "1");
}
