use kfx_test_utils::sample_artifact_env;
use kfx_vis::{
    confusion_matrix, kfp_metric, kfp_metrics, kfp_ui_metadata, markdown, roc, table,
    tensorboard, to_json, to_value, web_app, MetricFormat, OutputEntry, Storage, VisError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn cm_expected() -> Value {
    json!({
        "type": "confusion_matrix",
        "format": "csv",
        "schema": [
            {"name": "target", "type": "CATEGORY"},
            {"name": "predicted", "type": "CATEGORY"},
            {"name": "count", "type": "NUMBER"},
        ],
        "source": "gs://your_project/your_bucket/your_cm_file",
        "labels": ["True", "False"],
    })
}

fn inline_markdown_expected() -> Value {
    json!({
        "storage": "inline",
        "source": "# Inline Markdown\n[A link](https://www.kubeflow.org/)",
        "type": "markdown",
    })
}

fn roc_expected() -> Value {
    json!({
        "type": "roc",
        "format": "csv",
        "schema": [
            {"name": "fpr", "type": "NUMBER"},
            {"name": "tpr", "type": "NUMBER"},
            {"name": "thresholds", "type": "NUMBER"},
        ],
        "source": "gs://your_project/your_bucket/your_roc_file",
    })
}

fn table_expected() -> Value {
    json!({
        "type": "table",
        "storage": "gcs",
        "format": "csv",
        "header": ["col1", "col2"],
        "source": "gs://your_project/your_bucket/your_csv_file",
    })
}

fn all_outputs() -> Vec<OutputEntry> {
    vec![
        confusion_matrix("gs://your_project/your_bucket/your_cm_file", ["True", "False"]).into(),
        markdown("# Inline Markdown\n[A link](https://www.kubeflow.org/)")
            .with_storage(Storage::Inline)
            .into(),
        markdown("gs://your_project/your_bucket/your_markdown_file").into(),
        roc("gs://your_project/your_bucket/your_roc_file").into(),
        table("gs://your_project/your_bucket/your_csv_file", ["col1", "col2"])
            .with_storage(Storage::Gcs)
            .into(),
        tensorboard("gs://your_project/your_bucket/logs/*").into(),
        web_app("gs://your_project/your_bucket/your_html_file")
            .with_storage(Storage::Gcs)
            .into(),
    ]
}

#[test]
fn test_confusion_matrix() {
    let data = kfp_ui_metadata([confusion_matrix(
        "gs://your_project/your_bucket/your_cm_file",
        ["True", "False"],
    )])
    .unwrap();
    assert_eq!(to_value(&data.outputs[0]).unwrap(), cm_expected());
}

#[test]
fn test_markdown_inline_and_file() {
    let inline = markdown("# Inline Markdown\n[A link](https://www.kubeflow.org/)")
        .with_storage(Storage::Inline);
    assert_eq!(to_value(&OutputEntry::from(inline).into_visualization().unwrap()).unwrap(), inline_markdown_expected());

    let file = kfx_vis::Visualization::from(markdown("gs://your_project/your_bucket/your_markdown_file"));
    assert_eq!(
        to_value(&file).unwrap(),
        json!({"source": "gs://your_project/your_bucket/your_markdown_file", "type": "markdown"})
    );
}

#[test]
fn test_roc_and_table() {
    let roc = kfx_vis::Visualization::from(roc("gs://your_project/your_bucket/your_roc_file"));
    assert_eq!(to_value(&roc).unwrap(), roc_expected());

    let table = kfx_vis::Visualization::from(
        table("gs://your_project/your_bucket/your_csv_file", ["col1", "col2"]).with_storage(Storage::Gcs),
    );
    assert_eq!(to_value(&table).unwrap(), table_expected());
}

#[test]
fn test_ui_metadata() {
    let data = kfp_ui_metadata(all_outputs()).unwrap();
    let expected = json!({
        "version": 1,
        "outputs": [
            cm_expected(),
            inline_markdown_expected(),
            {"source": "gs://your_project/your_bucket/your_markdown_file", "type": "markdown"},
            roc_expected(),
            table_expected(),
            {"type": "tensorboard", "source": "gs://your_project/your_bucket/logs/*"},
            {
                "type": "web-app",
                "source": "gs://your_project/your_bucket/your_html_file",
                "storage": "gcs",
            },
        ],
    });
    assert_eq!(to_value(&data).unwrap(), expected);
}

#[test]
fn test_raw_mappings_match_typed_outputs() {
    let typed = kfp_ui_metadata(all_outputs()).unwrap();
    let raw = kfp_ui_metadata(
        to_value(&typed).unwrap()["outputs"]
            .as_array()
            .unwrap()
            .iter()
            .cloned(),
    )
    .unwrap();
    assert_eq!(raw, typed);
}

#[test]
fn test_artifact_reference_as_source() {
    let env = sample_artifact_env();
    let doc = kfp_ui_metadata([markdown(env.artifact("markdown_data_file"))]).unwrap();
    assert_eq!(
        doc.outputs[0].source(),
        "gcs://your_bucket/pipelines/artifact/test-task-markdown_data.tgz"
    );
}

#[test]
fn test_unknown_type_fails_document() {
    let err = kfp_ui_metadata([json!({"type": "histogram", "source": "s"})]).unwrap_err();
    assert!(matches!(err, VisError::UnknownType(ref kind) if kind == "histogram"));
    assert!(err.is_validation());
}

#[test]
fn test_metrics() {
    let metrics = kfp_metrics([
        kfp_metric("foo-bar1", 1.0, true, None).unwrap(),
        kfp_metric("foo-bar2", 0.5, true, Some(MetricFormat::Raw)).unwrap(),
        kfp_metric("foo-bar3", 1000.0, false, None).unwrap(),
    ])
    .unwrap();

    assert_eq!(
        to_value(&metrics).unwrap(),
        json!({
            "metrics": [
                {"name": "foo-bar1", "numberValue": 1.0, "format": "PERCENTAGE"},
                {"name": "foo-bar2", "numberValue": 0.5, "format": "RAW"},
                {"name": "foo-bar3", "numberValue": 1000.0},
            ]
        })
    );
}

#[test]
fn test_metric_name_rejected() {
    assert!(matches!(
        kfp_metric("Foo_Bar", 1.0, false, None),
        Err(VisError::InvalidMetricName(ref name)) if name == "Foo_Bar"
    ));
}

#[test]
fn test_json_has_no_nulls() {
    let doc = kfp_ui_metadata(all_outputs()).unwrap();
    let json = to_json(&doc).unwrap();
    assert!(!json.contains("null"));
}
