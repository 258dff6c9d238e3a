//! Document builders and writers
//!
//! Free functions mirroring the shape of the UI metadata documents, plus
//! JSON encoding and file output for both document kinds. Every `source`
//! argument accepts a plain string or a `kfx_dsl::ArtifactReference`, which
//! is coerced to its URI.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::enums::MetricFormat;
use crate::error::{Result, VisError};
use crate::metrics::{Metric, Metrics};
use crate::models::{
    ConfusionMatrix, Markdown, Roc, SchemaVersion, Table, Tensorboard, UiMetadata, Visualization,
    WebApp,
};

/// Where the pipelines UI looks for the UI metadata document
pub const KFP_UI_METADATA_PATH: &str = "/mlpipeline-ui-metadata.json";

/// Where the pipelines UI looks for the metrics document
pub const KFP_METRICS_PATH: &str = "/mlpipeline-metrics.json";

/// Confusion matrix over a csv of `target`, `predicted`, `count` columns
pub fn confusion_matrix<I, S>(source: impl Into<String>, labels: I) -> ConfusionMatrix
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ConfusionMatrix::new(source, labels)
}

/// Markdown from a remote file
///
/// For inline markdown add `.with_storage(Storage::Inline)`.
pub fn markdown(source: impl Into<String>) -> Markdown {
    Markdown::new(source)
}

/// ROC curve over a csv of `fpr`, `tpr`, `thresholds` columns
pub fn roc(source: impl Into<String>) -> Roc {
    Roc::new(source)
}

/// Table over a csv with the given header row
pub fn table<I, S>(source: impl Into<String>, header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Table::new(source, header)
}

/// Tensorboard over a log directory
pub fn tensorboard(source: impl Into<String>) -> Tensorboard {
    Tensorboard::new(source)
}

/// Web app from an html file or inline html
pub fn web_app(source: impl Into<String>) -> WebApp {
    WebApp::new(source)
}

/// An output given either as a typed visualization or a raw mapping
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEntry {
    /// Already validated
    Typed(Visualization),
    /// Validated when the document is built
    Raw(Value),
}

impl OutputEntry {
    /// Validate into a visualization
    pub fn into_visualization(self) -> Result<Visualization> {
        match self {
            Self::Typed(visualization) => Ok(visualization),
            Self::Raw(value) => Visualization::from_value(value),
        }
    }
}

impl From<Value> for OutputEntry {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

impl From<Visualization> for OutputEntry {
    fn from(value: Visualization) -> Self {
        Self::Typed(value)
    }
}

macro_rules! typed_output {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for OutputEntry {
                fn from(value: $variant) -> Self {
                    Self::Typed(value.into())
                }
            }
        )*
    };
}

typed_output!(ConfusionMatrix, Markdown, Roc, Table, Tensorboard, WebApp);

/// Build a version 1 UI metadata document
///
/// Raw mappings are validated like [`Visualization::from_value`]; the first
/// invalid entry fails the whole document.
pub fn kfp_ui_metadata<I, T>(outputs: I) -> Result<UiMetadata>
where
    I: IntoIterator<Item = T>,
    T: Into<OutputEntry>,
{
    kfp_ui_metadata_with_version(outputs, SchemaVersion::default())
}

/// Build a UI metadata document of the given schema version
pub fn kfp_ui_metadata_with_version<I, T>(
    outputs: I,
    version: impl Into<SchemaVersion>,
) -> Result<UiMetadata>
where
    I: IntoIterator<Item = T>,
    T: Into<OutputEntry>,
{
    let outputs = outputs
        .into_iter()
        .map(|entry| OutputEntry::into_visualization(entry.into()))
        .collect::<Result<Vec<_>>>()?;
    Ok(UiMetadata {
        version: version.into(),
        outputs,
    })
}

/// Build a metric
///
/// `percent` selects [`MetricFormat::Percentage`] unless `format` is given.
pub fn kfp_metric(
    name: impl Into<String>,
    value: impl Into<f64>,
    percent: bool,
    format: Option<MetricFormat>,
) -> Result<Metric> {
    let format = match format {
        None if percent => Some(MetricFormat::Percentage),
        other => other,
    };
    Metric::new(name, value.into(), format)
}

/// A metric given either typed or as a raw mapping
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEntry {
    /// Already validated
    Typed(Metric),
    /// Validated when the document is built
    Raw(Value),
}

impl From<Metric> for MetricEntry {
    fn from(value: Metric) -> Self {
        Self::Typed(value)
    }
}

impl From<Value> for MetricEntry {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

/// Build a metrics document
pub fn kfp_metrics<I, T>(metrics: I) -> Result<Metrics>
where
    I: IntoIterator<Item = T>,
    T: Into<MetricEntry>,
{
    let metrics = metrics
        .into_iter()
        .map(|entry| match Into::<MetricEntry>::into(entry) {
            MetricEntry::Typed(metric) => Ok(metric),
            MetricEntry::Raw(value) => Metric::from_value(&value),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Metrics { metrics })
}

/// Wire mapping of a document, unset fields omitted
pub fn to_value<T: Serialize + ?Sized>(doc: &T) -> Result<Value> {
    Ok(serde_json::to_value(doc)?)
}

/// Compact JSON of a document
pub fn to_json<T: Serialize + ?Sized>(doc: &T) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

/// Indented JSON of a document
pub fn to_json_pretty<T: Serialize + ?Sized>(doc: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Write the JSON of a document to a sink
pub fn write_to<T, W>(doc: &T, mut writer: W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    serde_json::to_writer(&mut writer, doc).map_err(|e| {
        if e.is_io() {
            VisError::Sink(e.into())
        } else {
            VisError::Serialization(e)
        }
    })?;
    writer.flush().map_err(VisError::Sink)?;
    Ok(())
}

/// Write the JSON of a document to `path`, replacing any existing content
pub fn write_local_file<T, P>(doc: &T, path: P) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let io_error = |source: std::io::Error| VisError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, doc)?;
    writer.flush().map_err(io_error)?;

    tracing::info!("Wrote document to {}", path.display());
    Ok(())
}

/// A document the pipelines UI picks up from a well-known path
pub trait KfpDocument: Serialize {
    /// Well-known path of this document kind
    const LOCAL_PATH: &'static str;

    /// Wire mapping
    fn to_value(&self) -> Result<Value> {
        to_value(self)
    }

    /// Compact JSON
    fn to_json(&self) -> Result<String> {
        to_json(self)
    }

    /// Write to a sink
    fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        write_to(self, writer)
    }

    /// Write to [`LOCAL_PATH`](Self::LOCAL_PATH), replacing it
    fn write_local_file(&self) -> Result<()> {
        write_local_file(self, Self::LOCAL_PATH)
    }
}

impl KfpDocument for UiMetadata {
    const LOCAL_PATH: &'static str = KFP_UI_METADATA_PATH;
}

impl KfpDocument for Metrics {
    const LOCAL_PATH: &'static str = KFP_METRICS_PATH;
}
